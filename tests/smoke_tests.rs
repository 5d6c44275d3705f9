//! Smoke test for the core stock flow: document, item, sale, cascade delete.

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use serde_json::Value;
use std::sync::Arc;
use stockplus::config::Config;
use stockplus::services::SignUpRequest;
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn spawn_app() -> (Arc<stockplus::api::AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("stockplus-smoke-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());

    let state = stockplus::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");

    let router = stockplus::api::router(state.clone()).await;
    (state, router)
}

async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn request(method: &str, uri: &str, cookie: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
}

#[tokio::test]
async fn smoke_document_stock_sale_and_cascade() {
    let (state, app) = spawn_app().await;

    state
        .auth_service()
        .sign_up(SignUpRequest {
            email: "owner@example.com".to_string(),
            username: "owner".to_string(),
            password: "s3cret-pass".to_string(),
            account_type: None,
        })
        .await
        .unwrap();

    // Login and keep the session cookie.
    let login_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=owner&password=s3cret-pass"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(login_response.status(), StatusCode::FOUND);
    let cookie = login_response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("missing session cookie")
        .to_string();

    // Create "Aisle 3".
    let create_response = app
        .clone()
        .oneshot(
            request("POST", "/createDoc", &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("documentName=Aisle%203&labelType=shelf-edge"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create_response.status(), StatusCode::FOUND);

    let documents = body_json(
        app.clone()
            .oneshot(request("GET", "/documents", &cookie).body(Body::empty()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    let document = &documents["data"]["documents"][0];
    assert_eq!(document["documentName"], "Aisle 3");
    let document_id = document["_id"].as_str().unwrap().to_string();

    // Add barcode 555 with qty 10.
    let boundary = "smoke-boundary";
    let mut multipart = String::new();
    for (name, value) in [
        ("documentId", document_id.as_str()),
        ("productName", "Crisps"),
        ("qty", "10"),
        ("barcode", "555"),
    ] {
        multipart.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    multipart.push_str(&format!("--{boundary}--\r\n"));

    let add_response = app
        .clone()
        .oneshot(
            request("POST", "/addStock", &cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(multipart))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(add_response.status(), StatusCode::FOUND);

    let stock_uri = format!("/document/{document_id}/stock");
    let list_stock = |app: Router| {
        let uri = stock_uri.clone();
        let cookie = cookie.clone();
        async move {
            app.oneshot(request("GET", &uri, &cookie).body(Body::empty()).unwrap())
                .await
                .unwrap()
        }
    };

    let listing = body_json(list_stock(app.clone()).await).await;
    let items = listing["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["qty"], 10);
    assert_eq!(items[0]["productURL"], "/product/555");

    // Sell 3.
    let sale_response = app
        .clone()
        .oneshot(
            request("POST", "/process-sale", &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"[{"barcode":"555","quantity":3}]"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(sale_response.status(), StatusCode::OK);

    let listing = body_json(list_stock(app.clone()).await).await;
    assert_eq!(listing["data"]["items"][0]["qty"], 7);

    // Delete the document; its stock goes with it.
    let delete_response = app
        .clone()
        .oneshot(
            request("POST", "/delete-document", &cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("documentId={document_id}")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(delete_response.status(), StatusCode::FOUND);

    let after_delete = list_stock(app.clone()).await;
    assert_eq!(after_delete.status(), StatusCode::NOT_FOUND);

    let product = app
        .clone()
        .oneshot(request("GET", "/product/555", &cookie).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(product.status(), StatusCode::NOT_FOUND);
}
