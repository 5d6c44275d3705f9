use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{
    Expiry, MemoryStore, SessionManagerLayer, cookie::Key, service::SignedCookie,
};

use crate::config::{Config, ServerConfig};
use crate::services::{AuthService, DocumentService, ImageService, StockService};
use crate::state::SharedState;

pub mod auth;
mod dashboard;
mod documents;
mod error;
pub mod flash;
mod observability;
mod sales;
mod stock;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use metrics_exporter_prometheus::PrometheusHandle;

/// Minimum secret length accepted for signing session cookies.
const MIN_SESSION_SECRET_BYTES: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn document_service(&self) -> &Arc<dyn DocumentService> {
        &self.shared.document_service
    }

    #[must_use]
    pub fn stock_service(&self) -> &Arc<dyn StockService> {
        &self.shared.stock_service
    }

    #[must_use]
    pub fn image_service(&self) -> &Arc<ImageService> {
        &self.shared.image_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

fn session_key(server: &ServerConfig) -> Key {
    let secret = server.session_secret.as_bytes();
    if secret.len() >= MIN_SESSION_SECRET_BYTES
        && let Ok(key) = Key::try_from(secret)
    {
        return key;
    }

    tracing::warn!(
        "server.session_secret is shorter than {} bytes, using a random key; sessions will not survive a restart",
        MIN_SESSION_SECRET_BYTES
    );
    Key::generate()
}

fn session_layer(server: &ServerConfig) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_expiry_minutes.max(1),
        )))
        .with_signed(session_key(server))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let config = state.config().read().await.clone();
    let body_limit = config.limits.max_upload_mb.max(1) * 1024 * 1024;

    let app_routes = Router::new()
        .merge(create_protected_router())
        .merge(create_api_router())
        .route("/", get(auth::index))
        .route("/users", get(auth::users_page))
        .route("/signUp", post(auth::sign_up))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .layer(session_layer(&config.server))
        .with_state(state);

    Router::new()
        .merge(app_routes)
        .nest_service(
            "/images",
            tower_http::services::ServeDir::new(&config.general.images_path),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Page-flow routes; anonymous requests are redirected to `/`.
fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .route(
            "/profile",
            get(auth::get_profile).post(auth::upload_profile_picture),
        )
        .route("/documents", get(documents::list_documents))
        .route("/createDoc", post(documents::create_document))
        .route("/delete-document", post(documents::delete_document))
        .route("/document/{id}/stock", get(stock::list_stock))
        .route("/product/{barcode}", get(stock::get_product))
        .route("/addStock", post(stock::add_stock))
        .route("/updateStock", post(stock::update_stock))
        .route("/delete", post(stock::delete_stock))
        .route("/import-stock", post(stock::import_stock))
        .route("/selected", post(stock::select_labels))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::require_login))
}

/// JSON routes; anonymous requests get a 401.
fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/process-sale", post(sales::process_sale))
        .route_layer(middleware::from_fn(auth::require_login_api))
}
