use axum::{
    Form, Json,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::warn;

use super::flash::{self, NoticeLevel};
use super::validation::{validate_barcode, validate_document_id, validate_required};
use super::{
    ApiError, ApiResponse, AppState, DeleteStockParams, SelectLabelsRequest, StockItemDto,
    StockPage, StockQuery, UpdateStockForm,
};
use crate::models::stock::{StockFields, parse_quantity};
use crate::services::{LabelRecord, StockError, parse_stock_sheet};

/// Text fields and at most one file part of a multipart form.
#[derive(Default)]
struct MultipartForm {
    fields: HashMap<String, String>,
    file: Option<(String, Bytes)>,
}

impl MultipartForm {
    async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == file_field {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
                if !bytes.is_empty() {
                    form.file = Some((file_name, bytes));
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid field {name}: {e}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn stock_fields(&self) -> StockFields {
        StockFields {
            image_url: None,
            product_name: self.text("productName"),
            product_code: self.text("productCode"),
            brand: self.text("brand"),
            category: self.text("category"),
            qty: parse_quantity(&self.text("qty")),
            rrp: self.text("rrp"),
            price: self.text("price"),
            barcode: self.text("barcode"),
        }
    }
}

fn stock_list_path(document_id: &str) -> String {
    format!("/document/{document_id}/stock")
}

/// GET /document/{id}/stock
pub async fn list_stock(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(document_id): Path<String>,
    Query(query): Query<StockQuery>,
) -> Result<Json<ApiResponse<StockPage>>, ApiError> {
    let document = state.document_service().get(&document_id).await?;

    let items = state
        .stock_service()
        .list(&document.id, query.category.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(StockPage {
        document,
        category: query.category.filter(|c| !c.trim().is_empty()),
        items: items.into_iter().map(StockItemDto::from).collect(),
        notices: flash::take(&session).await,
    })))
}

/// GET /product/{barcode}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(barcode): Path<String>,
) -> Result<Json<ApiResponse<StockItemDto>>, ApiError> {
    let item = state.stock_service().get(&barcode).await?;
    Ok(Json(ApiResponse::success(item.into())))
}

/// POST /addStock
/// Multipart form with an optional `image` part
pub async fn add_stock(
    State(state): State<Arc<AppState>>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = MultipartForm::read(multipart, "image").await?;
    let document_id = form.text("documentId");
    validate_required(&document_id, "documentId")?;

    let mut fields = form.stock_fields();
    validate_barcode(&fields.barcode)?;

    // Unknown documents are refused before anything is written to disk.
    state.document_service().get(&document_id).await?;

    if let Some((file_name, bytes)) = &form.file {
        let image_url = state
            .image_service()
            .save_upload(file_name, bytes)
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;
        fields.image_url = Some(image_url);
    }

    let image_url = fields.image_url.clone();
    let item = match state.stock_service().create(&document_id, fields).await {
        Ok(item) => item,
        Err(e) => {
            if let Some(image_url) = image_url {
                if let Err(discard_err) = state.image_service().discard(&image_url).await {
                    warn!(error = %discard_err, "Failed to remove image of rejected stock item");
                }
            }
            return Err(e.into());
        }
    };

    Ok(flash::redirect_with(
        &session,
        &stock_list_path(&document_id),
        NoticeLevel::Success,
        format!("{} added", item.product_name),
    )
    .await)
}

/// POST /updateStock
/// Problems are reported as notices; nothing here is fatal to the page flow
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<UpdateStockForm>,
) -> Result<Response, ApiError> {
    let original_barcode = form.original_barcode.trim();
    let document_id = form.document_id.trim();

    if original_barcode.is_empty() || document_id.is_empty() {
        let location = if document_id.is_empty() {
            "/documents".to_string()
        } else {
            stock_list_path(document_id)
        };
        return Ok(flash::redirect_with(
            &session,
            &location,
            NoticeLevel::Warning,
            "Select an item to update",
        )
        .await);
    }

    let fields = StockFields {
        image_url: form
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        product_name: form.product_name.trim().to_string(),
        product_code: form.product_code.trim().to_string(),
        brand: form.brand.trim().to_string(),
        category: form.category.trim().to_string(),
        qty: parse_quantity(&form.qty),
        rrp: form.rrp.trim().to_string(),
        price: form.price.trim().to_string(),
        barcode: form.barcode.trim().to_string(),
    };

    let location = stock_list_path(document_id);
    let (level, message) = match state
        .stock_service()
        .update(original_barcode, document_id, fields)
        .await
    {
        Ok(true) => (NoticeLevel::Success, "Stock item updated".to_string()),
        Ok(false) => (
            NoticeLevel::Info,
            format!("No stock item with barcode {original_barcode}"),
        ),
        Err(StockError::DocumentNotFound(_)) => {
            return Ok(flash::redirect_with(
                &session,
                "/documents",
                NoticeLevel::Warning,
                "Document not found",
            )
            .await);
        }
        Err(StockError::Validation(msg)) => (NoticeLevel::Warning, msg),
        Err(e) => {
            warn!(error = %e, barcode = %original_barcode, "Stock update failed");
            (NoticeLevel::Error, "Failed to update stock item".to_string())
        }
    };

    Ok(flash::redirect_with(&session, &location, level, message).await)
}

/// POST /delete
/// Accepts the barcode from the form body or from the derived `deleteURL` query
pub async fn delete_stock(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<DeleteStockParams>,
    Form(form): Form<DeleteStockParams>,
) -> Result<Response, ApiError> {
    let barcode = form.barcode.or(query.barcode).unwrap_or_default();
    let barcode = validate_barcode(&barcode)?;

    let document_id = form.document_id.or(query.document_id);
    let location = document_id
        .as_deref()
        .and_then(|id| validate_document_id(id).ok())
        .map_or_else(|| "/documents".to_string(), stock_list_path);

    let (level, message) = if state.stock_service().delete(barcode).await? {
        (NoticeLevel::Success, format!("Deleted item {barcode}"))
    } else {
        (NoticeLevel::Info, format!("No stock item with barcode {barcode}"))
    };

    Ok(flash::redirect_with(&session, &location, level, message).await)
}

/// POST /import-stock
/// Multipart form: `documentId` plus a CSV `file` part
pub async fn import_stock(
    State(state): State<Arc<AppState>>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = MultipartForm::read(multipart, "file").await?;
    let document_id = form.text("documentId");
    validate_required(&document_id, "documentId")?;

    let Some((file_name, bytes)) = &form.file else {
        return Err(ApiError::validation("A spreadsheet file is required"));
    };

    let sheet = parse_stock_sheet(bytes)
        .map_err(|e| ApiError::validation(format!("Could not read {file_name}: {e}")))?;
    let dropped = sheet.dropped;

    let imported = state
        .stock_service()
        .import(&document_id, sheet.rows)
        .await?;

    tracing::info!(
        document_id = %document_id,
        imported,
        dropped,
        "Stock sheet processed"
    );

    let (level, message) = if imported == 0 {
        (NoticeLevel::Warning, "No valid items found in the file".to_string())
    } else {
        (NoticeLevel::Success, format!("Imported {imported} item(s)"))
    };

    Ok(flash::redirect_with(&session, &stock_list_path(&document_id), level, message).await)
}

/// POST /selected
/// Printable label records for the chosen items
pub async fn select_labels(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectLabelsRequest>,
) -> Result<Json<ApiResponse<Vec<LabelRecord>>>, ApiError> {
    let labels = state
        .stock_service()
        .labels(request.document_id.as_deref(), &request.barcodes)
        .await?;
    Ok(Json(ApiResponse::success(labels)))
}
