use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SaleRequest, StockItemDto};

/// POST /process-sale
///
/// Applies every line or none. Unknown barcodes answer 404 and rejected
/// oversells 409, in both cases with no quantity changed.
pub async fn process_sale(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaleRequest>,
) -> Result<Json<ApiResponse<Vec<StockItemDto>>>, ApiError> {
    let lines = request.into_lines();
    let items = state.stock_service().process_sale(&lines).await?;

    Ok(Json(ApiResponse::success(
        items.into_iter().map(StockItemDto::from).collect(),
    )))
}
