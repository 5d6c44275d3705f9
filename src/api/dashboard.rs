use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{ACCOUNT_TYPE_KEY, get_session_username};
use super::{ApiError, ApiResponse, AppState, DashboardPage, StockItemDto, flash};

/// GET /dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<DashboardPage>>, ApiError> {
    let user = get_session_username(&session).await?;
    let account_type = session.get::<String>(ACCOUNT_TYPE_KEY).await?;

    let threshold = state.config().read().await.low_stock.threshold;
    let summary = state.stock_service().summary(threshold).await?;

    Ok(Json(ApiResponse::success(DashboardPage {
        user,
        account_type,
        documents: summary.documents,
        stock_items: summary.items,
        total_units: summary.units,
        low_stock_threshold: threshold,
        low_stock: summary.low_stock.into_iter().map(StockItemDto::from).collect(),
        notices: flash::take(&session).await,
    })))
}
