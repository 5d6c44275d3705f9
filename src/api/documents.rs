use axum::{
    Form, Json,
    extract::State,
    response::Response,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::flash::{self, NoticeLevel};
use super::validation::{validate_document_id, validate_required};
use super::{
    ApiError, ApiResponse, AppState, CreateDocumentForm, DeleteDocumentForm, DocumentsPage,
};
use crate::services::DocumentError;

/// GET /documents
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<DocumentsPage>>, ApiError> {
    let documents = state.document_service().list().await?;
    let max_documents = state.config().read().await.limits.max_documents;

    Ok(Json(ApiResponse::success(DocumentsPage {
        documents,
        max_documents,
        notices: flash::take(&session).await,
    })))
}

/// POST /createDoc
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<CreateDocumentForm>,
) -> Result<Response, ApiError> {
    let name = validate_required(&form.document_name, "documentName")?;

    match state
        .document_service()
        .create(name, &form.label_type)
        .await
    {
        Ok(document) => Ok(flash::redirect_with(
            &session,
            "/documents",
            NoticeLevel::Success,
            format!("Document {} created", document.document_name),
        )
        .await),
        Err(DocumentError::LimitReached { max }) => Ok(flash::redirect_with(
            &session,
            "/documents",
            NoticeLevel::Warning,
            format!("Document limit of {max} reached, delete a document first"),
        )
        .await),
        Err(e) => Err(e.into()),
    }
}

/// POST /delete-document
/// Removes the document and every stock item that references it
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<DeleteDocumentForm>,
) -> Result<Response, ApiError> {
    let document_id = validate_document_id(&form.document_id)?;

    let removal = state.document_service().delete(document_id).await?;

    let (level, message) = if removal.document_removed {
        (
            NoticeLevel::Success,
            format!(
                "Document deleted along with {} stock item(s)",
                removal.stock_removed
            ),
        )
    } else {
        (NoticeLevel::Info, "Document not found".to_string())
    };

    Ok(flash::redirect_with(&session, "/documents", level, message).await)
}
