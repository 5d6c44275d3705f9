//! Domain service for documents (label batches).

use crate::db::DocumentRemoval;
use crate::models::document::Document;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document limit of {max} reached")]
    LimitReached { max: u64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for DocumentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DocumentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait DocumentService: Send + Sync {
    /// Creates a document unless the configured ceiling has been reached.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::LimitReached`] when the ceiling has been reached;
    /// callers treat this as a notice, not a failure.
    async fn create(&self, name: &str, label_type: &str) -> Result<Document, DocumentError>;

    /// All documents, most recent first.
    async fn list(&self) -> Result<Vec<Document>, DocumentError>;

    async fn get(&self, id: &str) -> Result<Document, DocumentError>;

    /// Deletes the document and every stock item referencing it.
    /// Deleting an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<DocumentRemoval, DocumentError>;

    async fn count(&self) -> Result<u64, DocumentError>;
}
