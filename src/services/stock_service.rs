//! Domain service for stock items scoped to documents.
//!
//! Covers manual entry, edits, spreadsheet import, point-of-sale decrements
//! and label selection.

use serde::Serialize;
use thiserror::Error;

use crate::db::SaleFailure;
use crate::models::stock::{SaleLine, StockFields, StockItem};

#[derive(Debug, Error)]
pub enum StockError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Stock item not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient stock for {barcode}: {available} available, {requested} requested")]
    Oversell {
        barcode: String,
        available: i64,
        requested: i64,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for StockError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for StockError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<SaleFailure> for StockError {
    fn from(failure: SaleFailure) -> Self {
        match failure {
            SaleFailure::UnknownBarcode(barcode) => Self::NotFound(barcode),
            SaleFailure::Oversell {
                barcode,
                available,
                requested,
            } => Self::Oversell {
                barcode,
                available,
                requested,
            },
            SaleFailure::Store(err) => Self::Database(err.to_string()),
        }
    }
}

/// One printable label.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    pub product_name: String,
    pub product_code: String,
    pub brand: String,
    pub price: String,
    pub rrp: String,
    pub barcode: String,
    pub label_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub documents: u64,
    pub items: u64,
    pub units: i64,
    pub low_stock: Vec<StockItem>,
}

#[async_trait::async_trait]
pub trait StockService: Send + Sync {
    /// Adds one item to an existing document.
    async fn create(&self, document_id: &str, fields: StockFields) -> Result<StockItem, StockError>;

    /// Rewrites the item currently carrying `original_barcode`.
    /// Returns `false` when nothing matched.
    async fn update(
        &self,
        original_barcode: &str,
        document_id: &str,
        fields: StockFields,
    ) -> Result<bool, StockError>;

    /// Items of one document, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::DocumentNotFound`] for an unknown document.
    async fn list(
        &self,
        document_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<StockItem>, StockError>;

    async fn get(&self, barcode: &str) -> Result<StockItem, StockError>;

    /// Deletes at most one item, whatever document it belongs to.
    async fn delete(&self, barcode: &str) -> Result<bool, StockError>;

    /// Inserts already-filtered spreadsheet rows as one batch.
    async fn import(&self, document_id: &str, rows: Vec<StockFields>) -> Result<u64, StockError>;

    /// Applies all decrements of a sale or none.
    async fn process_sale(&self, lines: &[SaleLine]) -> Result<Vec<StockItem>, StockError>;

    /// Label records for the chosen barcodes, optionally limited to one document.
    async fn labels(
        &self,
        document_id: Option<&str>,
        barcodes: &[String],
    ) -> Result<Vec<LabelRecord>, StockError>;

    async fn low_stock(&self, threshold: i64) -> Result<Vec<StockItem>, StockError>;

    async fn summary(&self, threshold: i64) -> Result<StockSummary, StockError>;
}
