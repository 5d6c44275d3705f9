use serde::{Deserialize, Serialize};

use super::flash::Notice;
use crate::models::document::Document;
use crate::models::stock::{SaleLine, StockItem};
use crate::services::UserInfo;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Stock item as rendered, with the URLs derived from its current barcode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItemDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub image_url: Option<String>,
    pub product_name: String,
    pub product_code: String,
    pub brand: String,
    pub category: String,
    pub qty: i64,
    pub rrp: String,
    pub price: String,
    pub barcode: String,
    #[serde(rename = "productURL")]
    pub product_url: String,
    #[serde(rename = "deleteURL")]
    pub delete_url: String,
    pub document_id: String,
    pub published: String,
}

impl From<StockItem> for StockItemDto {
    fn from(item: StockItem) -> Self {
        Self {
            product_url: item.product_url(),
            delete_url: item.delete_url(),
            id: item.id,
            image_url: item.image_url,
            product_name: item.product_name,
            product_code: item.product_code,
            brand: item.brand,
            category: item.category,
            qty: item.qty,
            rrp: item.rrp,
            price: item.price,
            barcode: item.barcode,
            document_id: item.document_id,
            published: item.published,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPage {
    pub logged_in: bool,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage {
    pub user: UserInfo,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPage {
    pub user: String,
    pub account_type: Option<String>,
    pub documents: u64,
    pub stock_items: u64,
    pub total_units: i64,
    pub low_stock_threshold: i64,
    pub low_stock: Vec<StockItemDto>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsPage {
    pub documents: Vec<Document>,
    pub max_documents: u64,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPage {
    pub document: Document,
    pub category: Option<String>,
    pub items: Vec<StockItemDto>,
    pub notices: Vec<Notice>,
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub account_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentForm {
    #[serde(default)]
    pub document_name: String,
    #[serde(default)]
    pub label_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocumentForm {
    #[serde(default)]
    pub document_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub category: Option<String>,
}

/// Edit form; quantity arrives as free text.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStockForm {
    pub original_barcode: String,
    pub document_id: String,
    pub image_url: Option<String>,
    pub product_name: String,
    pub product_code: String,
    pub brand: String,
    pub category: String,
    pub qty: String,
    pub rrp: String,
    pub price: String,
    pub barcode: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteStockParams {
    pub barcode: Option<String>,
    pub document_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectLabelsRequest {
    pub document_id: Option<String>,
    #[serde(default)]
    pub barcodes: Vec<String>,
}

/// Either `{"items": [...]}` or a bare array of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SaleRequest {
    Wrapped { items: Vec<SaleLine> },
    Bare(Vec<SaleLine>),
}

impl SaleRequest {
    #[must_use]
    pub fn into_lines(self) -> Vec<SaleLine> {
        match self {
            Self::Wrapped { items } | Self::Bare(items) => items,
        }
    }
}
