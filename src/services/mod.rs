pub mod auth_service;
pub use auth_service::{AuthError, AuthService, LoginResult, SignUpRequest, UserInfo};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod document_service;
pub use document_service::{DocumentError, DocumentService};

pub mod document_service_impl;
pub use document_service_impl::SeaOrmDocumentService;

pub mod stock_service;
pub use stock_service::{LabelRecord, StockError, StockService, StockSummary};

pub mod stock_service_impl;
pub use stock_service_impl::SeaOrmStockService;

pub mod image;
pub use image::ImageService;

pub mod import;
pub use import::{ParsedSheet, parse_stock_sheet};

pub mod low_stock;
pub use low_stock::{LowStockReporter, ReportOutcome};

pub mod scheduler;
pub use scheduler::Scheduler;
