pub use super::documents::Entity as Documents;
pub use super::low_stock_reports::Entity as LowStockReports;
pub use super::stock::Entity as Stock;
pub use super::users::Entity as Users;
