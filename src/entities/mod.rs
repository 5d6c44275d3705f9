pub mod prelude;

pub mod documents;
pub mod low_stock_reports;
pub mod stock;
pub mod users;
