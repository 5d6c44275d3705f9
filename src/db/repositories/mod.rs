pub mod document;
pub mod report;
pub mod stock;
pub mod user;
