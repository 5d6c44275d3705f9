use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr};

use crate::entities::{low_stock_reports, prelude::*};

/// Repository for the low-stock digest send log
pub struct ReportRepository {
    conn: DatabaseConnection,
}

impl ReportRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn was_sent(&self, report_date: &str) -> Result<bool> {
        let row = LowStockReports::find()
            .filter(low_stock_reports::Column::ReportDate.eq(report_date))
            .one(&self.conn)
            .await
            .context("Failed to query low-stock report log")?;
        Ok(row.is_some())
    }

    /// Returns false if the date was already recorded.
    pub async fn record(&self, report_date: &str, item_count: usize) -> Result<bool> {
        let active = low_stock_reports::ActiveModel {
            report_date: Set(report_date.to_string()),
            item_count: Set(i32::try_from(item_count).unwrap_or(i32::MAX)),
            sent_at: Set(crate::models::timestamp_now()),
            ..Default::default()
        };

        match LowStockReports::insert(active).exec(&self.conn).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(e).context("Failed to record low-stock report"),
        }
    }
}
