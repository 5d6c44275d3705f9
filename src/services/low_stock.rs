//! Daily low-stock digest.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::clients::mail::{EmailMessage, Mailer};
use crate::config::LowStockConfig;
use crate::db::Store;
use crate::models::stock::StockItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Sent { items: usize },
    NoItems,
    AlreadySent,
}

pub struct LowStockReporter {
    store: Store,
    mailer: Arc<dyn Mailer>,
    config: LowStockConfig,
}

impl LowStockReporter {
    #[must_use]
    pub fn new(store: Store, mailer: Arc<dyn Mailer>, config: LowStockConfig) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &LowStockConfig {
        &self.config
    }

    /// Runs one reporting cycle as of `now`.
    ///
    /// The report date is the local date in the configured timezone. A failed
    /// send is returned as an error and leaves the date unrecorded.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReportOutcome> {
        let tz = self.config.parse_timezone()?;
        let report_date = now.with_timezone(&tz).format("%Y-%m-%d").to_string();

        if self.config.dedupe_daily && self.store.low_stock_report_sent(&report_date).await? {
            info!(date = %report_date, "Low-stock report already sent, skipping");
            return Ok(ReportOutcome::AlreadySent);
        }

        let items = self.store.list_low_stock(self.config.threshold).await?;
        if items.is_empty() {
            info!(threshold = self.config.threshold, "No low-stock items, no report sent");
            return Ok(ReportOutcome::NoItems);
        }

        let message = EmailMessage {
            to: self.config.recipient.clone(),
            subject: format!("Low stock report for {report_date}"),
            text: compose_digest(&items, self.config.threshold),
        };

        if let Err(e) = self.mailer.send(&message).await {
            error!(
                event = "job_failed",
                job_name = "low_stock_report",
                error = %e,
                "Failed to send low-stock report"
            );
            metrics::counter!("stockplus_low_stock_reports_failed_total").increment(1);
            return Err(e).context("Low-stock report dispatch failed");
        }

        if self.config.dedupe_daily {
            self.store
                .record_low_stock_report(&report_date, items.len())
                .await?;
        }

        metrics::counter!("stockplus_low_stock_reports_sent_total").increment(1);
        info!(
            date = %report_date,
            items = items.len(),
            recipient = %self.config.recipient,
            "Low-stock report sent"
        );

        Ok(ReportOutcome::Sent { items: items.len() })
    }
}

/// Plain-text body listing every qualifying item.
#[must_use]
pub fn compose_digest(items: &[StockItem], threshold: i64) -> String {
    let mut body = format!(
        "{} item(s) are below the low-stock threshold of {threshold}:\n\n",
        items.len()
    );

    for item in items {
        let _ = writeln!(
            body,
            "- {} (code {}): qty {}, barcode {}",
            item.product_name, item.product_code, item.qty, item.barcode
        );
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::Document;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<()> {
            if self.fail {
                anyhow::bail!("relay unavailable");
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn item(document_id: &str, barcode: &str, qty: i64) -> StockItem {
        StockItem {
            id: uuid::Uuid::new_v4().to_string(),
            image_url: None,
            product_name: format!("Product {barcode}"),
            product_code: format!("P-{barcode}"),
            brand: String::new(),
            category: String::new(),
            qty,
            rrp: String::new(),
            price: String::new(),
            barcode: barcode.to_string(),
            document_id: document_id.to_string(),
            published: crate::models::timestamp_now(),
        }
    }

    async fn seeded_store(quantities: &[(&str, i64)]) -> Store {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let document = Document {
            id: "doc".to_string(),
            document_name: "Aisle 3".to_string(),
            label_type: "shelf".to_string(),
            published: crate::models::timestamp_now(),
        };
        store.insert_document_below_limit(&document, 50).await.unwrap();

        let items: Vec<StockItem> = quantities
            .iter()
            .map(|(barcode, qty)| item("doc", barcode, *qty))
            .collect();
        store.add_stock_batch(&items).await.unwrap();
        store
    }

    fn morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_report_lists_only_items_below_threshold() {
        let store = seeded_store(&[("a", 0), ("b", 4), ("c", 5), ("d", 6)]).await;
        let mailer = Arc::new(RecordingMailer::default());
        let reporter = LowStockReporter::new(store, mailer.clone(), LowStockConfig::default());

        let outcome = reporter.run(morning()).await.unwrap();
        assert_eq!(outcome, ReportOutcome::Sent { items: 2 });

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "stock@example.com");
        assert_eq!(sent[0].subject, "Low stock report for 2024-06-03");
        assert!(sent[0].text.contains("barcode a"));
        assert!(sent[0].text.contains("barcode b"));
        assert!(!sent[0].text.contains("barcode c"));
        assert!(!sent[0].text.contains("barcode d"));
    }

    #[tokio::test]
    async fn test_no_items_sends_nothing() {
        let store = seeded_store(&[("c", 5), ("d", 6)]).await;
        let mailer = Arc::new(RecordingMailer::default());
        let reporter = LowStockReporter::new(store, mailer.clone(), LowStockConfig::default());

        assert_eq!(reporter.run(morning()).await.unwrap(), ReportOutcome::NoItems);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_run_same_day_is_skipped() {
        let store = seeded_store(&[("a", 1)]).await;
        let mailer = Arc::new(RecordingMailer::default());
        let reporter = LowStockReporter::new(store, mailer.clone(), LowStockConfig::default());

        reporter.run(morning()).await.unwrap();
        assert_eq!(
            reporter.run(morning()).await.unwrap(),
            ReportOutcome::AlreadySent
        );
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);

        let next_day = Utc.with_ymd_and_hms(2024, 6, 4, 8, 0, 0).unwrap();
        assert_eq!(
            reporter.run(next_day).await.unwrap(),
            ReportOutcome::Sent { items: 1 }
        );
    }

    #[tokio::test]
    async fn test_report_date_uses_configured_timezone() {
        let store = seeded_store(&[("a", 1)]).await;
        let mailer = Arc::new(RecordingMailer::default());
        let config = LowStockConfig {
            timezone: "Pacific/Auckland".to_string(),
            ..LowStockConfig::default()
        };
        let reporter = LowStockReporter::new(store, mailer.clone(), config);

        // 20:00 UTC on the 3rd is already the 4th in Auckland.
        let evening = Utc.with_ymd_and_hms(2024, 6, 3, 20, 0, 0).unwrap();
        reporter.run(evening).await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Low stock report for 2024-06-04");
    }

    #[tokio::test]
    async fn test_failed_send_is_not_recorded() {
        let store = seeded_store(&[("a", 1)]).await;
        let failing = Arc::new(RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        });
        let reporter =
            LowStockReporter::new(store.clone(), failing, LowStockConfig::default());

        assert!(reporter.run(morning()).await.is_err());
        assert!(!store.low_stock_report_sent("2024-06-03").await.unwrap());
    }

    #[test]
    fn test_compose_digest() {
        let items = vec![item("doc", "555", 2)];
        let body = compose_digest(&items, 5);
        assert!(body.starts_with("1 item(s) are below the low-stock threshold of 5"));
        assert!(body.contains("- Product 555 (code P-555): qty 2, barcode 555"));
    }
}
