//! One-off low-stock report

use std::sync::Arc;

use crate::clients::mail;
use crate::config::Config;
use crate::db::Store;
use crate::services::{LowStockReporter, ReportOutcome, Scheduler};

pub async fn cmd_report(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let mailer = mail::from_config(&config.mail)?;
    let reporter = Arc::new(LowStockReporter::new(
        store.clone(),
        mailer,
        config.low_stock.clone(),
    ));

    let outcome = Scheduler::new(reporter).run_once().await;
    store.close().await?;

    match outcome? {
        ReportOutcome::Sent { items } => {
            println!(
                "✓ Low-stock report sent to {} ({} item(s))",
                config.low_stock.recipient, items
            );
        }
        ReportOutcome::NoItems => {
            println!(
                "No items below the threshold of {}, nothing sent.",
                config.low_stock.threshold
            );
        }
        ReportOutcome::AlreadySent => println!("Today's report was already sent."),
    }

    Ok(())
}
