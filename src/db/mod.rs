use crate::config::OversellPolicy;
use crate::models::document::Document;
use crate::models::stock::{SaleLine, StockFields, StockItem};
use anyhow::Result;
use sea_orm::sqlx::sqlite::SqliteJournalMode;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::document::DocumentRemoval;
pub use repositories::stock::{SaleFailure, StockTotals};
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `:memory:` would see its own empty database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600))
                .map_sqlx_sqlite_opts(|sqlite| {
                    sqlite
                        .journal_mode(SqliteJournalMode::Wal)
                        .busy_timeout(Duration::from_secs(10))
                });
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        info!("Database connection closed");
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn document_repo(&self) -> repositories::document::DocumentRepository {
        repositories::document::DocumentRepository::new(self.conn.clone())
    }

    fn stock_repo(&self) -> repositories::stock::StockRepository {
        repositories::stock::StockRepository::new(self.conn.clone())
    }

    fn report_repo(&self) -> repositories::report::ReportRepository {
        repositories::report::ReportRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, new_user: NewUser<'_>) -> Result<Option<User>> {
        self.user_repo().create(new_user).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_profile_picture(&self, username: &str, picture: &str) -> Result<bool> {
        self.user_repo()
            .update_profile_picture(username, picture)
            .await
    }

    // ========================================================================
    // Documents
    // ========================================================================

    pub async fn insert_document_below_limit(
        &self,
        document: &Document,
        max_documents: u64,
    ) -> Result<bool> {
        self.document_repo()
            .insert_below_limit(document, max_documents)
            .await
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        self.document_repo().get(id).await
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        self.document_repo().list().await
    }

    pub async fn count_documents(&self) -> Result<u64> {
        self.document_repo().count().await
    }

    pub async fn remove_document(&self, id: &str) -> Result<DocumentRemoval> {
        self.document_repo().remove_cascade(id).await
    }

    // ========================================================================
    // Stock
    // ========================================================================

    pub async fn add_stock(&self, item: &StockItem) -> Result<()> {
        self.stock_repo().insert(item).await
    }

    pub async fn add_stock_batch(&self, items: &[StockItem]) -> Result<u64> {
        self.stock_repo().insert_batch(items).await
    }

    pub async fn get_stock_by_barcode(&self, barcode: &str) -> Result<Option<StockItem>> {
        self.stock_repo().get_by_barcode(barcode).await
    }

    pub async fn get_stock_by_barcodes(&self, barcodes: &[String]) -> Result<Vec<StockItem>> {
        self.stock_repo().get_by_barcodes(barcodes).await
    }

    pub async fn list_stock_for_document(
        &self,
        document_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<StockItem>> {
        self.stock_repo()
            .list_for_document(document_id, category)
            .await
    }

    pub async fn update_stock_by_barcode(
        &self,
        original_barcode: &str,
        document_id: &str,
        fields: &StockFields,
    ) -> Result<bool> {
        self.stock_repo()
            .update_by_barcode(original_barcode, document_id, fields)
            .await
    }

    pub async fn remove_stock_by_barcode(&self, barcode: &str) -> Result<bool> {
        self.stock_repo().remove_by_barcode(barcode).await
    }

    pub async fn apply_sale(
        &self,
        lines: &[SaleLine],
        policy: OversellPolicy,
    ) -> Result<Vec<StockItem>, SaleFailure> {
        self.stock_repo().apply_sale(lines, policy).await
    }

    pub async fn list_low_stock(&self, threshold: i64) -> Result<Vec<StockItem>> {
        self.stock_repo().list_below(threshold).await
    }

    pub async fn stock_totals(&self) -> Result<StockTotals> {
        self.stock_repo().totals().await
    }

    // ========================================================================
    // Low-stock report log
    // ========================================================================

    pub async fn low_stock_report_sent(&self, report_date: &str) -> Result<bool> {
        self.report_repo().was_sent(report_date).await
    }

    pub async fn record_low_stock_report(&self, report_date: &str, item_count: usize) -> Result<bool> {
        self.report_repo().record(report_date, item_count).await
    }
}
