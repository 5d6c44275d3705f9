use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::mail::{self, Mailer};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, DocumentService, ImageService, LowStockReporter, SeaOrmAuthService,
    SeaOrmDocumentService, SeaOrmStockService, StockService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub document_service: Arc<dyn DocumentService>,

    pub stock_service: Arc<dyn StockService>,

    pub image_service: Arc<ImageService>,

    pub low_stock_reporter: Arc<LowStockReporter>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let mailer = mail::from_config(&config.mail)?;
        Ok(Self::from_parts(config, store, mailer))
    }

    /// Wires services around an already-open store and mailer.
    #[must_use]
    pub fn from_parts(config: Config, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        let auth_service =
            Arc::new(SeaOrmAuthService::new(store.clone())) as Arc<dyn AuthService>;

        let document_service = Arc::new(SeaOrmDocumentService::new(
            store.clone(),
            config.limits.max_documents,
        )) as Arc<dyn DocumentService>;

        let stock_service = Arc::new(SeaOrmStockService::new(
            store.clone(),
            config.sales.oversell_policy,
        )) as Arc<dyn StockService>;

        let image_service = Arc::new(ImageService::new(&config.general.images_path));

        let low_stock_reporter = Arc::new(LowStockReporter::new(
            store.clone(),
            mailer,
            config.low_stock.clone(),
        ));

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            auth_service,
            document_service,
            stock_service,
            image_service,
            low_stock_reporter,
        }
    }
}
