//! `SeaORM` implementation of the `StockService` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::OversellPolicy;
use crate::db::Store;
use crate::models::stock::{SaleLine, StockFields, StockItem};
use crate::services::stock_service::{LabelRecord, StockError, StockService, StockSummary};

pub struct SeaOrmStockService {
    store: Store,
    oversell_policy: OversellPolicy,
}

impl SeaOrmStockService {
    #[must_use]
    pub const fn new(store: Store, oversell_policy: OversellPolicy) -> Self {
        Self {
            store,
            oversell_policy,
        }
    }

    async fn ensure_document(&self, document_id: &str) -> Result<(), StockError> {
        if document_id.trim().is_empty() {
            return Err(StockError::Validation("documentId is required".to_string()));
        }

        match self.store.get_document(document_id).await? {
            Some(_) => Ok(()),
            None => Err(StockError::DocumentNotFound(document_id.to_string())),
        }
    }

    fn build_item(document_id: &str, fields: StockFields, published: &str) -> StockItem {
        StockItem {
            id: uuid::Uuid::new_v4().to_string(),
            image_url: fields.image_url,
            product_name: fields.product_name,
            product_code: fields.product_code,
            brand: fields.brand,
            category: fields.category,
            qty: fields.qty,
            rrp: fields.rrp,
            price: fields.price,
            barcode: fields.barcode,
            document_id: document_id.to_string(),
            published: published.to_string(),
        }
    }
}

fn require_barcode(fields: &StockFields) -> Result<(), StockError> {
    if fields.barcode.trim().is_empty() {
        return Err(StockError::Validation("Barcode is required".to_string()));
    }
    Ok(())
}

#[async_trait]
impl StockService for SeaOrmStockService {
    async fn create(&self, document_id: &str, fields: StockFields) -> Result<StockItem, StockError> {
        require_barcode(&fields)?;
        self.ensure_document(document_id).await?;

        let item = Self::build_item(document_id, fields, &crate::models::timestamp_now());
        self.store.add_stock(&item).await?;
        Ok(item)
    }

    async fn update(
        &self,
        original_barcode: &str,
        document_id: &str,
        fields: StockFields,
    ) -> Result<bool, StockError> {
        require_barcode(&fields)?;
        self.ensure_document(document_id).await?;

        Ok(self
            .store
            .update_stock_by_barcode(original_barcode, document_id, &fields)
            .await?)
    }

    async fn list(
        &self,
        document_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<StockItem>, StockError> {
        self.ensure_document(document_id).await?;

        let category = category.map(str::trim).filter(|c| !c.is_empty());
        Ok(self
            .store
            .list_stock_for_document(document_id, category)
            .await?)
    }

    async fn get(&self, barcode: &str) -> Result<StockItem, StockError> {
        self.store
            .get_stock_by_barcode(barcode)
            .await?
            .ok_or_else(|| StockError::NotFound(barcode.to_string()))
    }

    async fn delete(&self, barcode: &str) -> Result<bool, StockError> {
        let removed = self.store.remove_stock_by_barcode(barcode).await?;
        if !removed {
            info!(barcode = %barcode, "Delete requested for unknown barcode");
        }
        Ok(removed)
    }

    async fn import(&self, document_id: &str, rows: Vec<StockFields>) -> Result<u64, StockError> {
        self.ensure_document(document_id).await?;

        if rows.is_empty() {
            return Ok(0);
        }

        // One timestamp for the whole sheet.
        let published = crate::models::timestamp_now();
        let items: Vec<StockItem> = rows
            .into_iter()
            .map(|fields| Self::build_item(document_id, fields, &published))
            .collect();

        let inserted = self.store.add_stock_batch(&items).await?;
        info!(document_id = %document_id, inserted, "Imported stock sheet");
        Ok(inserted)
    }

    async fn process_sale(&self, lines: &[SaleLine]) -> Result<Vec<StockItem>, StockError> {
        if lines.is_empty() {
            return Err(StockError::Validation("Sale has no lines".to_string()));
        }

        for line in lines {
            if line.barcode.trim().is_empty() {
                return Err(StockError::Validation(
                    "Every sale line needs a barcode".to_string(),
                ));
            }
            if line.quantity <= 0 {
                return Err(StockError::Validation(format!(
                    "Quantity for {} must be positive",
                    line.barcode
                )));
            }
        }

        match self.store.apply_sale(lines, self.oversell_policy).await {
            Ok(items) => {
                metrics::counter!("stockplus_sales_total").increment(1);
                info!(lines = lines.len(), "Sale processed");
                Ok(items)
            }
            Err(failure) => {
                warn!(error = %failure, "Sale rolled back");
                Err(failure.into())
            }
        }
    }

    async fn labels(
        &self,
        document_id: Option<&str>,
        barcodes: &[String],
    ) -> Result<Vec<LabelRecord>, StockError> {
        if barcodes.is_empty() {
            return Err(StockError::Validation("No items selected".to_string()));
        }

        let mut items = self.store.get_stock_by_barcodes(barcodes).await?;
        if let Some(document_id) = document_id.filter(|id| !id.is_empty()) {
            items.retain(|item| item.document_id == document_id);
        }

        let mut label_types: HashMap<String, Option<String>> = HashMap::new();
        for item in &items {
            if !label_types.contains_key(&item.document_id) {
                let label_type = self
                    .store
                    .get_document(&item.document_id)
                    .await?
                    .map(|doc| doc.label_type);
                label_types.insert(item.document_id.clone(), label_type);
            }
        }

        Ok(items
            .into_iter()
            .map(|item| LabelRecord {
                label_type: label_types.get(&item.document_id).cloned().flatten(),
                product_name: item.product_name,
                product_code: item.product_code,
                brand: item.brand,
                price: item.price,
                rrp: item.rrp,
                barcode: item.barcode,
            })
            .collect())
    }

    async fn low_stock(&self, threshold: i64) -> Result<Vec<StockItem>, StockError> {
        Ok(self.store.list_low_stock(threshold).await?)
    }

    async fn summary(&self, threshold: i64) -> Result<StockSummary, StockError> {
        let totals = self.store.stock_totals().await?;
        Ok(StockSummary {
            documents: self.store.count_documents().await?,
            items: totals.items,
            units: totals.units,
            low_stock: self.store.list_low_stock(threshold).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::Document;

    async fn setup(policy: OversellPolicy) -> (Store, SeaOrmStockService, String) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let document = Document {
            id: uuid::Uuid::new_v4().to_string(),
            document_name: "Aisle 3".to_string(),
            label_type: "shelf-edge".to_string(),
            published: crate::models::timestamp_now(),
        };
        store.insert_document_below_limit(&document, 50).await.unwrap();
        (store.clone(), SeaOrmStockService::new(store, policy), document.id)
    }

    fn fields(barcode: &str, qty: i64) -> StockFields {
        StockFields {
            product_name: format!("Product {barcode}"),
            product_code: format!("P-{barcode}"),
            brand: "Acme".to_string(),
            category: "Snacks".to_string(),
            qty,
            rrp: "1.50".to_string(),
            price: "1.20".to_string(),
            barcode: barcode.to_string(),
            ..Default::default()
        }
    }

    fn sale(barcode: &str, quantity: i64) -> SaleLine {
        SaleLine {
            barcode: barcode.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_create_requires_existing_document() {
        let (_, service, _) = setup(OversellPolicy::Reject).await;
        assert!(matches!(
            service.create("missing", fields("1", 1)).await,
            Err(StockError::DocumentNotFound(_))
        ));
        assert!(matches!(
            service.create("", fields("1", 1)).await,
            Err(StockError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_requires_barcode() {
        let (store, service, doc) = setup(OversellPolicy::Reject).await;
        assert!(matches!(
            service.create(&doc, fields("  ", 1)).await,
            Err(StockError::Validation(_))
        ));
        assert_eq!(store.stock_totals().await.unwrap().items, 0);
    }

    #[tokio::test]
    async fn test_sales_decrement_relative_to_current_qty() {
        let (_, service, doc) = setup(OversellPolicy::Reject).await;
        service.create(&doc, fields("555", 10)).await.unwrap();

        let sold = service.process_sale(&[sale("555", 2)]).await.unwrap();
        assert_eq!(sold[0].qty, 8);
        service.process_sale(&[sale("555", 2)]).await.unwrap();
        assert_eq!(service.get("555").await.unwrap().qty, 6);
    }

    #[tokio::test]
    async fn test_reject_policy_leaves_batch_untouched() {
        let (_, service, doc) = setup(OversellPolicy::Reject).await;
        service.create(&doc, fields("A", 5)).await.unwrap();
        service.create(&doc, fields("B", 1)).await.unwrap();

        let result = service.process_sale(&[sale("A", 2), sale("B", 3)]).await;
        assert!(matches!(
            result,
            Err(StockError::Oversell { available: 1, requested: 3, .. })
        ));
        assert_eq!(service.get("A").await.unwrap().qty, 5);
        assert_eq!(service.get("B").await.unwrap().qty, 1);
    }

    #[tokio::test]
    async fn test_clamp_policy_floors_at_zero() {
        let (_, service, doc) = setup(OversellPolicy::Clamp).await;
        service.create(&doc, fields("A", 2)).await.unwrap();

        let sold = service.process_sale(&[sale("A", 5)]).await.unwrap();
        assert_eq!(sold[0].qty, 0);
    }

    #[tokio::test]
    async fn test_allow_policy_goes_negative() {
        let (_, service, doc) = setup(OversellPolicy::Allow).await;
        service.create(&doc, fields("A", 2)).await.unwrap();

        service.process_sale(&[sale("A", 5)]).await.unwrap();
        assert_eq!(service.get("A").await.unwrap().qty, -3);
    }

    #[tokio::test]
    async fn test_unknown_barcode_rolls_back_sale() {
        let (_, service, doc) = setup(OversellPolicy::Reject).await;
        service.create(&doc, fields("A", 5)).await.unwrap();

        let result = service.process_sale(&[sale("A", 1), sale("nope", 1)]).await;
        assert!(matches!(result, Err(StockError::NotFound(b)) if b == "nope"));
        assert_eq!(service.get("A").await.unwrap().qty, 5);
    }

    #[tokio::test]
    async fn test_sale_rejects_non_positive_quantity() {
        let (_, service, doc) = setup(OversellPolicy::Reject).await;
        service.create(&doc, fields("A", 5)).await.unwrap();

        assert!(matches!(
            service.process_sale(&[sale("A", 0)]).await,
            Err(StockError::Validation(_))
        ));
        assert!(matches!(
            service.process_sale(&[]).await,
            Err(StockError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_moves_barcode() {
        let (_, service, doc) = setup(OversellPolicy::Reject).await;
        service.create(&doc, fields("B", 4)).await.unwrap();

        let updated = service.update("B", &doc, fields("B2", 9)).await.unwrap();
        assert!(updated);

        assert!(matches!(service.get("B").await, Err(StockError::NotFound(_))));
        let item = service.get("B2").await.unwrap();
        assert_eq!(item.qty, 9);
        assert_eq!(item.product_url(), "/product/B2");

        assert!(!service.update("gone", &doc, fields("X", 1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_by_category() {
        let (_, service, doc) = setup(OversellPolicy::Reject).await;
        service.create(&doc, fields("1", 1)).await.unwrap();
        let mut drink = fields("2", 1);
        drink.category = "Drinks".to_string();
        service.create(&doc, drink).await.unwrap();

        assert_eq!(service.list(&doc, None).await.unwrap().len(), 2);
        assert_eq!(service.list(&doc, Some("")).await.unwrap().len(), 2);
        let drinks = service.list(&doc, Some("Drinks")).await.unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].barcode, "2");

        assert!(matches!(
            service.list("missing", None).await,
            Err(StockError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_import_inserts_every_row() {
        let (_, service, doc) = setup(OversellPolicy::Reject).await;
        let rows = vec![fields("1", 1), fields("2", 2), fields("3", 3)];

        assert_eq!(service.import(&doc, rows).await.unwrap(), 3);
        assert_eq!(service.import(&doc, Vec::new()).await.unwrap(), 0);
        assert_eq!(service.list(&doc, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_low_stock_threshold_is_strict() {
        let (_, service, doc) = setup(OversellPolicy::Reject).await;
        for (barcode, qty) in [("a", 0), ("b", 4), ("c", 5), ("d", 6)] {
            service.create(&doc, fields(barcode, qty)).await.unwrap();
        }

        let low: Vec<String> = service
            .low_stock(5)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.barcode)
            .collect();
        assert_eq!(low, vec!["a", "b"]);

        let summary = service.summary(5).await.unwrap();
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.items, 4);
        assert_eq!(summary.units, 15);
        assert_eq!(summary.low_stock.len(), 2);
    }

    #[tokio::test]
    async fn test_labels_carry_document_label_type() {
        let (_, service, doc) = setup(OversellPolicy::Reject).await;
        service.create(&doc, fields("1", 1)).await.unwrap();
        service.create(&doc, fields("2", 1)).await.unwrap();

        let labels = service
            .labels(None, &["1".to_string(), "unknown".to_string()])
            .await
            .unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].barcode, "1");
        assert_eq!(labels[0].label_type.as_deref(), Some("shelf-edge"));

        let elsewhere = service
            .labels(Some("other-document"), &["1".to_string()])
            .await
            .unwrap();
        assert!(elsewhere.is_empty());

        assert!(matches!(
            service.labels(None, &[]).await,
            Err(StockError::Validation(_))
        ));
    }
}
