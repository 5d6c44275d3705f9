//! `SeaORM` implementation of the `DocumentService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{DocumentRemoval, Store};
use crate::models::document::Document;
use crate::services::document_service::{DocumentError, DocumentService};

pub struct SeaOrmDocumentService {
    store: Store,
    max_documents: u64,
}

impl SeaOrmDocumentService {
    #[must_use]
    pub const fn new(store: Store, max_documents: u64) -> Self {
        Self {
            store,
            max_documents,
        }
    }
}

#[async_trait]
impl DocumentService for SeaOrmDocumentService {
    async fn create(&self, name: &str, label_type: &str) -> Result<Document, DocumentError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DocumentError::Validation(
                "Document name is required".to_string(),
            ));
        }

        let document = Document {
            id: uuid::Uuid::new_v4().to_string(),
            document_name: name.to_string(),
            label_type: label_type.trim().to_string(),
            published: crate::models::timestamp_now(),
        };

        if self
            .store
            .insert_document_below_limit(&document, self.max_documents)
            .await?
        {
            Ok(document)
        } else {
            warn!(max = self.max_documents, "Document limit reached, creation refused");
            Err(DocumentError::LimitReached {
                max: self.max_documents,
            })
        }
    }

    async fn list(&self) -> Result<Vec<Document>, DocumentError> {
        Ok(self.store.list_documents().await?)
    }

    async fn get(&self, id: &str) -> Result<Document, DocumentError> {
        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<DocumentRemoval, DocumentError> {
        let removal = self.store.remove_document(id).await?;
        if !removal.document_removed {
            info!(document_id = %id, "Delete requested for unknown document");
        }
        Ok(removal)
    }

    async fn count(&self) -> Result<u64, DocumentError> {
        Ok(self.store.count_documents().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stock::StockItem;

    async fn service(max_documents: u64) -> (Store, SeaOrmDocumentService) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        (store.clone(), SeaOrmDocumentService::new(store, max_documents))
    }

    fn item(document_id: &str, barcode: &str) -> StockItem {
        StockItem {
            id: uuid::Uuid::new_v4().to_string(),
            image_url: None,
            product_name: format!("Product {barcode}"),
            product_code: String::new(),
            brand: String::new(),
            category: String::new(),
            qty: 1,
            rrp: String::new(),
            price: String::new(),
            barcode: barcode.to_string(),
            document_id: document_id.to_string(),
            published: crate::models::timestamp_now(),
        }
    }

    #[tokio::test]
    async fn test_ceiling_is_enforced_for_any_limit() {
        for max in 0..4u64 {
            let (_, service) = service(max).await;

            for _ in 0..max {
                service.create("Batch", "shelf").await.unwrap();
            }

            assert!(matches!(
                service.create("One too many", "shelf").await,
                Err(DocumentError::LimitReached { max: m }) if m == max
            ));
            assert_eq!(service.count().await.unwrap(), max);
        }
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let (store, service) = service(10).await;

        for (id, published) in [
            ("a", "2024-01-01T10:00:00Z"),
            ("b", "2024-03-01T10:00:00Z"),
            ("c", "2024-02-01T10:00:00Z"),
        ] {
            let document = Document {
                id: id.to_string(),
                document_name: id.to_string(),
                label_type: "shelf".to_string(),
                published: published.to_string(),
            };
            store.insert_document_below_limit(&document, 10).await.unwrap();
        }

        let ids: Vec<String> = service.list().await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_stock() {
        let (store, service) = service(10).await;
        let doomed = service.create("Aisle 3", "shelf").await.unwrap();
        let kept = service.create("Aisle 4", "shelf").await.unwrap();

        store
            .add_stock_batch(&[item(&doomed.id, "1"), item(&doomed.id, "2"), item(&kept.id, "3")])
            .await
            .unwrap();

        let removal = service.delete(&doomed.id).await.unwrap();
        assert!(removal.document_removed);
        assert_eq!(removal.stock_removed, 2);

        assert!(store.list_stock_for_document(&doomed.id, None).await.unwrap().is_empty());
        assert_eq!(store.list_stock_for_document(&kept.id, None).await.unwrap().len(), 1);
        assert!(matches!(
            service.get(&doomed.id).await,
            Err(DocumentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_document_is_noop() {
        let (_, service) = service(10).await;
        let removal = service.delete(&uuid::Uuid::new_v4().to_string()).await.unwrap();
        assert!(!removal.document_removed);
        assert_eq!(removal.stock_removed, 0);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let (_, service) = service(10).await;
        assert!(matches!(
            service.create("   ", "shelf").await,
            Err(DocumentError::Validation(_))
        ));
    }
}
