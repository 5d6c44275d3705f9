use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Statement, TransactionTrait, Value,
};
use tracing::info;

use crate::entities::{documents, prelude::*, stock};
use crate::models::document::Document;

/// Result of a cascading document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRemoval {
    pub document_removed: bool,
    pub stock_removed: u64,
}

pub struct DocumentRepository {
    conn: DatabaseConnection,
}

impl DocumentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: documents::Model) -> Document {
        Document {
            id: model.id,
            document_name: model.document_name,
            label_type: model.label_type,
            published: model.published,
        }
    }

    /// Inserts the document only while fewer than `max_documents` exist.
    ///
    /// Count and insert are a single statement, so concurrent creators can
    /// never push the table past the ceiling.
    pub async fn insert_below_limit(&self, document: &Document, max_documents: u64) -> Result<bool> {
        let backend = self.conn.get_database_backend();
        let limit = i64::try_from(max_documents).unwrap_or(i64::MAX);

        let stmt = Statement::from_sql_and_values(
            backend,
            "INSERT INTO documents (id, document_name, label_type, published) \
             SELECT ?, ?, ?, ? WHERE (SELECT COUNT(*) FROM documents) < ?",
            [
                Value::from(document.id.clone()),
                Value::from(document.document_name.clone()),
                Value::from(document.label_type.clone()),
                Value::from(document.published.clone()),
                Value::from(limit),
            ],
        );

        let result = self
            .conn
            .execute(stmt)
            .await
            .context("Failed to insert document")?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            info!(document_id = %document.id, name = %document.document_name, "Created document");
        }
        Ok(inserted)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        let model = Documents::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query document")?;
        Ok(model.map(Self::map_model))
    }

    /// Most recent first.
    pub async fn list(&self) -> Result<Vec<Document>> {
        let rows = Documents::find()
            .order_by_desc(documents::Column::Published)
            .order_by_desc(documents::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list documents")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Documents::find()
            .count(&self.conn)
            .await
            .context("Failed to count documents")
    }

    /// Removes the document's stock and then the document in one transaction.
    pub async fn remove_cascade(&self, id: &str) -> Result<DocumentRemoval> {
        let txn = self.conn.begin().await?;

        let stock_result = Stock::delete_many()
            .filter(stock::Column::DocumentId.eq(id))
            .exec(&txn)
            .await?;

        let doc_result = Documents::delete_by_id(id.to_string()).exec(&txn).await?;

        txn.commit().await?;

        let removal = DocumentRemoval {
            document_removed: doc_result.rows_affected > 0,
            stock_removed: stock_result.rows_affected,
        };

        if removal.document_removed {
            info!(
                document_id = %id,
                stock_removed = removal.stock_removed,
                "Removed document"
            );
        }
        Ok(removal)
    }
}
