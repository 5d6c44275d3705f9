use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait,
    sea_query::{Expr, SelectStatement, SimpleExpr},
};
use thiserror::Error;
use tracing::info;

use crate::config::OversellPolicy;
use crate::entities::{prelude::*, stock};
use crate::models::stock::{SaleLine, StockFields, StockItem};

/// Why a sale batch was rolled back.
#[derive(Debug, Error)]
pub enum SaleFailure {
    #[error("No stock item with barcode {0}")]
    UnknownBarcode(String),

    #[error("Insufficient stock for {barcode}: {available} available, {requested} requested")]
    Oversell {
        barcode: String,
        available: i64,
        requested: i64,
    },

    #[error(transparent)]
    Store(#[from] sea_orm::DbErr),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockTotals {
    pub items: u64,
    pub units: i64,
}

pub struct StockRepository {
    conn: DatabaseConnection,
}

impl StockRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(model: stock::Model) -> StockItem {
        StockItem {
            id: model.id,
            image_url: model.image_url,
            product_name: model.product_name,
            product_code: model.product_code,
            brand: model.brand,
            category: model.category,
            qty: model.qty,
            rrp: model.rrp,
            price: model.price,
            barcode: model.barcode,
            document_id: model.document_id,
            published: model.published,
        }
    }

    fn to_active_model(item: &StockItem) -> stock::ActiveModel {
        stock::ActiveModel {
            id: Set(item.id.clone()),
            image_url: Set(item.image_url.clone()),
            product_name: Set(item.product_name.clone()),
            product_code: Set(item.product_code.clone()),
            brand: Set(item.brand.clone()),
            category: Set(item.category.clone()),
            qty: Set(item.qty),
            rrp: Set(item.rrp.clone()),
            price: Set(item.price.clone()),
            barcode: Set(item.barcode.clone()),
            document_id: Set(item.document_id.clone()),
            published: Set(item.published.clone()),
        }
    }

    /// Duplicate barcodes are allowed; lookups pick the newest match.
    async fn find_model_by_barcode<C: ConnectionTrait>(
        conn: &C,
        barcode: &str,
    ) -> Result<Option<stock::Model>, sea_orm::DbErr> {
        Stock::find()
            .filter(stock::Column::Barcode.eq(barcode))
            .order_by_desc(stock::Column::Published)
            .order_by_desc(stock::Column::Id)
            .one(conn)
            .await
    }

    // ========================================================================
    // Stock Operations
    // ========================================================================

    pub async fn insert(&self, item: &StockItem) -> Result<()> {
        Stock::insert(Self::to_active_model(item))
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert stock item")?;
        info!(barcode = %item.barcode, document_id = %item.document_id, "Added stock item");
        Ok(())
    }

    /// Inserts all rows atomically. Returns the number inserted.
    pub async fn insert_batch(&self, items: &[StockItem]) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let txn = self.conn.begin().await?;
        let inserted = Stock::insert_many(items.iter().map(Self::to_active_model))
            .exec_without_returning(&txn)
            .await
            .context("Failed to insert stock batch")?;
        txn.commit().await?;

        Ok(inserted)
    }

    pub async fn get_by_barcode(&self, barcode: &str) -> Result<Option<StockItem>> {
        let model = Self::find_model_by_barcode(&self.conn, barcode)
            .await
            .context("Failed to query stock by barcode")?;
        Ok(model.map(Self::map_model))
    }

    pub async fn get_by_barcodes(&self, barcodes: &[String]) -> Result<Vec<StockItem>> {
        if barcodes.is_empty() {
            return Ok(vec![]);
        }

        let rows = Stock::find()
            .filter(stock::Column::Barcode.is_in(barcodes.iter().cloned()))
            .order_by_asc(stock::Column::ProductName)
            .all(&self.conn)
            .await
            .context("Failed to query stock by barcodes")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Most recent first, optionally narrowed to one category.
    pub async fn list_for_document(
        &self,
        document_id: &str,
        category: Option<&str>,
    ) -> Result<Vec<StockItem>> {
        let mut query = Stock::find().filter(stock::Column::DocumentId.eq(document_id));

        if let Some(category) = category {
            query = query.filter(stock::Column::Category.eq(category));
        }

        let rows = query
            .order_by_desc(stock::Column::Published)
            .order_by_desc(stock::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list stock for document")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Replaces every descriptive field of the item currently carrying
    /// `original_barcode`. The document reference is rewritten as well.
    pub async fn update_by_barcode(
        &self,
        original_barcode: &str,
        document_id: &str,
        fields: &StockFields,
    ) -> Result<bool> {
        let Some(model) = Self::find_model_by_barcode(&self.conn, original_barcode)
            .await
            .context("Failed to query stock for update")?
        else {
            return Ok(false);
        };

        let mut active: stock::ActiveModel = model.into();
        if fields.image_url.is_some() {
            active.image_url = Set(fields.image_url.clone());
        }
        active.product_name = Set(fields.product_name.clone());
        active.product_code = Set(fields.product_code.clone());
        active.brand = Set(fields.brand.clone());
        active.category = Set(fields.category.clone());
        active.qty = Set(fields.qty);
        active.rrp = Set(fields.rrp.clone());
        active.price = Set(fields.price.clone());
        active.barcode = Set(fields.barcode.clone());
        active.document_id = Set(document_id.to_string());
        active
            .update(&self.conn)
            .await
            .context("Failed to update stock item")?;

        info!(from = %original_barcode, to = %fields.barcode, "Updated stock item");
        Ok(true)
    }

    /// Deletes at most one item.
    pub async fn remove_by_barcode(&self, barcode: &str) -> Result<bool> {
        let Some(model) = Self::find_model_by_barcode(&self.conn, barcode)
            .await
            .context("Failed to query stock for delete")?
        else {
            return Ok(false);
        };

        let result = Stock::delete_by_id(model.id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Applies every line of a sale or none of them.
    ///
    /// Each decrement is a relative `qty = qty - n` update, so concurrent sales
    /// of the same item compose instead of overwriting each other. The guarded
    /// update is the first statement of every line: the write lock is taken
    /// before anything is read, so overlapping sales queue on the busy timeout
    /// instead of failing on a shared-to-write lock upgrade.
    pub async fn apply_sale(
        &self,
        lines: &[SaleLine],
        policy: OversellPolicy,
    ) -> Result<Vec<StockItem>, SaleFailure> {
        let txn = self.conn.begin().await?;
        let mut touched = Vec::with_capacity(lines.len());

        for line in lines {
            let decremented: SimpleExpr = match policy {
                OversellPolicy::Clamp => Expr::case(
                    Expr::col(stock::Column::Qty).gte(line.quantity),
                    Expr::col(stock::Column::Qty).sub(line.quantity),
                )
                .finally(0)
                .into(),
                OversellPolicy::Reject | OversellPolicy::Allow => {
                    Expr::col(stock::Column::Qty).sub(line.quantity)
                }
            };

            let mut update = Stock::update_many()
                .col_expr(stock::Column::Qty, decremented)
                .filter(stock::Column::Id.in_subquery(Self::newest_id_for(&line.barcode)));

            if policy == OversellPolicy::Reject {
                update = update.filter(stock::Column::Qty.gte(line.quantity));
            }

            let result = update.exec(&txn).await?;
            let current = Self::find_model_by_barcode(&txn, &line.barcode).await?;

            match current {
                None => return Err(SaleFailure::UnknownBarcode(line.barcode.clone())),
                Some(model) if result.rows_affected == 0 => {
                    return Err(SaleFailure::Oversell {
                        barcode: line.barcode.clone(),
                        available: model.qty,
                        requested: line.quantity,
                    });
                }
                Some(model) => touched.push(model.id),
            }
        }

        let rows = Stock::find()
            .filter(stock::Column::Id.is_in(touched))
            .order_by_asc(stock::Column::ProductName)
            .all(&txn)
            .await?;

        txn.commit().await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// `SELECT id` of the row `find_model_by_barcode` would return.
    fn newest_id_for(barcode: &str) -> SelectStatement {
        Stock::find()
            .select_only()
            .column(stock::Column::Id)
            .filter(stock::Column::Barcode.eq(barcode))
            .order_by_desc(stock::Column::Published)
            .order_by_desc(stock::Column::Id)
            .limit(1)
            .into_query()
    }

    /// Items with `qty` strictly below `threshold`, lowest first.
    pub async fn list_below(&self, threshold: i64) -> Result<Vec<StockItem>> {
        let rows = Stock::find()
            .filter(stock::Column::Qty.lt(threshold))
            .order_by_asc(stock::Column::Qty)
            .order_by_asc(stock::Column::ProductName)
            .all(&self.conn)
            .await
            .context("Failed to query low stock")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn totals(&self) -> Result<StockTotals> {
        let items = Stock::find()
            .count(&self.conn)
            .await
            .context("Failed to count stock")?;

        let units: Option<Option<i64>> = Stock::find()
            .select_only()
            .column_as(Expr::col(stock::Column::Qty).sum(), "units")
            .into_tuple()
            .one(&self.conn)
            .await
            .context("Failed to sum stock quantities")?;

        Ok(StockTotals {
            items,
            units: units.flatten().unwrap_or(0),
        })
    }
}
