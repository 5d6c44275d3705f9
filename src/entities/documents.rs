use sea_orm::entity::prelude::*;

/// A label batch. Stock rows point at it by value through `stock.document_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub document_name: String,

    pub label_type: String,

    /// RFC 3339, whole seconds, UTC
    pub published: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
