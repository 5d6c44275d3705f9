use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stock")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub image_url: Option<String>,

    pub product_name: String,

    pub product_code: String,

    pub brand: String,

    pub category: String,

    pub qty: i64,

    pub rrp: String,

    pub price: String,

    #[sea_orm(indexed)]
    pub barcode: String,

    #[sea_orm(indexed)]
    pub document_id: String,

    pub published: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
