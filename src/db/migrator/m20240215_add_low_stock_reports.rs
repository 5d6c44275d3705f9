use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LowStockReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LowStockReports::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LowStockReports::ReportDate)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LowStockReports::ItemCount)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LowStockReports::SentAt).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LowStockReports::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum LowStockReports {
    Table,
    Id,
    ReportDate,
    ItemCount,
    SentAt,
}
