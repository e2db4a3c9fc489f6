//! Migration: Create shelters table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shelters::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shelters::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Shelters::Name).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Shelters::Capacity)
                            .integer()
                            .not_null()
                            .check(Expr::col(Shelters::Capacity).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Shelters::CurrentOccupancy)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Shelters::CurrentOccupancy).gte(0)),
                    )
                    .col(ColumnDef::new(Shelters::AddressId).uuid().null())
                    .col(
                        ColumnDef::new(Shelters::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Shelters::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shelters::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum Shelters {
    Table,
    Id,
    Name,
    Capacity,
    CurrentOccupancy,
    AddressId,
    CreatedAt,
    UpdatedAt,
}
