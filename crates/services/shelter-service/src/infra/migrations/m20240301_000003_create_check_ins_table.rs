//! Migration: Create check_ins table.
//!
//! The partial unique index allows any number of closed check-ins per person
//! but at most one without an exit time.

use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_shelters_table::Shelters;
use super::m20240301_000002_create_people_table::People;

const ACTIVE_PERSON_INDEX: &str = "idx_check_ins_active_person";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CheckIns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CheckIns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CheckIns::ShelterId).uuid().not_null())
                    .col(ColumnDef::new(CheckIns::PersonId).uuid().not_null())
                    .col(
                        ColumnDef::new(CheckIns::EntryTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CheckIns::ExitTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_check_ins_shelter")
                            .from(CheckIns::Table, CheckIns::ShelterId)
                            .to(Shelters::Table, Shelters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_check_ins_person")
                            .from(CheckIns::Table, CheckIns::PersonId)
                            .to(People::Table, People::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_check_ins_shelter_id")
                    .table(CheckIns::Table)
                    .col(CheckIns::ShelterId)
                    .to_owned(),
            )
            .await?;

        // Same statement on PostgreSQL and SQLite
        manager
            .get_connection()
            .execute_unprepared(&format!(
                "CREATE UNIQUE INDEX {} ON check_ins (person_id) WHERE exit_time IS NULL",
                ACTIVE_PERSON_INDEX
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!("DROP INDEX IF EXISTS {}", ACTIVE_PERSON_INDEX))
            .await?;

        manager
            .drop_table(Table::drop().table(CheckIns::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CheckIns {
    Table,
    Id,
    ShelterId,
    PersonId,
    EntryTime,
    ExitTime,
}
