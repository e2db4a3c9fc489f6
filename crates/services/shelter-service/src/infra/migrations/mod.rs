//! Database migrations.
//!
//! Each migration is a separate module following SeaORM conventions.
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240301_000001_create_shelters_table;
mod m20240301_000002_create_people_table;
mod m20240301_000003_create_check_ins_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_shelters_table::Migration),
            Box::new(m20240301_000002_create_people_table::Migration),
            Box::new(m20240301_000003_create_check_ins_table::Migration),
        ]
    }
}
