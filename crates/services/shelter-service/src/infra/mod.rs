//! Infrastructure layer - database, migrations and transaction management.

mod db;
pub mod migrations;
pub mod unit_of_work;

pub use db::Database;
pub use migrations::Migrator;
pub use unit_of_work::{
    Persistence, TransactionContext, TxCheckInRepository, TxPersonRepository, TxFuture,
    TxShelterRepository, UnitOfWork,
};
