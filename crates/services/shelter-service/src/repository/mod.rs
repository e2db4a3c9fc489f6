//! Repository layer for data access.
//!
//! Each store has a connection-generic query module so the same statements
//! serve both the pooled stores and the transaction-scoped repositories in
//! [`crate::infra::unit_of_work`].

mod check_in_repository;
pub mod entities;
mod person_repository;
mod shelter_repository;

use common::AppError;
use sea_orm::{DbErr, SqlErr};

pub use check_in_repository::{CheckInRepository, CheckInStore};
pub use person_repository::{PersonRepository, PersonStore};
pub use shelter_repository::{ShelterRepository, ShelterStore};

pub(crate) use check_in_repository::queries as check_in_queries;
pub(crate) use person_repository::queries as person_queries;
pub(crate) use shelter_repository::queries as shelter_queries;

// Export mocks for tests
#[cfg(any(test, feature = "test-utils"))]
pub use check_in_repository::MockCheckInRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use person_repository::MockPersonRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use shelter_repository::MockShelterRepository;

/// Map a unique-constraint violation to a conflict, anything else to a database error
pub(crate) fn unique_violation_as_conflict(err: DbErr, message: impl FnOnce() -> String) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(%detail, "Unique constraint rejected write");
            AppError::conflict(message())
        }
        _ => AppError::from(err),
    }
}
