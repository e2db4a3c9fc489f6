//! Application services layer - use cases and business logic.
//!
//! The check-in ledger goes through the Unit of Work for transactions;
//! the shelter directory and person registry work on their repositories.

pub mod container;
mod ledger;
mod person_service;
mod shelter_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use ledger::{CheckInService, OccupancyLedger};
pub use person_service::{PersonRegistry, PersonService};
pub use shelter_service::{ShelterDirectory, ShelterService};
