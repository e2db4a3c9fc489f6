//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! shelters, people, check-ins and the occupancy rules that tie them together.

pub mod check_in;
pub mod constants;
pub mod error;
pub mod occupancy;
pub mod person;
pub mod shelter;

pub use check_in::{CheckIn, CheckInDetails, CheckInState, ExitChange, NewCheckIn, UpdateCheckIn};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use occupancy::{OccupancyPlan, OccupancyReport, Placement};
pub use person::{NewPerson, Person, UpdatePerson};
pub use shelter::{NewShelter, Shelter, UpdateShelter};
