//! HTTP handlers, one module per resource.

mod check_in_handler;
mod health_handler;
mod person_handler;
mod shelter_handler;

pub use check_in_handler::{check_in_routes, CreateCheckInRequest, UpdateCheckInRequest};
pub use health_handler::health_routes;
pub use person_handler::{person_routes, RegisterPersonRequest, UpdatePersonRequest};
pub use shelter_handler::{shelter_routes, CreateShelterRequest, UpdateShelterRequest};
