//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod check_in;
pub mod person;
pub mod shelter;

// Re-exports for public API convenience
#[allow(unused_imports)]
pub use check_in::{ActiveModel as CheckInActiveModel, Entity as CheckInEntity, Model as CheckInModel};
#[allow(unused_imports)]
pub use person::{ActiveModel as PersonActiveModel, Entity as PersonEntity, Model as PersonModel};
#[allow(unused_imports)]
pub use shelter::{ActiveModel as ShelterActiveModel, Entity as ShelterEntity, Model as ShelterModel};
