//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Shelters
// =============================================================================

/// Smallest capacity a shelter may be registered with
pub const MIN_SHELTER_CAPACITY: i32 = 1;

/// Occupancy counters never go below this value
pub const MIN_OCCUPANCY: i32 = 0;

// =============================================================================
// Validation
// =============================================================================

/// Minimum name length requirement (shelters and people)
pub const MIN_NAME_LENGTH: usize = 1;

/// Maximum name length accepted by the API
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum national identifier length
pub const MAX_NATIONAL_ID_LENGTH: usize = 32;

// =============================================================================
// Error subjects
// =============================================================================

/// Subject used in not-found messages for shelters
pub const SUBJECT_SHELTER: &str = "Shelter";

/// Subject used in not-found messages for people
pub const SUBJECT_PERSON: &str = "Person";

/// Subject used in not-found messages for check-ins
pub const SUBJECT_CHECK_IN: &str = "Check-in";

/// Check if a shelter capacity value is acceptable
pub fn is_valid_capacity(capacity: i32) -> bool {
    capacity >= MIN_SHELTER_CAPACITY
}

/// Check if a display name is acceptable after trimming
pub fn is_valid_name(name: &str) -> bool {
    let len = name.trim().chars().count();
    (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len)
}
