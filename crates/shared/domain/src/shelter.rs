//! Shelter domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{is_valid_capacity, is_valid_name, MIN_OCCUPANCY};
use crate::error::{DomainError, DomainResult};

/// Shelter domain entity
///
/// `current_occupancy` is a cached counter of the shelter's active check-ins.
/// Only the occupancy ledger changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub current_occupancy: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shelter {
    /// Create a new, empty shelter
    pub fn new(id: Uuid, name: String, capacity: i32, address_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            capacity,
            current_occupancy: MIN_OCCUPANCY,
            address_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if at least one bed is free
    pub fn has_vacancy(&self) -> bool {
        self.current_occupancy < self.capacity
    }

    /// Number of free beds (zero when full or over-full)
    pub fn vacancies(&self) -> i32 {
        (self.capacity - self.current_occupancy).max(0)
    }

    /// Conflict raised when a check-in would exceed capacity
    pub fn at_capacity(&self) -> DomainError {
        DomainError::conflict(format!(
            "Shelter '{}' ({}) is at capacity ({}/{})",
            self.name, self.id, self.current_occupancy, self.capacity
        ))
    }

    /// Ensure a capacity change keeps everyone currently housed
    pub fn check_capacity_change(&self, capacity: i32) -> DomainResult<()> {
        if !is_valid_capacity(capacity) {
            return Err(DomainError::validation("Capacity must be greater than zero"));
        }
        if capacity < self.current_occupancy {
            return Err(DomainError::conflict(format!(
                "Capacity {} is below the current occupancy of shelter '{}' ({})",
                capacity, self.name, self.current_occupancy
            )));
        }
        Ok(())
    }
}

/// Shelter creation data
#[derive(Debug, Clone, Deserialize)]
pub struct NewShelter {
    pub name: String,
    pub capacity: i32,
    #[serde(default)]
    pub address_id: Option<Uuid>,
}

impl NewShelter {
    /// Validate field-level rules
    pub fn validate(&self) -> DomainResult<()> {
        if !is_valid_name(&self.name) {
            return Err(DomainError::validation("Shelter name cannot be empty"));
        }
        if !is_valid_capacity(self.capacity) {
            return Err(DomainError::validation("Capacity must be greater than zero"));
        }
        Ok(())
    }
}

/// Shelter update data; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateShelter {
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub address_id: Option<Uuid>,
}

impl UpdateShelter {
    /// Validate the fields that are present
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(ref name) = self.name {
            if !is_valid_name(name) {
                return Err(DomainError::validation("Shelter name cannot be empty"));
            }
        }
        if let Some(capacity) = self.capacity {
            if !is_valid_capacity(capacity) {
                return Err(DomainError::validation("Capacity must be greater than zero"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shelter(capacity: i32, occupancy: i32) -> Shelter {
        let mut shelter = Shelter::new(Uuid::new_v4(), "Gym".to_string(), capacity, None);
        shelter.current_occupancy = occupancy;
        shelter
    }

    #[test]
    fn vacancy_tracks_counter() {
        assert!(shelter(2, 1).has_vacancy());
        assert!(!shelter(2, 2).has_vacancy());
        assert_eq!(shelter(5, 3).vacancies(), 2);
        assert_eq!(shelter(2, 3).vacancies(), 0);
    }

    #[test]
    fn capacity_cannot_drop_below_occupancy() {
        let gym = shelter(10, 6);
        assert!(gym.check_capacity_change(6).is_ok());
        assert!(matches!(
            gym.check_capacity_change(5),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            gym.check_capacity_change(0),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn at_capacity_message_names_shelter() {
        let gym = shelter(2, 2);
        let msg = gym.at_capacity().to_string();
        assert!(msg.contains("Gym"));
        assert!(msg.contains("2/2"));
    }

    #[test]
    fn new_shelter_validation() {
        let ok = NewShelter {
            name: "School".to_string(),
            capacity: 1,
            address_id: None,
        };
        assert!(ok.validate().is_ok());

        let blank = NewShelter {
            name: "   ".to_string(),
            ..ok.clone()
        };
        assert!(blank.validate().is_err());

        let empty = NewShelter { capacity: 0, ..ok };
        assert!(empty.validate().is_err());
    }
}
