//! Check-in domain entity and its two-state lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::occupancy::Placement;
use crate::person::Person;
use crate::shelter::Shelter;

/// Lifecycle state of a check-in record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInState {
    /// Person is currently housed (no exit recorded)
    Active,
    /// Person has left (exit recorded)
    Closed,
}

impl std::fmt::Display for CheckInState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckInState::Active => write!(f, "active"),
            CheckInState::Closed => write!(f, "closed"),
        }
    }
}

/// Check-in domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: Uuid,
    pub shelter_id: Uuid,
    pub person_id: Uuid,
    pub entry_time: DateTime<Utc>,
    /// Exit timestamp (None = active, Some = closed)
    pub exit_time: Option<DateTime<Utc>>,
}

impl CheckIn {
    /// Open a new active check-in
    pub fn open(shelter_id: Uuid, person_id: Uuid, entry_time: Option<DateTime<Utc>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            shelter_id,
            person_id,
            entry_time: entry_time.unwrap_or_else(Utc::now),
            exit_time: None,
        }
    }

    /// Check if the person is still checked in
    pub fn is_active(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Current lifecycle state
    pub fn state(&self) -> CheckInState {
        if self.is_active() {
            CheckInState::Active
        } else {
            CheckInState::Closed
        }
    }

    /// Where this record holds (or would hold) a bed
    pub fn placement(&self) -> Placement {
        Placement {
            shelter_id: self.shelter_id,
            active: self.is_active(),
        }
    }

    /// Merge an update into a copy of this record.
    ///
    /// The original is left untouched so a rejected update has nothing to undo.
    pub fn revised(&self, changes: &UpdateCheckIn) -> DomainResult<CheckIn> {
        let mut next = self.clone();
        next.shelter_id = changes.shelter_id;
        if let Some(entry_time) = changes.entry_time {
            next.entry_time = entry_time;
        }
        match changes.exit {
            ExitChange::Unchanged => {}
            ExitChange::Clear => next.exit_time = None,
            ExitChange::Set(exit_time) => next.exit_time = Some(exit_time),
        }

        if let Some(exit_time) = next.exit_time {
            if exit_time < next.entry_time {
                return Err(DomainError::validation(
                    "Exit time cannot be earlier than entry time",
                ));
            }
        }

        Ok(next)
    }
}

/// Check-in creation data
#[derive(Debug, Clone, Deserialize)]
pub struct NewCheckIn {
    pub shelter_id: Uuid,
    pub person_id: Uuid,
    /// Defaults to the current time
    #[serde(default)]
    pub entry_time: Option<DateTime<Utc>>,
}

/// How an update treats the exit timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitChange {
    /// Keep whatever is recorded
    #[default]
    Unchanged,
    /// Remove the exit timestamp (reactivates a closed record)
    Clear,
    /// Record an exit (closes an active record)
    Set(DateTime<Utc>),
}

impl From<Option<Option<DateTime<Utc>>>> for ExitChange {
    fn from(value: Option<Option<DateTime<Utc>>>) -> Self {
        match value {
            None => ExitChange::Unchanged,
            Some(None) => ExitChange::Clear,
            Some(Some(exit_time)) => ExitChange::Set(exit_time),
        }
    }
}

/// Check-in update data
#[derive(Debug, Clone)]
pub struct UpdateCheckIn {
    /// Target shelter; differs from the current one for a move
    pub shelter_id: Uuid,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit: ExitChange,
}

/// Check-in together with its shelter and person
#[derive(Debug, Clone, Serialize)]
pub struct CheckInDetails {
    #[serde(flatten)]
    pub check_in: CheckIn,
    pub state: CheckInState,
    pub shelter: Shelter,
    pub person: Person,
}

impl CheckInDetails {
    pub fn new(check_in: CheckIn, shelter: Shelter, person: Person) -> Self {
        Self {
            state: check_in.state(),
            check_in,
            shelter,
            person,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active() -> CheckIn {
        CheckIn::open(Uuid::new_v4(), Uuid::new_v4(), Some(Utc::now() - Duration::hours(2)))
    }

    #[test]
    fn open_record_is_active() {
        let record = active();
        assert!(record.is_active());
        assert_eq!(record.state(), CheckInState::Active);
    }

    #[test]
    fn entry_time_defaults_to_now() {
        let before = Utc::now();
        let record = CheckIn::open(Uuid::new_v4(), Uuid::new_v4(), None);
        assert!(record.entry_time >= before);
    }

    #[test]
    fn setting_exit_closes_without_touching_original() {
        let record = active();
        let changes = UpdateCheckIn {
            shelter_id: record.shelter_id,
            entry_time: None,
            exit: ExitChange::Set(Utc::now()),
        };

        let next = record.revised(&changes).unwrap();
        assert_eq!(next.state(), CheckInState::Closed);
        assert!(record.is_active());
    }

    #[test]
    fn clearing_exit_reactivates() {
        let mut record = active();
        record.exit_time = Some(Utc::now());
        let changes = UpdateCheckIn {
            shelter_id: record.shelter_id,
            entry_time: None,
            exit: ExitChange::Clear,
        };

        assert!(record.revised(&changes).unwrap().is_active());
    }

    #[test]
    fn unchanged_exit_keeps_state() {
        let mut record = active();
        let exit = Utc::now();
        record.exit_time = Some(exit);
        let changes = UpdateCheckIn {
            shelter_id: Uuid::new_v4(),
            entry_time: None,
            exit: ExitChange::Unchanged,
        };

        let next = record.revised(&changes).unwrap();
        assert_eq!(next.exit_time, Some(exit));
        assert_eq!(next.shelter_id, changes.shelter_id);
    }

    #[test]
    fn exit_before_entry_is_rejected() {
        let record = active();
        let changes = UpdateCheckIn {
            shelter_id: record.shelter_id,
            entry_time: None,
            exit: ExitChange::Set(record.entry_time - Duration::minutes(1)),
        };

        assert!(matches!(
            record.revised(&changes),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn exit_change_from_double_option() {
        let now = Utc::now();
        assert_eq!(ExitChange::from(None), ExitChange::Unchanged);
        assert_eq!(ExitChange::from(Some(None)), ExitChange::Clear);
        assert_eq!(ExitChange::from(Some(Some(now))), ExitChange::Set(now));
    }

    #[test]
    fn details_serialize_flat() {
        let record = active();
        let shelter = Shelter::new(record.shelter_id, "Gym".to_string(), 10, None);
        let person = Person {
            id: record.person_id,
            name: "Ana".to_string(),
            national_id: "123".to_string(),
            birth_date: None,
            medical_condition: None,
            missing: false,
            emergency_contact: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(CheckInDetails::new(record.clone(), shelter, person)).unwrap();
        assert_eq!(json["id"], serde_json::json!(record.id));
        assert_eq!(json["state"], "active");
        assert_eq!(json["shelter"]["name"], "Gym");
        assert!(json["exit_time"].is_null());
    }
}
