//! Occupancy accounting rules.
//!
//! A shelter's counter moves by one bed at a time: a record that stops being
//! active (or leaves the shelter while active) releases its bed, and a record
//! that becomes active (or arrives while active) claims one. Claims are subject
//! to capacity; releases floor at zero.

use serde::Serialize;
use uuid::Uuid;

/// Where a check-in holds a bed, and whether it currently does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub shelter_id: Uuid,
    pub active: bool,
}

/// Counter adjustments needed to move a record between two placements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OccupancyPlan {
    /// Shelter whose counter is decremented (floored at zero)
    pub release: Option<Uuid>,
    /// Shelter whose counter is incremented (capacity-checked)
    pub claim: Option<Uuid>,
}

impl OccupancyPlan {
    /// Plan for a brand-new active record
    pub fn admit(shelter_id: Uuid) -> Self {
        Self {
            release: None,
            claim: Some(shelter_id),
        }
    }

    /// Plan for removing a record
    pub fn discharge(current: Placement) -> Self {
        Self {
            release: current.active.then_some(current.shelter_id),
            claim: None,
        }
    }

    /// Plan for turning `current` into `next`
    pub fn between(current: Placement, next: Placement) -> Self {
        let moved = current.shelter_id != next.shelter_id;
        let release = (current.active && (moved || !next.active)).then_some(current.shelter_id);
        let claim = (next.active && (moved || !current.active)).then_some(next.shelter_id);
        Self { release, claim }
    }

    /// True when neither counter changes
    pub fn is_noop(&self) -> bool {
        self.release.is_none() && self.claim.is_none()
    }

    /// True when the plan turns a closed record back into an active one
    pub fn reactivates(current: Placement, next: Placement) -> bool {
        !current.active && next.active
    }
}

/// Result of recounting a shelter's active check-ins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccupancyReport {
    pub shelter_id: Uuid,
    /// Counter value before reconciliation
    pub recorded: i32,
    /// Number of active check-ins found
    pub actual: i32,
    pub capacity: i32,
}

impl OccupancyReport {
    /// True when the cached counter disagreed with the check-ins
    pub fn drifted(&self) -> bool {
        self.recorded != self.actual
    }
}
