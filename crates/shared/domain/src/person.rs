//! Person domain entity and related types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{is_valid_name, MAX_NATIONAL_ID_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Person domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub national_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_condition: Option<String>,
    /// Reported missing by relatives
    pub missing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    /// Check if the person has a recorded medical condition
    pub fn needs_medical_attention(&self) -> bool {
        self.medical_condition
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }
}

/// Person registration data
#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
    pub name: String,
    pub national_id: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub medical_condition: Option<String>,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub emergency_contact: Option<String>,
}

impl NewPerson {
    /// Validate field-level rules
    pub fn validate(&self) -> DomainResult<()> {
        if !is_valid_name(&self.name) {
            return Err(DomainError::validation("Name cannot be empty"));
        }
        validate_national_id(&self.national_id)
    }
}

/// Person update data; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePerson {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub medical_condition: Option<String>,
    pub missing: Option<bool>,
    pub emergency_contact: Option<String>,
}

impl UpdatePerson {
    /// Validate the fields that are present
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(ref name) = self.name {
            if !is_valid_name(name) {
                return Err(DomainError::validation("Name cannot be empty"));
            }
        }
        if let Some(ref national_id) = self.national_id {
            validate_national_id(national_id)?;
        }
        Ok(())
    }
}

fn validate_national_id(national_id: &str) -> DomainResult<()> {
    let trimmed = national_id.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_NATIONAL_ID_LENGTH {
        return Err(DomainError::validation(format!(
            "National ID must be between 1 and {} characters",
            MAX_NATIONAL_ID_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_id_is_required() {
        let person = NewPerson {
            name: "Ana".to_string(),
            national_id: " ".to_string(),
            birth_date: None,
            medical_condition: None,
            missing: false,
            emergency_contact: None,
        };
        assert!(matches!(person.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        assert!(UpdatePerson::default().validate().is_ok());

        let update = UpdatePerson {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
