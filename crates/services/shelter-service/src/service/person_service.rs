//! Person service - registration and lookup of people.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{NewPerson, Person, UpdatePerson, SUBJECT_PERSON};

use crate::repository::PersonRepository;

/// Person service trait for dependency injection.
#[async_trait]
pub trait PersonService: Send + Sync {
    /// Register a new person
    async fn register_person(&self, person: NewPerson) -> AppResult<Person>;

    /// Get person by ID
    async fn get_person(&self, id: Uuid) -> AppResult<Person>;

    /// List all people ordered by name
    async fn list_people(&self) -> AppResult<Vec<Person>>;

    /// Check if a person exists
    async fn person_exists(&self, id: Uuid) -> AppResult<bool>;

    /// Update profile fields
    async fn update_person(&self, id: Uuid, changes: UpdatePerson) -> AppResult<Person>;

    /// Delete a person who is not checked in; `Ok(false)` when missing
    async fn delete_person(&self, id: Uuid) -> AppResult<bool>;
}

/// Concrete implementation of PersonService using repository.
pub struct PersonRegistry {
    repo: Arc<dyn PersonRepository>,
}

impl PersonRegistry {
    /// Create new person service instance with repository
    pub fn new(repo: Arc<dyn PersonRepository>) -> Self {
        Self { repo }
    }

    async fn ensure_national_id_free(&self, national_id: &str, owner: Option<Uuid>) -> AppResult<()> {
        match self.repo.find_by_national_id(national_id).await? {
            Some(other) if Some(other.id) != owner => Err(AppError::conflict(format!(
                "A person with national ID '{}' is already registered",
                other.national_id
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PersonService for PersonRegistry {
    async fn register_person(&self, person: NewPerson) -> AppResult<Person> {
        person.validate()?;
        self.ensure_national_id_free(&person.national_id, None).await?;

        let created = self.repo.create(person).await?;
        tracing::info!(person_id = %created.id, "Person registered");
        Ok(created)
    }

    async fn get_person(&self, id: Uuid) -> AppResult<Person> {
        self.repo.find_by_id(id).await?.ok_or_not_found(SUBJECT_PERSON)
    }

    async fn list_people(&self) -> AppResult<Vec<Person>> {
        self.repo.list().await
    }

    async fn person_exists(&self, id: Uuid) -> AppResult<bool> {
        self.repo.exists(id).await
    }

    async fn update_person(&self, id: Uuid, changes: UpdatePerson) -> AppResult<Person> {
        changes.validate()?;
        if let Some(ref national_id) = changes.national_id {
            self.ensure_national_id_free(national_id, Some(id)).await?;
        }

        self.repo.update(id, changes).await
    }

    async fn delete_person(&self, id: Uuid) -> AppResult<bool> {
        let deleted = self.repo.delete(id).await?;
        if deleted {
            tracing::info!(person_id = %id, "Person deleted");
        }
        Ok(deleted)
    }
}
