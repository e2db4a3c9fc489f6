//! Shelter service - shelter directory use cases.
//!
//! Occupancy is read here but never written; see [`super::OccupancyLedger`].

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{NewShelter, Shelter, UpdateShelter, SUBJECT_SHELTER};

use crate::repository::ShelterRepository;

/// Shelter service trait for dependency injection.
#[async_trait]
pub trait ShelterService: Send + Sync {
    /// Create an empty shelter
    async fn create_shelter(&self, shelter: NewShelter) -> AppResult<Shelter>;

    /// Get shelter by ID
    async fn get_shelter(&self, id: Uuid) -> AppResult<Shelter>;

    /// List all shelters ordered by name
    async fn list_shelters(&self) -> AppResult<Vec<Shelter>>;

    /// Update name, capacity or address
    async fn update_shelter(&self, id: Uuid, changes: UpdateShelter) -> AppResult<Shelter>;

    /// Delete an empty shelter; `Ok(false)` when it does not exist
    async fn delete_shelter(&self, id: Uuid) -> AppResult<bool>;
}

/// Concrete implementation of ShelterService using repository.
pub struct ShelterDirectory {
    repo: Arc<dyn ShelterRepository>,
}

impl ShelterDirectory {
    /// Create new shelter service instance with repository
    pub fn new(repo: Arc<dyn ShelterRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ShelterService for ShelterDirectory {
    async fn create_shelter(&self, shelter: NewShelter) -> AppResult<Shelter> {
        shelter.validate()?;

        if self.repo.find_by_name(&shelter.name).await?.is_some() {
            return Err(AppError::conflict(format!(
                "Shelter '{}' already exists",
                shelter.name.trim()
            )));
        }

        let created = self.repo.create(shelter).await?;
        tracing::info!(shelter_id = %created.id, capacity = created.capacity, "Shelter created");
        Ok(created)
    }

    async fn get_shelter(&self, id: Uuid) -> AppResult<Shelter> {
        self.repo.find_by_id(id).await?.ok_or_not_found(SUBJECT_SHELTER)
    }

    async fn list_shelters(&self) -> AppResult<Vec<Shelter>> {
        self.repo.list().await
    }

    async fn update_shelter(&self, id: Uuid, changes: UpdateShelter) -> AppResult<Shelter> {
        changes.validate()?;

        if let Some(ref name) = changes.name {
            if let Some(other) = self.repo.find_by_name(name).await? {
                if other.id != id {
                    return Err(AppError::conflict(format!(
                        "Shelter '{}' already exists",
                        other.name
                    )));
                }
            }
        }

        self.repo.update(id, changes).await
    }

    async fn delete_shelter(&self, id: Uuid) -> AppResult<bool> {
        let deleted = self.repo.delete(id).await?;
        if deleted {
            tracing::info!(shelter_id = %id, "Shelter deleted");
        }
        Ok(deleted)
    }
}
