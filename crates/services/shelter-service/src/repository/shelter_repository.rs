//! Shelter repository implementation.
//!
//! The store never writes `current_occupancy` except to zero it on insert.
//! Counter moves live in [`queries`] and are reached only through a
//! transaction context.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::shelter::{self, ActiveModel, Entity as ShelterEntity};
use super::unique_violation_as_conflict;
use common::{AppError, AppResult};
use domain::{NewShelter, Shelter, UpdateShelter, SUBJECT_SHELTER};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Shelter repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ShelterRepository: Send + Sync {
    /// Find shelter by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Shelter>>;

    /// Find shelter by its unique name
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Shelter>>;

    /// List all shelters ordered by name
    async fn list(&self) -> AppResult<Vec<Shelter>>;

    /// Create an empty shelter
    async fn create(&self, shelter: NewShelter) -> AppResult<Shelter>;

    /// Update name, capacity or address.
    ///
    /// A capacity below the current occupancy is rejected atomically with the write.
    async fn update(&self, id: Uuid, changes: UpdateShelter) -> AppResult<Shelter>;

    /// Delete an empty shelter; `Ok(false)` when it does not exist
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Concrete implementation of ShelterRepository
pub struct ShelterStore {
    db: DatabaseConnection,
}

impl ShelterStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ShelterRepository for ShelterStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Shelter>> {
        queries::find_by_id(&self.db, id).await
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Shelter>> {
        let result = ShelterEntity::find()
            .filter(shelter::Column::Name.eq(name.trim()))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Shelter::from))
    }

    async fn list(&self) -> AppResult<Vec<Shelter>> {
        let models = ShelterEntity::find()
            .order_by_asc(shelter::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Shelter::from).collect())
    }

    async fn create(&self, new: NewShelter) -> AppResult<Shelter> {
        let name = new.name.trim().to_string();
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.clone()),
            capacity: Set(new.capacity),
            current_occupancy: Set(0),
            address_id: Set(new.address_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| unique_violation_as_conflict(e, || format!("Shelter '{}' already exists", name)))?;

        Ok(Shelter::from(model))
    }

    async fn update(&self, id: Uuid, changes: UpdateShelter) -> AppResult<Shelter> {
        let mut query = ShelterEntity::update_many()
            .col_expr(shelter::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(shelter::Column::Id.eq(id));

        let new_name = changes.name.map(|n| n.trim().to_string());
        if let Some(ref name) = new_name {
            query = query.col_expr(shelter::Column::Name, Expr::value(name.clone()));
        }
        if let Some(capacity) = changes.capacity {
            query = query
                .col_expr(shelter::Column::Capacity, Expr::value(capacity))
                .filter(shelter::Column::CurrentOccupancy.lte(capacity));
        }
        if let Some(address_id) = changes.address_id {
            query = query.col_expr(shelter::Column::AddressId, Expr::value(address_id));
        }

        let result = query.exec(&self.db).await.map_err(|e| {
            unique_violation_as_conflict(e, || {
                format!("Shelter '{}' already exists", new_name.clone().unwrap_or_default())
            })
        })?;

        let current = queries::find_by_id(&self.db, id).await?;
        match (result.rows_affected, current) {
            (_, None) => Err(AppError::not_found(SUBJECT_SHELTER)),
            (0, Some(shelter)) => {
                // Only the capacity guard can filter out an existing row
                let capacity = changes.capacity.unwrap_or(shelter.capacity);
                shelter.check_capacity_change(capacity)?;
                Err(AppError::conflict(format!(
                    "Shelter '{}' changed concurrently, retry the update",
                    shelter.name
                )))
            }
            (_, Some(shelter)) => Ok(shelter),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = ShelterEntity::delete_many()
            .filter(shelter::Column::Id.eq(id))
            .filter(shelter::Column::CurrentOccupancy.eq(0))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected > 0 {
            return Ok(true);
        }

        match queries::find_by_id(&self.db, id).await? {
            Some(shelter) => Err(AppError::conflict(format!(
                "Shelter '{}' still houses {} people",
                shelter.name, shelter.current_occupancy
            ))),
            None => Ok(false),
        }
    }
}

/// Connection-generic shelter statements.
pub(crate) mod queries {
    use sea_orm::sea_query::Expr;
    use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
    use uuid::Uuid;

    use crate::repository::entities::shelter::{self, Entity as ShelterEntity};
    use common::{AppError, AppResult};
    use domain::Shelter;

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<Shelter>> {
        let result = ShelterEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Shelter::from))
    }

    /// Take one bed if one is free; `false` when the shelter is full or missing
    pub async fn occupy<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<bool> {
        let result = ShelterEntity::update_many()
            .col_expr(
                shelter::Column::CurrentOccupancy,
                Expr::col(shelter::Column::CurrentOccupancy).add(1),
            )
            .filter(shelter::Column::Id.eq(id))
            .filter(
                Expr::col(shelter::Column::CurrentOccupancy)
                    .lt(Expr::col(shelter::Column::Capacity)),
            )
            .exec(db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected == 1)
    }

    /// Give one bed back; `false` when the counter was already zero
    pub async fn vacate<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<bool> {
        let result = ShelterEntity::update_many()
            .col_expr(
                shelter::Column::CurrentOccupancy,
                Expr::col(shelter::Column::CurrentOccupancy).sub(1),
            )
            .filter(shelter::Column::Id.eq(id))
            .filter(shelter::Column::CurrentOccupancy.gt(0))
            .exec(db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected == 1)
    }

    /// Overwrite the counter with a recounted value
    pub async fn set_occupancy<C: ConnectionTrait>(db: &C, id: Uuid, occupancy: i32) -> AppResult<()> {
        ShelterEntity::update_many()
            .col_expr(shelter::Column::CurrentOccupancy, Expr::value(occupancy))
            .filter(shelter::Column::Id.eq(id))
            .exec(db)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}
