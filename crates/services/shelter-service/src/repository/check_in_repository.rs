//! Check-in repository implementation.
//!
//! Read-only outside a transaction. Every write to `check_ins` moves a shelter
//! counter too, so inserts, updates and deletes are only exposed through
//! [`queries`] for the unit of work.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::entities::check_in::{self, Entity as CheckInEntity};
use common::{AppError, AppResult};
use domain::CheckIn;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Check-in repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CheckInRepository: Send + Sync {
    /// Find check-in by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CheckIn>>;

    /// Find the person's active check-in, newest entry first
    async fn find_active_for_person(&self, person_id: Uuid) -> AppResult<Option<CheckIn>>;

    /// List a shelter's check-ins, newest entry first
    async fn list_for_shelter(&self, shelter_id: Uuid, active_only: bool) -> AppResult<Vec<CheckIn>>;

    /// List a person's check-in history, newest entry first
    async fn list_for_person(&self, person_id: Uuid) -> AppResult<Vec<CheckIn>>;

    /// Count active check-ins at a shelter
    async fn count_active_for_shelter(&self, shelter_id: Uuid) -> AppResult<i32>;
}

/// Concrete implementation of CheckInRepository
pub struct CheckInStore {
    db: DatabaseConnection,
}

impl CheckInStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CheckInRepository for CheckInStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CheckIn>> {
        queries::find_by_id(&self.db, id).await
    }

    async fn find_active_for_person(&self, person_id: Uuid) -> AppResult<Option<CheckIn>> {
        queries::find_active_for_person(&self.db, person_id, None).await
    }

    async fn list_for_shelter(&self, shelter_id: Uuid, active_only: bool) -> AppResult<Vec<CheckIn>> {
        let mut query = CheckInEntity::find().filter(check_in::Column::ShelterId.eq(shelter_id));
        if active_only {
            query = query.filter(check_in::Column::ExitTime.is_null());
        }

        let models = query
            .order_by_desc(check_in::Column::EntryTime)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(CheckIn::from).collect())
    }

    async fn list_for_person(&self, person_id: Uuid) -> AppResult<Vec<CheckIn>> {
        let models = CheckInEntity::find()
            .filter(check_in::Column::PersonId.eq(person_id))
            .order_by_desc(check_in::Column::EntryTime)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(CheckIn::from).collect())
    }

    async fn count_active_for_shelter(&self, shelter_id: Uuid) -> AppResult<i32> {
        queries::count_active_for_shelter(&self.db, shelter_id).await
    }
}

/// Connection-generic check-in statements.
pub(crate) mod queries {
    use sea_orm::sea_query::Expr;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
        QueryOrder,
    };
    use uuid::Uuid;

    use crate::repository::entities::check_in::{self, ActiveModel, Entity as CheckInEntity};
    use crate::repository::unique_violation_as_conflict;
    use common::{AppError, AppResult};
    use domain::CheckIn;

    const ALREADY_ACTIVE: &str = "Person already has an active check-in";
    const DELETE_ATTEMPTS: usize = 3;

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<CheckIn>> {
        let result = CheckInEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(CheckIn::from))
    }

    /// Active check-in for the person, ignoring the record `excluding` if given
    pub async fn find_active_for_person<C: ConnectionTrait>(
        db: &C,
        person_id: Uuid,
        excluding: Option<Uuid>,
    ) -> AppResult<Option<CheckIn>> {
        let mut query = CheckInEntity::find()
            .filter(check_in::Column::PersonId.eq(person_id))
            .filter(check_in::Column::ExitTime.is_null());
        if let Some(id) = excluding {
            query = query.filter(check_in::Column::Id.ne(id));
        }

        let result = query
            .order_by_desc(check_in::Column::EntryTime)
            .one(db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(CheckIn::from))
    }

    pub async fn count_active_for_shelter<C: ConnectionTrait>(
        db: &C,
        shelter_id: Uuid,
    ) -> AppResult<i32> {
        let count = CheckInEntity::find()
            .filter(check_in::Column::ShelterId.eq(shelter_id))
            .filter(check_in::Column::ExitTime.is_null())
            .count(db)
            .await
            .map_err(AppError::from)?;

        i32::try_from(count).map_err(|_| AppError::internal("Active check-in count overflow"))
    }

    /// Insert a record; a second active record for the person is a conflict
    pub async fn insert<C: ConnectionTrait>(db: &C, record: &CheckIn) -> AppResult<CheckIn> {
        let model = ActiveModel::from(record)
            .insert(db)
            .await
            .map_err(|e| unique_violation_as_conflict(e, || ALREADY_ACTIVE.to_string()))?;

        Ok(CheckIn::from(model))
    }

    /// Replace `previous` with `next`.
    ///
    /// The write only lands if the row still has the shelter and state that
    /// `previous` was read with, so two racing updates cannot both move a counter.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        previous: &CheckIn,
        next: &CheckIn,
    ) -> AppResult<CheckIn> {
        let mut query = CheckInEntity::update_many()
            .col_expr(check_in::Column::ShelterId, Expr::value(next.shelter_id))
            .col_expr(check_in::Column::EntryTime, Expr::value(next.entry_time))
            .col_expr(check_in::Column::ExitTime, Expr::value(next.exit_time))
            .filter(check_in::Column::Id.eq(previous.id))
            .filter(check_in::Column::ShelterId.eq(previous.shelter_id));
        query = if previous.is_active() {
            query.filter(check_in::Column::ExitTime.is_null())
        } else {
            query.filter(check_in::Column::ExitTime.is_not_null())
        };

        let result = query
            .exec(db)
            .await
            .map_err(|e| unique_violation_as_conflict(e, || ALREADY_ACTIVE.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::concurrency(
                "Check-in changed concurrently, retry the update",
            ));
        }

        Ok(next.clone())
    }

    /// Delete `record`, following it if another writer changed it first.
    ///
    /// Returns the row as it was when deleted, so the caller releases the
    /// bed that row actually held. `Ok(None)` when the row is gone.
    pub async fn delete<C: ConnectionTrait>(db: &C, record: &CheckIn) -> AppResult<Option<CheckIn>> {
        let mut current = record.clone();
        for _ in 0..DELETE_ATTEMPTS {
            if delete_as_read(db, &current).await? {
                return Ok(Some(current));
            }
            match find_by_id(db, current.id).await? {
                Some(fresh) => current = fresh,
                None => return Ok(None),
            }
        }

        Err(AppError::concurrency(
            "Check-in kept changing during delete, retry the delete",
        ))
    }

    /// Delete only if the row still has the shelter and state it was read with.
    async fn delete_as_read<C: ConnectionTrait>(db: &C, record: &CheckIn) -> AppResult<bool> {
        let mut query = CheckInEntity::delete_many()
            .filter(check_in::Column::Id.eq(record.id))
            .filter(check_in::Column::ShelterId.eq(record.shelter_id));
        query = if record.is_active() {
            query.filter(check_in::Column::ExitTime.is_null())
        } else {
            query.filter(check_in::Column::ExitTime.is_not_null())
        };

        let result = query.exec(db).await.map_err(AppError::from)?;
        Ok(result.rows_affected > 0)
    }
}
