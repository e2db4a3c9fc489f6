//! Person repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::check_in;
use super::entities::person::{self, ActiveModel, Entity as PersonEntity};
use super::unique_violation_as_conflict;
use common::{AppError, AppResult, OptionExt};
use domain::{NewPerson, Person, UpdatePerson, SUBJECT_PERSON};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Person repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// Find person by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Person>>;

    /// Find person by national ID
    async fn find_by_national_id(&self, national_id: &str) -> AppResult<Option<Person>>;

    /// Check if a person exists
    async fn exists(&self, id: Uuid) -> AppResult<bool>;

    /// List all people ordered by name
    async fn list(&self) -> AppResult<Vec<Person>>;

    /// Register a new person
    async fn create(&self, person: NewPerson) -> AppResult<Person>;

    /// Update profile fields
    async fn update(&self, id: Uuid, changes: UpdatePerson) -> AppResult<Person>;

    /// Delete a person without an active check-in; `Ok(false)` when missing
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Concrete implementation of PersonRepository
pub struct PersonStore {
    db: DatabaseConnection,
}

impl PersonStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PersonRepository for PersonStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Person>> {
        queries::find_by_id(&self.db, id).await
    }

    async fn find_by_national_id(&self, national_id: &str) -> AppResult<Option<Person>> {
        let result = PersonEntity::find()
            .filter(person::Column::NationalId.eq(national_id.trim()))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Person::from))
    }

    async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let count = PersonEntity::find()
            .filter(person::Column::Id.eq(id))
            .count(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(count > 0)
    }

    async fn list(&self) -> AppResult<Vec<Person>> {
        let models = PersonEntity::find()
            .order_by_asc(person::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Person::from).collect())
    }

    async fn create(&self, new: NewPerson) -> AppResult<Person> {
        let national_id = new.national_id.trim().to_string();
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name.trim().to_string()),
            national_id: Set(national_id.clone()),
            birth_date: Set(new.birth_date),
            medical_condition: Set(new.medical_condition),
            missing: Set(new.missing),
            emergency_contact: Set(new.emergency_contact),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            unique_violation_as_conflict(e, || {
                format!("A person with national ID '{}' is already registered", national_id)
            })
        })?;

        Ok(Person::from(model))
    }

    async fn update(&self, id: Uuid, changes: UpdatePerson) -> AppResult<Person> {
        let existing = PersonEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?
            .ok_or_not_found(SUBJECT_PERSON)?;

        let mut active: ActiveModel = existing.into();

        if let Some(name) = changes.name {
            active.name = Set(name.trim().to_string());
        }
        let national_id = changes.national_id.map(|n| n.trim().to_string());
        if let Some(ref national_id) = national_id {
            active.national_id = Set(national_id.clone());
        }
        if let Some(birth_date) = changes.birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(medical_condition) = changes.medical_condition {
            active.medical_condition = Set(Some(medical_condition));
        }
        if let Some(missing) = changes.missing {
            active.missing = Set(missing);
        }
        if let Some(emergency_contact) = changes.emergency_contact {
            active.emergency_contact = Set(Some(emergency_contact));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await.map_err(|e| {
            unique_violation_as_conflict(e, || {
                format!(
                    "A person with national ID '{}' is already registered",
                    national_id.clone().unwrap_or_default()
                )
            })
        })?;

        Ok(Person::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let housed = Query::select()
            .column(check_in::Column::PersonId)
            .from(check_in::Entity)
            .and_where(check_in::Column::ExitTime.is_null())
            .to_owned();

        let result = PersonEntity::delete_many()
            .filter(person::Column::Id.eq(id))
            .filter(person::Column::Id.not_in_subquery(housed))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected > 0 {
            return Ok(true);
        }

        match queries::find_by_id(&self.db, id).await? {
            Some(person) => Err(AppError::conflict(format!(
                "{} is still checked in and cannot be removed",
                person.name
            ))),
            None => Ok(false),
        }
    }
}

/// Connection-generic person statements.
pub(crate) mod queries {
    use sea_orm::{ConnectionTrait, EntityTrait};
    use uuid::Uuid;

    use crate::repository::entities::person::Entity as PersonEntity;
    use common::{AppError, AppResult};
    use domain::Person;

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<Person>> {
        let result = PersonEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Person::from))
    }
}
