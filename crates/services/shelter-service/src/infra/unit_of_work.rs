//! Unit of Work pattern implementation.
//!
//! Every ledger operation that touches both a check-in and a shelter counter
//! runs inside one [`UnitOfWork::transaction`]. The counter statements are
//! only reachable through a [`TransactionContext`], so nothing outside a
//! transaction can move occupancy.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait};
use uuid::Uuid;

use crate::repository::{
    check_in_queries, person_queries, shelter_queries, CheckInRepository, CheckInStore,
    PersonRepository, PersonStore, ShelterRepository, ShelterStore,
};
use common::{AppError, AppResult};
use domain::{CheckIn, Person, Shelter};

/// Boxed future returned by transaction closures
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly because of the generic transaction methods.
/// Service tests run against an in-memory SQLite database instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get shelter repository
    fn shelters(&self) -> Arc<dyn ShelterRepository>;

    /// Get person repository
    fn people(&self) -> Arc<dyn PersonRepository>;

    /// Get check-in repository
    fn check_ins(&self) -> Arc<dyn CheckInRepository>;

    /// Execute a closure within a transaction.
    ///
    /// Commits on success, rolls back on error. Uses ReadCommitted; counter
    /// updates carry their own guards.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;

    /// Execute a closure within a serializable transaction.
    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;
}

/// Repository access bound to one open transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Get shelter repository for this transaction
    pub fn shelters(&self) -> TxShelterRepository<'_> {
        TxShelterRepository { txn: self.txn }
    }

    /// Get person repository for this transaction
    pub fn people(&self) -> TxPersonRepository<'_> {
        TxPersonRepository { txn: self.txn }
    }

    /// Get check-in repository for this transaction
    pub fn check_ins(&self) -> TxCheckInRepository<'_> {
        TxCheckInRepository { txn: self.txn }
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    shelter_repo: Arc<ShelterStore>,
    person_repo: Arc<PersonStore>,
    check_in_repo: Arc<CheckInStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            shelter_repo: Arc::new(ShelterStore::new(db.clone())),
            person_repo: Arc::new(PersonStore::new(db.clone())),
            check_in_repo: Arc::new(CheckInStore::new(db.clone())),
            db,
        }
    }

    async fn execute_transaction<F, T>(&self, isolation: IsolationLevel, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
            .await
            .map_err(AppError::from)?;

        let ctx = TransactionContext::new(&txn);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn shelters(&self) -> Arc<dyn ShelterRepository> {
        self.shelter_repo.clone()
    }

    fn people(&self) -> Arc<dyn PersonRepository> {
        self.person_repo.clone()
    }

    fn check_ins(&self) -> Arc<dyn CheckInRepository> {
        self.check_in_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::ReadCommitted, f).await
    }

    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::Serializable, f).await
    }
}

/// Transaction-aware shelter repository.
pub struct TxShelterRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl TxShelterRepository<'_> {
    /// Find shelter by ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Shelter>> {
        shelter_queries::find_by_id(self.txn, id).await
    }

    /// Take one bed; `false` when the shelter is full
    pub(crate) async fn occupy(&self, id: Uuid) -> AppResult<bool> {
        shelter_queries::occupy(self.txn, id).await
    }

    /// Give one bed back; `false` when the counter was already zero
    pub(crate) async fn vacate(&self, id: Uuid) -> AppResult<bool> {
        shelter_queries::vacate(self.txn, id).await
    }

    pub(crate) async fn set_occupancy(&self, id: Uuid, occupancy: i32) -> AppResult<()> {
        shelter_queries::set_occupancy(self.txn, id, occupancy).await
    }
}

/// Transaction-aware person repository.
pub struct TxPersonRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl TxPersonRepository<'_> {
    /// Find person by ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Person>> {
        person_queries::find_by_id(self.txn, id).await
    }
}

/// Transaction-aware check-in repository.
pub struct TxCheckInRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl TxCheckInRepository<'_> {
    /// Find check-in by ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CheckIn>> {
        check_in_queries::find_by_id(self.txn, id).await
    }

    /// Find the person's active check-in
    pub async fn find_active_for_person(&self, person_id: Uuid) -> AppResult<Option<CheckIn>> {
        check_in_queries::find_active_for_person(self.txn, person_id, None).await
    }

    /// Find an active check-in for the person other than `id`
    pub async fn find_other_active_for_person(
        &self,
        person_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<CheckIn>> {
        check_in_queries::find_active_for_person(self.txn, person_id, Some(id)).await
    }

    /// Count active check-ins at a shelter
    pub async fn count_active_for_shelter(&self, shelter_id: Uuid) -> AppResult<i32> {
        check_in_queries::count_active_for_shelter(self.txn, shelter_id).await
    }

    pub(crate) async fn insert(&self, record: &CheckIn) -> AppResult<CheckIn> {
        check_in_queries::insert(self.txn, record).await
    }

    pub(crate) async fn update(&self, previous: &CheckIn, next: &CheckIn) -> AppResult<CheckIn> {
        check_in_queries::update(self.txn, previous, next).await
    }

    /// Delete the record; the deleted row in its final state, `None` when missing
    pub(crate) async fn delete(&self, record: &CheckIn) -> AppResult<Option<CheckIn>> {
        check_in_queries::delete(self.txn, record).await
    }
}

/// Run a block inside [`UnitOfWork::transaction`].
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Database;
    use chrono::Utc;
    use common::{DatabaseConfig, ErrorKind};
    use domain::{NewPerson, NewShelter};

    async fn setup(capacity: i32) -> (Persistence, Shelter, Person) {
        let db = Database::connect(&DatabaseConfig::sqlite_memory())
            .await
            .unwrap();
        let uow = Persistence::new(db.get_connection());

        let shelter = uow
            .shelters()
            .create(NewShelter {
                name: "Ginasio Central".to_string(),
                capacity,
                address_id: None,
            })
            .await
            .unwrap();
        let person = uow
            .people()
            .create(NewPerson {
                name: "Rita Alves".to_string(),
                national_id: "321".to_string(),
                birth_date: None,
                medical_condition: None,
                missing: false,
                emergency_contact: None,
            })
            .await
            .unwrap();

        (uow, shelter, person)
    }

    async fn admit(uow: &Persistence, shelter_id: Uuid, person_id: Uuid) -> CheckIn {
        uow.transaction(move |ctx| {
            Box::pin(async move {
                assert!(ctx.shelters().occupy(shelter_id).await?);
                ctx.check_ins()
                    .insert(&CheckIn::open(shelter_id, person_id, None))
                    .await
            })
        })
        .await
        .unwrap()
    }

    fn closed(record: &CheckIn) -> CheckIn {
        CheckIn {
            exit_time: Some(Utc::now()),
            ..record.clone()
        }
    }

    #[tokio::test]
    async fn second_active_insert_hits_unique_index() {
        let (uow, shelter, person) = setup(5).await;
        let (shelter_id, person_id) = (shelter.id, person.id);

        let err = uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    ctx.check_ins()
                        .insert(&CheckIn::open(shelter_id, person_id, None))
                        .await?;
                    ctx.check_ins()
                        .insert(&CheckIn::open(shelter_id, person_id, None))
                        .await
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Person already has an active check-in");
        assert!(uow
            .check_ins()
            .find_active_for_person(person_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn occupy_stops_at_capacity() {
        let (uow, shelter, _) = setup(1).await;
        let id = shelter.id;

        let claims = uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let first = ctx.shelters().occupy(id).await?;
                    let second = ctx.shelters().occupy(id).await?;
                    Ok((first, second))
                })
            })
            .await
            .unwrap();

        assert_eq!(claims, (true, false));
        let after = uow.shelters().find_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.current_occupancy, 1);
    }

    #[tokio::test]
    async fn update_from_stale_read_is_retryable() {
        let (uow, shelter, person) = setup(2).await;
        let stale = admit(&uow, shelter.id, person.id).await;

        let first = stale.clone();
        uow.transaction(move |ctx| {
            Box::pin(async move { ctx.check_ins().update(&first, &closed(&first)).await })
        })
        .await
        .unwrap();

        let err = uow
            .transaction(move |ctx| {
                Box::pin(async move { ctx.check_ins().update(&stale, &closed(&stale)).await })
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(err.to_string().contains("retry"));
    }

    #[tokio::test]
    async fn delete_from_stale_read_removes_current_row() {
        let (uow, shelter, person) = setup(2).await;
        let stale = admit(&uow, shelter.id, person.id).await;
        let id = stale.id;

        let first = stale.clone();
        uow.transaction(move |ctx| {
            Box::pin(async move { ctx.check_ins().update(&first, &closed(&first)).await })
        })
        .await
        .unwrap();

        let removed = uow
            .transaction(move |ctx| Box::pin(async move { ctx.check_ins().delete(&stale).await }))
            .await
            .unwrap()
            .expect("row still existed");

        assert_eq!(removed.id, id);
        assert!(!removed.is_active());
        assert!(uow.check_ins().find_by_id(id).await.unwrap().is_none());

        let again = uow
            .transaction(move |ctx| Box::pin(async move { ctx.check_ins().delete(&removed).await }))
            .await
            .unwrap();
        assert!(again.is_none());
    }
}
