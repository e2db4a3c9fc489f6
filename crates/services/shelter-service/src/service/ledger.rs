//! Occupancy ledger - the check-in lifecycle.
//!
//! Keeps two facts true after every committed operation:
//! a shelter's `current_occupancy` equals its number of active check-ins,
//! and a person holds at most one active check-in anywhere.
//!
//! Each write runs in a single unit-of-work transaction. Counter moves are
//! guarded updates, so a full shelter or a racing writer turns into a
//! rollback instead of a broken counter.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{
    CheckIn, CheckInDetails, NewCheckIn, OccupancyPlan, OccupancyReport, Person, UpdateCheckIn,
    SUBJECT_CHECK_IN, SUBJECT_PERSON, SUBJECT_SHELTER,
};

use crate::infra::{TransactionContext, UnitOfWork};
use crate::with_transaction;

/// Check-in service trait for dependency injection.
#[async_trait]
pub trait CheckInService: Send + Sync {
    /// Check a person into a shelter
    async fn create_check_in(&self, check_in: NewCheckIn) -> AppResult<CheckInDetails>;

    /// Move, close, reopen or re-time a check-in
    async fn update_check_in(&self, id: Uuid, changes: UpdateCheckIn) -> AppResult<CheckInDetails>;

    /// Delete a check-in; `Ok(false)` when it does not exist
    async fn delete_check_in(&self, id: Uuid) -> AppResult<bool>;

    /// The person's active check-in, if any
    async fn get_active_check_in_for_person(&self, person_id: Uuid) -> AppResult<Option<CheckIn>>;

    /// Get a check-in with its shelter and person
    async fn get_check_in(&self, id: Uuid) -> AppResult<CheckInDetails>;

    /// List a shelter's check-ins, newest first
    async fn list_check_ins(&self, shelter_id: Uuid, active_only: bool) -> AppResult<Vec<CheckIn>>;

    /// List a person's placement history, newest first
    async fn list_check_ins_for_person(&self, person_id: Uuid) -> AppResult<Vec<CheckIn>>;

    /// Recount a shelter's active check-ins and reset its counter
    async fn reconcile_occupancy(&self, shelter_id: Uuid) -> AppResult<OccupancyReport>;
}

/// Concrete implementation of CheckInService using Unit of Work.
pub struct OccupancyLedger<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> OccupancyLedger<U> {
    /// Create new ledger instance with Unit of Work
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

/// Reject when the person already holds an active check-in other than `excluding`.
///
/// The message names the shelter the person is checked into.
async fn ensure_not_checked_in(
    ctx: &TransactionContext<'_>,
    person: &Person,
    excluding: Option<Uuid>,
) -> AppResult<()> {
    let existing = match excluding {
        Some(id) => ctx.check_ins().find_other_active_for_person(person.id, id).await?,
        None => ctx.check_ins().find_active_for_person(person.id).await?,
    };
    let Some(existing) = existing else {
        return Ok(());
    };

    let place = match ctx.shelters().find_by_id(existing.shelter_id).await? {
        Some(shelter) => format!("'{}' ({})", shelter.name, shelter.id),
        None => existing.shelter_id.to_string(),
    };
    Err(AppError::conflict(format!(
        "{} is already checked in at shelter {}",
        person.name, place
    )))
}

/// Apply a plan's counter moves, releasing before claiming.
async fn apply_plan(ctx: &TransactionContext<'_>, plan: OccupancyPlan) -> AppResult<()> {
    if let Some(shelter_id) = plan.release {
        if !ctx.shelters().vacate(shelter_id).await? {
            tracing::warn!(%shelter_id, "Occupancy already at zero, release skipped");
        }
    }

    if let Some(shelter_id) = plan.claim {
        if !ctx.shelters().occupy(shelter_id).await? {
            let shelter = ctx
                .shelters()
                .find_by_id(shelter_id)
                .await?
                .ok_or_not_found(SUBJECT_SHELTER)?;
            return Err(AppError::from(shelter.at_capacity()));
        }
    }

    Ok(())
}

/// Load a record's shelter and person inside the transaction.
async fn details(ctx: &TransactionContext<'_>, check_in: CheckIn) -> AppResult<CheckInDetails> {
    let shelter = ctx
        .shelters()
        .find_by_id(check_in.shelter_id)
        .await?
        .ok_or_not_found(SUBJECT_SHELTER)?;
    let person = ctx
        .people()
        .find_by_id(check_in.person_id)
        .await?
        .ok_or_not_found(SUBJECT_PERSON)?;
    Ok(CheckInDetails::new(check_in, shelter, person))
}

#[async_trait]
impl<U: UnitOfWork> CheckInService for OccupancyLedger<U> {
    async fn create_check_in(&self, check_in: NewCheckIn) -> AppResult<CheckInDetails> {
        let NewCheckIn {
            shelter_id,
            person_id,
            entry_time,
        } = check_in;

        let created = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let shelter = ctx
                        .shelters()
                        .find_by_id(shelter_id)
                        .await?
                        .ok_or_not_found(SUBJECT_SHELTER)?;
                    let person = ctx
                        .people()
                        .find_by_id(person_id)
                        .await?
                        .ok_or_not_found(SUBJECT_PERSON)?;
                    ensure_not_checked_in(&ctx, &person, None).await?;
                    if !shelter.has_vacancy() {
                        return Err(AppError::from(shelter.at_capacity()));
                    }

                    apply_plan(&ctx, OccupancyPlan::admit(shelter_id)).await?;
                    let record = ctx
                        .check_ins()
                        .insert(&CheckIn::open(shelter_id, person_id, entry_time))
                        .await?;

                    details(&ctx, record).await
                })
            })
            .await?;

        tracing::info!(
            check_in_id = %created.check_in.id,
            %shelter_id,
            %person_id,
            occupancy = created.shelter.current_occupancy,
            capacity = created.shelter.capacity,
            "Check-in created"
        );
        Ok(created)
    }

    async fn update_check_in(&self, id: Uuid, changes: UpdateCheckIn) -> AppResult<CheckInDetails> {
        let updated = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let current = ctx
                        .check_ins()
                        .find_by_id(id)
                        .await?
                        .ok_or_not_found(SUBJECT_CHECK_IN)?;
                    if changes.shelter_id != current.shelter_id {
                        ctx.shelters()
                            .find_by_id(changes.shelter_id)
                            .await?
                            .ok_or_not_found(SUBJECT_SHELTER)?;
                    }
                    let next = current.revised(&changes)?;

                    let (from, to) = (current.placement(), next.placement());
                    if OccupancyPlan::reactivates(from, to) {
                        let person = ctx
                            .people()
                            .find_by_id(current.person_id)
                            .await?
                            .ok_or_not_found(SUBJECT_PERSON)?;
                        ensure_not_checked_in(&ctx, &person, Some(current.id)).await?;
                    }

                    apply_plan(&ctx, OccupancyPlan::between(from, to)).await?;
                    let record = ctx.check_ins().update(&current, &next).await?;

                    details(&ctx, record).await
                })
            })
            .await?;

        tracing::info!(
            check_in_id = %id,
            shelter_id = %updated.shelter.id,
            state = %updated.state,
            occupancy = updated.shelter.current_occupancy,
            "Check-in updated"
        );
        Ok(updated)
    }

    async fn delete_check_in(&self, id: Uuid) -> AppResult<bool> {
        let deleted = with_transaction!(self.uow, |ctx| {
            let Some(current) = ctx.check_ins().find_by_id(id).await? else {
                return Ok(false);
            };
            let Some(removed) = ctx.check_ins().delete(&current).await? else {
                return Ok(false);
            };
            apply_plan(&ctx, OccupancyPlan::discharge(removed.placement())).await?;
            Ok(true)
        })?;

        if deleted {
            tracing::info!(check_in_id = %id, "Check-in deleted");
        } else {
            tracing::debug!(check_in_id = %id, "Check-in to delete not found");
        }
        Ok(deleted)
    }

    async fn get_active_check_in_for_person(&self, person_id: Uuid) -> AppResult<Option<CheckIn>> {
        self.uow.check_ins().find_active_for_person(person_id).await
    }

    async fn get_check_in(&self, id: Uuid) -> AppResult<CheckInDetails> {
        let check_in = self
            .uow
            .check_ins()
            .find_by_id(id)
            .await?
            .ok_or_not_found(SUBJECT_CHECK_IN)?;
        let (shelters, people) = (self.uow.shelters(), self.uow.people());
        let (shelter, person) = tokio::try_join!(
            shelters.find_by_id(check_in.shelter_id),
            people.find_by_id(check_in.person_id),
        )?;
        let shelter = shelter.ok_or_not_found(SUBJECT_SHELTER)?;
        let person = person.ok_or_not_found(SUBJECT_PERSON)?;

        Ok(CheckInDetails::new(check_in, shelter, person))
    }

    async fn list_check_ins(&self, shelter_id: Uuid, active_only: bool) -> AppResult<Vec<CheckIn>> {
        self.uow
            .shelters()
            .find_by_id(shelter_id)
            .await?
            .ok_or_not_found(SUBJECT_SHELTER)?;

        self.uow
            .check_ins()
            .list_for_shelter(shelter_id, active_only)
            .await
    }

    async fn list_check_ins_for_person(&self, person_id: Uuid) -> AppResult<Vec<CheckIn>> {
        if !self.uow.people().exists(person_id).await? {
            return Err(AppError::not_found(SUBJECT_PERSON));
        }

        self.uow.check_ins().list_for_person(person_id).await
    }

    async fn reconcile_occupancy(&self, shelter_id: Uuid) -> AppResult<OccupancyReport> {
        let report = self
            .uow
            .transaction_serializable(move |ctx| {
                Box::pin(async move {
                    let shelter = ctx
                        .shelters()
                        .find_by_id(shelter_id)
                        .await?
                        .ok_or_not_found(SUBJECT_SHELTER)?;
                    let actual = ctx.check_ins().count_active_for_shelter(shelter_id).await?;

                    let report = OccupancyReport {
                        shelter_id,
                        recorded: shelter.current_occupancy,
                        actual,
                        capacity: shelter.capacity,
                    };
                    if report.drifted() {
                        ctx.shelters().set_occupancy(shelter_id, actual).await?;
                    }
                    Ok(report)
                })
            })
            .await?;

        if report.drifted() {
            tracing::warn!(
                %shelter_id,
                recorded = report.recorded,
                actual = report.actual,
                "Occupancy counter drifted, reset to active check-in count"
            );
        }
        if report.actual > report.capacity {
            tracing::warn!(
                %shelter_id,
                actual = report.actual,
                capacity = report.capacity,
                "Shelter holds more active check-ins than its capacity"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{Database, Persistence, TxFuture};
    use crate::repository::{
        CheckInRepository, MockCheckInRepository, MockPersonRepository, MockShelterRepository,
        PersonRepository, ShelterRepository,
    };
    use chrono::Utc;
    use common::{DatabaseConfig, ErrorKind};
    use domain::{NewShelter, Person, Shelter};
    use mockall::predicate::eq;

    /// Unit of work over mock repositories; transactions are refused
    struct TestUnitOfWork {
        shelters: Arc<MockShelterRepository>,
        people: Arc<MockPersonRepository>,
        check_ins: Arc<MockCheckInRepository>,
    }

    impl TestUnitOfWork {
        fn new(
            shelters: MockShelterRepository,
            people: MockPersonRepository,
            check_ins: MockCheckInRepository,
        ) -> Self {
            Self {
                shelters: Arc::new(shelters),
                people: Arc::new(people),
                check_ins: Arc::new(check_ins),
            }
        }
    }

    #[async_trait]
    impl UnitOfWork for TestUnitOfWork {
        fn shelters(&self) -> Arc<dyn ShelterRepository> {
            self.shelters.clone()
        }

        fn people(&self) -> Arc<dyn PersonRepository> {
            self.people.clone()
        }

        fn check_ins(&self) -> Arc<dyn CheckInRepository> {
            self.check_ins.clone()
        }

        async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
        where
            F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
            T: Send,
        {
            Err(AppError::internal("Transactions not supported in test mock"))
        }

        async fn transaction_serializable<F, T>(&self, _f: F) -> AppResult<T>
        where
            F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
            T: Send,
        {
            Err(AppError::internal("Transactions not supported in test mock"))
        }
    }

    fn person(id: Uuid) -> Person {
        let now = Utc::now();
        Person {
            id,
            name: "Joana Lima".to_string(),
            national_id: "042".to_string(),
            birth_date: None,
            medical_condition: None,
            missing: false,
            emergency_contact: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn active_check_in_comes_from_repository() {
        let person_id = Uuid::new_v4();
        let record = CheckIn::open(Uuid::new_v4(), person_id, None);
        let expected = record.clone();

        let mut check_ins = MockCheckInRepository::new();
        check_ins
            .expect_find_active_for_person()
            .with(eq(person_id))
            .returning(move |_| Ok(Some(record.clone())));

        let uow = TestUnitOfWork::new(
            MockShelterRepository::new(),
            MockPersonRepository::new(),
            check_ins,
        );
        let ledger = OccupancyLedger::new(Arc::new(uow));

        let found = ledger.get_active_check_in_for_person(person_id).await.unwrap();
        assert_eq!(found, Some(expected));
    }

    #[tokio::test]
    async fn listing_for_unknown_shelter_is_not_found() {
        let mut shelters = MockShelterRepository::new();
        shelters.expect_find_by_id().returning(|_| Ok(None));
        let mut check_ins = MockCheckInRepository::new();
        check_ins.expect_list_for_shelter().never();

        let uow = TestUnitOfWork::new(shelters, MockPersonRepository::new(), check_ins);
        let ledger = OccupancyLedger::new(Arc::new(uow));

        let err = ledger.list_check_ins(Uuid::new_v4(), true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn history_for_unknown_person_is_not_found() {
        let mut people = MockPersonRepository::new();
        people.expect_exists().returning(|_| Ok(false));

        let uow = TestUnitOfWork::new(
            MockShelterRepository::new(),
            people,
            MockCheckInRepository::new(),
        );
        let ledger = OccupancyLedger::new(Arc::new(uow));

        let err = ledger
            .list_check_ins_for_person(Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn get_check_in_joins_shelter_and_person() {
        let shelter = Shelter::new(Uuid::new_v4(), "Escola Municipal".to_string(), 40, None);
        let person_id = Uuid::new_v4();
        let record = CheckIn::open(shelter.id, person_id, None);
        let record_id = record.id;

        let mut check_ins = MockCheckInRepository::new();
        check_ins
            .expect_find_by_id()
            .with(eq(record_id))
            .returning(move |_| Ok(Some(record.clone())));
        let mut shelters = MockShelterRepository::new();
        let found = shelter.clone();
        shelters
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        let mut people = MockPersonRepository::new();
        people
            .expect_find_by_id()
            .returning(|id| Ok(Some(person(id))));

        let uow = TestUnitOfWork::new(shelters, people, check_ins);
        let ledger = OccupancyLedger::new(Arc::new(uow));

        let details = ledger.get_check_in(record_id).await.unwrap();
        assert_eq!(details.shelter.name, "Escola Municipal");
        assert_eq!(details.person.id, person_id);
        assert_eq!(details.state, domain::CheckInState::Active);
    }

    #[tokio::test]
    async fn storage_failure_surfaces_as_infrastructure() {
        let uow = TestUnitOfWork::new(
            MockShelterRepository::new(),
            MockPersonRepository::new(),
            MockCheckInRepository::new(),
        );
        let ledger = OccupancyLedger::new(Arc::new(uow));

        let err = ledger
            .delete_check_in(Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }

    #[tokio::test]
    async fn lost_claim_rolls_back_as_capacity_conflict() {
        let db = Database::connect(&DatabaseConfig::sqlite_memory())
            .await
            .unwrap();
        let uow = Persistence::new(db.get_connection());
        let shelter = uow
            .shelters()
            .create(NewShelter {
                name: "Ginasio Norte".to_string(),
                capacity: 1,
                address_id: None,
            })
            .await
            .unwrap();
        let id = shelter.id;

        // Another writer takes the last bed after the vacancy check
        let err = uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    ctx.shelters().set_occupancy(id, 1).await?;
                    apply_plan(&ctx, OccupancyPlan::admit(id)).await
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("Ginasio Norte"));
        let after = uow.shelters().find_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.current_occupancy, 0);
    }
}
