//! Service container - one place to build and hand out every service.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::{
    CheckInService, OccupancyLedger, PersonRegistry, PersonService, ShelterDirectory,
    ShelterService,
};
use crate::infra::{Persistence, UnitOfWork};

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    /// Get the occupancy ledger
    fn check_ins(&self) -> Arc<dyn CheckInService>;

    /// Get shelter service
    fn shelters(&self) -> Arc<dyn ShelterService>;

    /// Get person service
    fn people(&self) -> Arc<dyn PersonService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    check_in_service: Arc<dyn CheckInService>,
    shelter_service: Arc<dyn ShelterService>,
    person_service: Arc<dyn PersonService>,
}

impl Services {
    /// Create a service container from already-built services
    pub fn new(
        check_in_service: Arc<dyn CheckInService>,
        shelter_service: Arc<dyn ShelterService>,
        person_service: Arc<dyn PersonService>,
    ) -> Self {
        Self {
            check_in_service,
            shelter_service,
            person_service,
        }
    }

    /// Wire every service onto one database connection pool
    pub fn from_connection(db: DatabaseConnection) -> Self {
        let uow = Arc::new(Persistence::new(db));
        let shelter_service = Arc::new(ShelterDirectory::new(uow.shelters()));
        let person_service = Arc::new(PersonRegistry::new(uow.people()));
        let check_in_service = Arc::new(OccupancyLedger::new(uow));

        Self::new(check_in_service, shelter_service, person_service)
    }
}

impl ServiceContainer for Services {
    fn check_ins(&self) -> Arc<dyn CheckInService> {
        self.check_in_service.clone()
    }

    fn shelters(&self) -> Arc<dyn ShelterService> {
        self.shelter_service.clone()
    }

    fn people(&self) -> Arc<dyn PersonService> {
        self.person_service.clone()
    }
}
