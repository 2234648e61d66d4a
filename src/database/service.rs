//! Database service layer
//!
//! Bundles the repositories so services and handlers share one handle.

use crate::database::DatabasePool;
use crate::database::repositories::{
    AdminRepository, ContractRepository, GroupRepository, ImportRepository, NotificationRepository,
    ParticipantRepository, PaymentRepository, ProfileRepository, RegistrationRepository, TripRepository,
};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub pool: DatabasePool,
    pub profiles: ProfileRepository,
    pub participants: ParticipantRepository,
    pub groups: GroupRepository,
    pub trips: TripRepository,
    pub registrations: RegistrationRepository,
    pub payments: PaymentRepository,
    pub contracts: ContractRepository,
    pub notifications: NotificationRepository,
    pub imports: ImportRepository,
    pub admin: AdminRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            groups: GroupRepository::new(pool.clone()),
            trips: TripRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            contracts: ContractRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            imports: ImportRepository::new(pool.clone()),
            admin: AdminRepository::new(pool.clone()),
            pool,
        }
    }

    /// Get system statistics
    pub async fn get_system_stats(&self) -> crate::utils::errors::Result<crate::database::repositories::SystemStats> {
        self.admin.get_stats().await
    }
}
