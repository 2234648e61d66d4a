//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod profile;
pub mod participant;
pub mod group;
pub mod trip;
pub mod registration;
pub mod payment;
pub mod contract;
pub mod notification;
pub mod import;
pub mod admin;

// Re-export repositories
pub use profile::ProfileRepository;
pub use participant::ParticipantRepository;
pub use group::GroupRepository;
pub use trip::TripRepository;
pub use registration::RegistrationRepository;
pub use payment::{PaymentRepository, NewPayment};
pub use contract::ContractRepository;
pub use notification::{NotificationRepository, RecipientRow};
pub use import::ImportRepository;
pub use admin::{AdminRepository, SystemStats};
