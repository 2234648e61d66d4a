//! Data models module
//!
//! This module contains all data structures used throughout the application

/// Declares a string-backed enum stored in a TEXT column.
macro_rules! text_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::utils::errors::SkiClubError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::utils::errors::SkiClubError::Validation(
                        format!("Invalid {}: {}", stringify!($name), other)
                    )),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                text.parse::<$name>().map_err(|e| e.to_string().into())
            }
        }
    };
}

pub mod profile;
pub mod participant;
pub mod group;
pub mod trip;
pub mod payment;
pub mod registration;
pub mod contract;
pub mod notification;
pub mod import;

// Re-export commonly used models
pub use profile::{Profile, Role, UpdateProfileRequest, UpdateRoleRequest};
pub use participant::{Participant, ParticipantWithGroup, CreateParticipantRequest, UpdateParticipantRequest, AssignGroupRequest};
pub use group::{Group, CreateGroupRequest, UpdateGroupRequest};
pub use trip::{Trip, TripStatus, TripWithGroups, CreateTripRequest, UpdateTripRequest};
pub use payment::{
    Payment, PaymentStatus, PaymentTemplate, PaymentType, PaymentView, CreatePaymentTemplateRequest,
    RecordPaymentRequest, UpdatePaymentRequest, ManualStatus, PaymentFilter,
};
pub use registration::{TripRegistration, ParticipationStatus, RegistrationView, CreateRegistrationRequest, UpdateParticipationRequest};
pub use contract::{TripContract, TripContractTemplate, ContractView, UpsertContractTemplateRequest};
pub use notification::{Notification, NotificationLog, DeliveryStatus, TargetType, CreateNotificationRequest, NotificationDetails};
pub use import::{ImportChildRow, ImportTripRow, ImportStatus, ImportSummary};
