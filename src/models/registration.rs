//! Trip registration model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum ParticipationStatus {
        Unconfirmed => "unconfirmed",
        Confirmed => "confirmed",
        Declined => "declined",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripRegistration {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub participant_id: Uuid,
    pub registered_by: Option<Uuid>,
    pub participation_status: ParticipationStatus,
    pub is_outside_group: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration joined with participant and parent data for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub registration: TripRegistration,
    pub participant_first_name: String,
    pub participant_last_name: String,
    pub participant_birth_date: NaiveDate,
    pub parent_id: Uuid,
    pub parent_email: String,
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegistrationRequest {
    pub participant_id: Uuid,
    /// Admin-only override of the group eligibility rule
    #[serde(default)]
    pub outside_group: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateParticipationRequest {
    pub status: ParticipationStatus,
}
