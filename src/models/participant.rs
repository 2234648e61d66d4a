//! Participant model (a child registered by a parent)

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

/// Free-form key/value pairs attached to a participant
pub type CustomFields = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub notes: Option<String>,
    pub custom_fields: Json<CustomFields>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Participant row joined with its (optional) group
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParticipantWithGroup {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub participant: Participant,
    pub group_id: Option<Uuid>,
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateParticipantRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub birth_date: NaiveDate,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default)]
    pub custom_fields: CustomFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateParticipantRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub custom_fields: Option<CustomFields>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignGroupRequest {
    /// `None` removes the participant from any group
    pub group_id: Option<Uuid>,
}
