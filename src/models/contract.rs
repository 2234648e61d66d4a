//! Contract template and materialized contract models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripContractTemplate {
    pub trip_id: Uuid,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// Contract text as it was rendered for one participant.
///
/// `content` is never re-rendered after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripContract {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub participant_id: Uuid,
    pub registration_id: Uuid,
    pub content: String,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TripContract {
    pub fn is_accepted(&self) -> bool {
        self.accepted_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContractView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub contract: TripContract,
    pub trip_title: String,
    pub participant_name: String,
    pub parent_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertContractTemplateRequest {
    #[validate(length(min = 1))]
    pub content: String,
}
