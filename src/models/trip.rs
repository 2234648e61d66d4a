//! Trip model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use crate::utils::helpers::{format_date, local_date};

text_enum! {
    pub enum TripStatus {
        Draft => "draft",
        Published => "published",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub departure_datetime: DateTime<Utc>,
    pub departure_location: String,
    pub departure_stop2_datetime: Option<DateTime<Utc>>,
    pub departure_stop2_location: Option<String>,
    pub return_datetime: DateTime<Utc>,
    pub return_location: String,
    pub return_stop2_datetime: Option<DateTime<Utc>>,
    pub return_stop2_location: Option<String>,
    pub bank_account_pln: Option<String>,
    pub bank_account_eur: Option<String>,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Human readable local date range, e.g. `14.02.2026 - 21.02.2026`
    pub fn date_range(&self, tz: Tz) -> String {
        format!(
            "{} - {}",
            format_date(local_date(self.departure_datetime, tz)),
            format_date(local_date(self.return_datetime, tz))
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripWithGroups {
    #[serde(flatten)]
    pub trip: Trip,
    pub group_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTripRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub departure_datetime: DateTime<Utc>,
    #[validate(length(min = 1, max = 200))]
    pub departure_location: String,
    pub departure_stop2_datetime: Option<DateTime<Utc>>,
    pub departure_stop2_location: Option<String>,
    pub return_datetime: DateTime<Utc>,
    #[validate(length(min = 1, max = 200))]
    pub return_location: String,
    pub return_stop2_datetime: Option<DateTime<Utc>>,
    pub return_stop2_location: Option<String>,
    pub bank_account_pln: Option<String>,
    pub bank_account_eur: Option<String>,
    pub status: Option<TripStatus>,
    #[serde(default)]
    pub group_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTripRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub departure_datetime: Option<DateTime<Utc>>,
    pub departure_location: Option<String>,
    pub departure_stop2_datetime: Option<DateTime<Utc>>,
    pub departure_stop2_location: Option<String>,
    pub return_datetime: Option<DateTime<Utc>>,
    pub return_location: Option<String>,
    pub return_stop2_datetime: Option<DateTime<Utc>>,
    pub return_stop2_location: Option<String>,
    /// Remove the departure second stop
    #[serde(default)]
    pub clear_departure_stop2: bool,
    /// Remove the return second stop
    #[serde(default)]
    pub clear_return_stop2: bool,
    pub bank_account_pln: Option<String>,
    pub bank_account_eur: Option<String>,
    pub status: Option<TripStatus>,
    pub group_ids: Option<Vec<Uuid>>,
}
