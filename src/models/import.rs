//! Staged legacy import rows

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Row status as written by the legacy spreadsheet tooling
    pub enum ImportStatus {
        Pending => "oczekuje",
        Imported => "zaimportowano",
        Error => "blad",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImportChildRow {
    pub id: Uuid,
    pub parent_email: Option<String>,
    pub parent_first_name: Option<String>,
    pub parent_last_name: Option<String>,
    pub parent_phone: Option<String>,
    pub child_first_name: Option<String>,
    pub child_last_name: Option<String>,
    pub child_birth_date: Option<String>,
    pub group_name: Option<String>,
    pub status: ImportStatus,
    pub error_message: Option<String>,
    pub imported_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImportTripRow {
    pub id: Uuid,
    pub title: Option<String>,
    pub departure_date: Option<String>,
    pub departure_time: Option<String>,
    pub departure_location: Option<String>,
    pub return_date: Option<String>,
    pub return_time: Option<String>,
    pub return_location: Option<String>,
    pub group_names: Option<String>,
    pub status: ImportStatus,
    pub error_message: Option<String>,
    pub imported_at: Option<DateTime<Utc>>,
}

/// Counts reported back to the admin after an import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub processed: usize,
    pub imported: usize,
    pub failed: usize,
    pub skipped: usize,
}
