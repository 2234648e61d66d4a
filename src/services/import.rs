//! Legacy data import
//!
//! Rows staged in `import_children` / `import_trips` are processed one by one.
//! Each row either lands (`zaimportowano`) or is marked `blad` with the reason;
//! a failed row never rolls back another. Rows already imported are skipped,
//! so a run can be repeated safely.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{
    CreateGroupRequest, CreateParticipantRequest, CreateTripRequest, ImportChildRow, ImportStatus,
    ImportSummary, ImportTripRow, Role, TripStatus, UpdateTripRequest,
};
use crate::utils::errors::Result;
use crate::utils::helpers::{
    is_valid_email, local_to_utc, normalize_email, normalize_whitespace, parse_flexible_date, parse_flexible_time,
};
use crate::utils::logging::log_import_row;

/// A validated child row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRecord {
    pub parent_email: String,
    pub parent_first_name: String,
    pub parent_last_name: String,
    pub parent_phone: Option<String>,
    pub child_first_name: String,
    pub child_last_name: String,
    pub child_birth_date: NaiveDate,
    pub group_name: Option<String>,
}

/// A validated trip row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRecord {
    pub title: String,
    pub departure_datetime: DateTime<Utc>,
    pub departure_location: String,
    pub return_datetime: DateTime<Utc>,
    pub return_location: String,
    pub group_names: Vec<String>,
}

fn text(value: &Option<String>) -> Option<String> {
    value.as_deref().map(normalize_whitespace).filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, field: &str) -> std::result::Result<String, String> {
    text(value).ok_or_else(|| format!("missing {field}"))
}

fn date_field(value: &Option<String>, field: &str) -> std::result::Result<NaiveDate, String> {
    let raw = required(value, field)?;
    parse_flexible_date(&raw).ok_or_else(|| format!("invalid {field}: {raw}"))
}

/// Parsed time, or `default` when the cell is empty
fn time_field(value: &Option<String>, field: &str, default: NaiveTime) -> std::result::Result<NaiveTime, String> {
    match text(value) {
        None => Ok(default),
        Some(raw) => parse_flexible_time(&raw).ok_or_else(|| format!("invalid {field}: {raw}")),
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

/// Group names separated by `,` or `;`
pub fn split_group_names(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(normalize_whitespace)
        .filter(|name| !name.is_empty())
        .collect()
}

impl ChildRecord {
    pub fn from_row(row: &ImportChildRow) -> std::result::Result<Self, String> {
        let parent_email = normalize_email(&required(&row.parent_email, "parent email")?);
        if !is_valid_email(&parent_email) {
            return Err(format!("invalid parent email: {parent_email}"));
        }

        Ok(Self {
            parent_email,
            parent_first_name: text(&row.parent_first_name).unwrap_or_default(),
            parent_last_name: text(&row.parent_last_name).unwrap_or_default(),
            parent_phone: text(&row.parent_phone),
            child_first_name: required(&row.child_first_name, "child first name")?,
            child_last_name: required(&row.child_last_name, "child last name")?,
            child_birth_date: date_field(&row.child_birth_date, "child birth date")?,
            group_name: text(&row.group_name),
        })
    }
}

impl TripRecord {
    /// Dates and times in the row are wall-clock values in `tz`.
    ///
    /// A missing departure time means the start of the day, a missing return
    /// time the end of it, so a same-day trip without times stays valid.
    pub fn from_row(row: &ImportTripRow, tz: Tz) -> std::result::Result<Self, String> {
        let departure_date = date_field(&row.departure_date, "departure date")?;
        let return_date = date_field(&row.return_date, "return date")?;
        let departure_time = time_field(&row.departure_time, "departure time", NaiveTime::MIN)?;
        let return_time = time_field(&row.return_time, "return time", end_of_day())?;

        let departure_datetime = local_to_utc(departure_date, departure_time, tz)
            .ok_or_else(|| format!("departure time does not exist locally: {departure_date} {departure_time}"))?;
        let return_datetime = local_to_utc(return_date, return_time, tz)
            .ok_or_else(|| format!("return time does not exist locally: {return_date} {return_time}"))?;

        if return_datetime < departure_datetime {
            return Err("return is before departure".to_string());
        }

        Ok(Self {
            title: required(&row.title, "title")?,
            departure_datetime,
            departure_location: required(&row.departure_location, "departure location")?,
            return_datetime,
            return_location: required(&row.return_location, "return location")?,
            group_names: row.group_names.as_deref().map(split_group_names).unwrap_or_default(),
        })
    }
}

/// Storage the importer reads rows from and writes entities to
#[async_trait]
pub trait ImportStore: Send + Sync {
    async fn child_rows(&self) -> Result<Vec<ImportChildRow>>;
    async fn trip_rows(&self) -> Result<Vec<ImportTripRow>>;
    async fn mark_child_row(&self, id: Uuid, status: ImportStatus, error: Option<&str>) -> Result<()>;
    async fn mark_trip_row(&self, id: Uuid, status: ImportStatus, error: Option<&str>) -> Result<()>;

    async fn find_or_create_parent(&self, record: &ChildRecord) -> Result<Uuid>;
    async fn find_or_create_group(&self, name: &str) -> Result<Uuid>;
    async fn find_group(&self, name: &str) -> Result<Option<Uuid>>;
    /// Existing participant with the same parent, names and birth date, or a new one
    async fn find_or_create_participant(&self, parent_id: Uuid, record: &ChildRecord) -> Result<Uuid>;
    async fn assign_group(&self, participant_id: Uuid, group_id: Uuid) -> Result<()>;
    /// Create the trip unless one with the same title and departure exists; link groups either way
    async fn upsert_trip(&self, record: &TripRecord, group_ids: &[Uuid]) -> Result<Uuid>;
}

pub struct Importer<S> {
    store: S,
    timezone: Tz,
}

impl<S: ImportStore> Importer<S> {
    pub fn new(store: S, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run_children_import(&self) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for row in self.store.child_rows().await? {
            if row.status == ImportStatus::Imported {
                summary.skipped += 1;
                continue;
            }
            summary.processed += 1;

            match self.import_child(&row).await {
                Ok(()) => {
                    self.store.mark_child_row(row.id, ImportStatus::Imported, None).await?;
                    log_import_row("children", row.id, None);
                    summary.imported += 1;
                }
                Err(reason) => {
                    self.store.mark_child_row(row.id, ImportStatus::Error, Some(&reason)).await?;
                    log_import_row("children", row.id, Some(&reason));
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(?summary, "Children import finished");
        Ok(summary)
    }

    pub async fn run_trips_import(&self) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for row in self.store.trip_rows().await? {
            if row.status == ImportStatus::Imported {
                summary.skipped += 1;
                continue;
            }
            summary.processed += 1;

            match self.import_trip(&row).await {
                Ok(()) => {
                    self.store.mark_trip_row(row.id, ImportStatus::Imported, None).await?;
                    log_import_row("trips", row.id, None);
                    summary.imported += 1;
                }
                Err(reason) => {
                    self.store.mark_trip_row(row.id, ImportStatus::Error, Some(&reason)).await?;
                    log_import_row("trips", row.id, Some(&reason));
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(?summary, "Trips import finished");
        Ok(summary)
    }

    async fn import_child(&self, row: &ImportChildRow) -> std::result::Result<(), String> {
        let record = ChildRecord::from_row(row)?;

        let parent_id = self.store.find_or_create_parent(&record).await.map_err(|e| e.to_string())?;
        let participant_id = self.store
            .find_or_create_participant(parent_id, &record)
            .await
            .map_err(|e| e.to_string())?;

        if let Some(group_name) = record.group_name.as_deref() {
            let group_id = self.store.find_or_create_group(group_name).await.map_err(|e| e.to_string())?;
            self.store.assign_group(participant_id, group_id).await.map_err(|e| e.to_string())?;
        }

        Ok(())
    }

    async fn import_trip(&self, row: &ImportTripRow) -> std::result::Result<(), String> {
        let record = TripRecord::from_row(row, self.timezone)?;

        let mut group_ids = Vec::with_capacity(record.group_names.len());
        for name in &record.group_names {
            match self.store.find_group(name).await.map_err(|e| e.to_string())? {
                Some(id) => group_ids.push(id),
                None => return Err(format!("unknown group: {name}")),
            }
        }

        self.store.upsert_trip(&record, &group_ids).await.map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Import store backed by the application database
#[derive(Clone)]
pub struct PgImportStore {
    db: DatabaseService,
}

impl PgImportStore {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImportStore for PgImportStore {
    async fn child_rows(&self) -> Result<Vec<ImportChildRow>> {
        self.db.imports.child_rows().await
    }

    async fn trip_rows(&self) -> Result<Vec<ImportTripRow>> {
        self.db.imports.trip_rows().await
    }

    async fn mark_child_row(&self, id: Uuid, status: ImportStatus, error: Option<&str>) -> Result<()> {
        self.db.imports.mark_child_row(id, status, error).await
    }

    async fn mark_trip_row(&self, id: Uuid, status: ImportStatus, error: Option<&str>) -> Result<()> {
        self.db.imports.mark_trip_row(id, status, error).await
    }

    async fn find_or_create_parent(&self, record: &ChildRecord) -> Result<Uuid> {
        if let Some(profile) = self.db.profiles.find_by_email(&record.parent_email).await? {
            return Ok(profile.id);
        }

        let profile = self.db.profiles.create(
            Uuid::new_v4(),
            &record.parent_email,
            &record.parent_first_name,
            &record.parent_last_name,
            record.parent_phone.as_deref(),
            Role::Parent,
        ).await?;
        Ok(profile.id)
    }

    async fn find_or_create_group(&self, name: &str) -> Result<Uuid> {
        if let Some(id) = self.find_group(name).await? {
            return Ok(id);
        }

        let group = self.db.groups.create(CreateGroupRequest {
            name: name.to_string(),
            description: None,
            sort_order: None,
        }).await?;
        Ok(group.id)
    }

    async fn find_group(&self, name: &str) -> Result<Option<Uuid>> {
        Ok(self.db.groups.find_by_name(name).await?.map(|group| group.id))
    }

    async fn find_or_create_participant(&self, parent_id: Uuid, record: &ChildRecord) -> Result<Uuid> {
        let existing = self.db.participants
            .find_by_identity(parent_id, &record.child_first_name, &record.child_last_name, record.child_birth_date)
            .await?;
        if let Some(participant) = existing {
            return Ok(participant.id);
        }

        let participant = self.db.participants.create(parent_id, CreateParticipantRequest {
            first_name: record.child_first_name.clone(),
            last_name: record.child_last_name.clone(),
            birth_date: record.child_birth_date,
            notes: None,
            custom_fields: Default::default(),
        }).await?;
        Ok(participant.id)
    }

    async fn assign_group(&self, participant_id: Uuid, group_id: Uuid) -> Result<()> {
        self.db.participants.assign_group(participant_id, Some(group_id)).await
    }

    async fn upsert_trip(&self, record: &TripRecord, group_ids: &[Uuid]) -> Result<Uuid> {
        let existing = self.db.trips
            .find_by_title_and_departure(&record.title, record.departure_datetime)
            .await?;

        if let Some(trip) = existing {
            if !group_ids.is_empty() {
                let mut linked = self.db.trips.group_ids(trip.id).await?;
                for id in group_ids {
                    if !linked.contains(id) {
                        linked.push(*id);
                    }
                }
                self.db.trips.update(trip.id, UpdateTripRequest {
                    group_ids: Some(linked),
                    ..Default::default()
                }).await?;
            }
            return Ok(trip.id);
        }

        let trip = self.db.trips.create(CreateTripRequest {
            title: record.title.clone(),
            description: None,
            departure_datetime: record.departure_datetime,
            departure_location: record.departure_location.clone(),
            departure_stop2_datetime: None,
            departure_stop2_location: None,
            return_datetime: record.return_datetime,
            return_location: record.return_location.clone(),
            return_stop2_datetime: None,
            return_stop2_location: None,
            bank_account_pln: None,
            bank_account_eur: None,
            status: Some(TripStatus::Draft),
            group_ids: group_ids.to_vec(),
        }).await?;
        Ok(trip.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Warsaw;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn child_row(email: &str, birth: &str) -> ImportChildRow {
        ImportChildRow {
            id: Uuid::new_v4(),
            parent_email: Some(email.to_string()),
            parent_first_name: Some("Anna".to_string()),
            parent_last_name: Some("Nowak".to_string()),
            parent_phone: None,
            child_first_name: Some(" Jan ".to_string()),
            child_last_name: Some("Nowak".to_string()),
            child_birth_date: Some(birth.to_string()),
            group_name: Some("Średniozaawansowani".to_string()),
            status: ImportStatus::Pending,
            error_message: None,
            imported_at: None,
        }
    }

    #[test]
    fn test_child_record_accepts_both_date_formats() {
        let iso = ChildRecord::from_row(&child_row("Anna@Example.pl", "2014-05-03")).unwrap();
        let dotted = ChildRecord::from_row(&child_row("anna@example.pl", "03.05.2014")).unwrap();

        assert_eq!(iso.child_birth_date, dotted.child_birth_date);
        assert_eq!(iso.parent_email, "anna@example.pl");
        assert_eq!(iso.child_first_name, "Jan");
    }

    #[test]
    fn test_child_record_errors() {
        assert_eq!(ChildRecord::from_row(&child_row("no-at-sign", "2014-05-03")).unwrap_err(), "invalid parent email: no-at-sign");
        assert_eq!(ChildRecord::from_row(&child_row("a@example.pl", "2014/05/03")).unwrap_err(), "invalid child birth date: 2014/05/03");

        let mut row = child_row("a@example.pl", "2014-05-03");
        row.child_last_name = Some("   ".to_string());
        assert_eq!(ChildRecord::from_row(&row).unwrap_err(), "missing child last name");
    }

    #[test]
    fn test_split_group_names() {
        assert_eq!(split_group_names("Mini; Junior ,  Senior,,"), vec!["Mini", "Junior", "Senior"]);
    }

    #[derive(Default)]
    struct MemoryStore {
        children: Mutex<Vec<ImportChildRow>>,
        trips: Mutex<Vec<ImportTripRow>>,
        parents: Mutex<HashMap<String, Uuid>>,
        groups: Mutex<HashMap<String, Uuid>>,
        participants: Mutex<Vec<(Uuid, Uuid, String, String, NaiveDate, Option<Uuid>)>>,
        created_trips: Mutex<Vec<(String, Vec<Uuid>)>>,
    }

    #[async_trait]
    impl ImportStore for MemoryStore {
        async fn child_rows(&self) -> Result<Vec<ImportChildRow>> {
            Ok(self.children.lock().unwrap().clone())
        }

        async fn trip_rows(&self) -> Result<Vec<ImportTripRow>> {
            Ok(self.trips.lock().unwrap().clone())
        }

        async fn mark_child_row(&self, id: Uuid, status: ImportStatus, error: Option<&str>) -> Result<()> {
            for row in self.children.lock().unwrap().iter_mut().filter(|r| r.id == id) {
                row.status = status;
                row.error_message = error.map(str::to_string);
            }
            Ok(())
        }

        async fn mark_trip_row(&self, id: Uuid, status: ImportStatus, error: Option<&str>) -> Result<()> {
            for row in self.trips.lock().unwrap().iter_mut().filter(|r| r.id == id) {
                row.status = status;
                row.error_message = error.map(str::to_string);
            }
            Ok(())
        }

        async fn find_or_create_parent(&self, record: &ChildRecord) -> Result<Uuid> {
            Ok(*self.parents.lock().unwrap().entry(record.parent_email.clone()).or_insert_with(Uuid::new_v4))
        }

        async fn find_or_create_group(&self, name: &str) -> Result<Uuid> {
            Ok(*self.groups.lock().unwrap().entry(name.to_string()).or_insert_with(Uuid::new_v4))
        }

        async fn find_group(&self, name: &str) -> Result<Option<Uuid>> {
            Ok(self.groups.lock().unwrap().get(name).copied())
        }

        async fn find_or_create_participant(&self, parent_id: Uuid, record: &ChildRecord) -> Result<Uuid> {
            let mut participants = self.participants.lock().unwrap();
            let existing = participants.iter().find(|p| {
                p.1 == parent_id && p.2 == record.child_first_name && p.3 == record.child_last_name && p.4 == record.child_birth_date
            });
            if let Some(p) = existing {
                return Ok(p.0);
            }
            let id = Uuid::new_v4();
            participants.push((id, parent_id, record.child_first_name.clone(), record.child_last_name.clone(), record.child_birth_date, None));
            Ok(id)
        }

        async fn assign_group(&self, participant_id: Uuid, group_id: Uuid) -> Result<()> {
            for p in self.participants.lock().unwrap().iter_mut().filter(|p| p.0 == participant_id) {
                p.5 = Some(group_id);
            }
            Ok(())
        }

        async fn upsert_trip(&self, record: &TripRecord, group_ids: &[Uuid]) -> Result<Uuid> {
            self.created_trips.lock().unwrap().push((record.title.clone(), group_ids.to_vec()));
            Ok(Uuid::new_v4())
        }
    }

    fn trip_row(title: &str, groups: &str) -> ImportTripRow {
        ImportTripRow {
            id: Uuid::new_v4(),
            title: Some(title.to_string()),
            departure_date: Some("2026-02-14".to_string()),
            departure_time: Some("06:30".to_string()),
            departure_location: Some("Kraków".to_string()),
            return_date: Some("2026-02-14".to_string()),
            return_time: Some("20:00".to_string()),
            return_location: Some("Kraków".to_string()),
            group_names: Some(groups.to_string()),
            status: ImportStatus::Pending,
            error_message: None,
            imported_at: None,
        }
    }

    #[tokio::test]
    async fn test_children_import_is_repeatable() {
        let store = MemoryStore::default();
        {
            let mut rows = store.children.lock().unwrap();
            rows.push(child_row("anna@example.pl", "2014-05-03"));
            rows.push(child_row("ANNA@example.pl", "03.05.2014"));
            rows.push(child_row("broken", "2014-05-03"));
        }
        let importer = Importer::new(store, Warsaw);

        let first = importer.run_children_import().await.unwrap();
        assert_eq!(first, ImportSummary { processed: 3, imported: 2, failed: 1, skipped: 0 });
        assert_eq!(importer.store().parents.lock().unwrap().len(), 1);
        assert_eq!(importer.store().participants.lock().unwrap().len(), 1);
        assert!(importer.store().participants.lock().unwrap()[0].5.is_some());

        let second = importer.run_children_import().await.unwrap();
        assert_eq!(second, ImportSummary { processed: 1, imported: 0, failed: 1, skipped: 2 });
        assert_eq!(importer.store().participants.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_trip_with_unknown_group_fails_alone() {
        let store = MemoryStore::default();
        store.groups.lock().unwrap().insert("Mini".to_string(), Uuid::new_v4());
        {
            let mut rows = store.trips.lock().unwrap();
            rows.push(trip_row("Szczyrk", "Mini"));
            rows.push(trip_row("Zakopane", "Mini, Nieznana"));
        }
        let importer = Importer::new(store, Warsaw);

        let summary = importer.run_trips_import().await.unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.failed, 1);

        let rows = importer.store().trips.lock().unwrap();
        assert_eq!(rows[1].status, ImportStatus::Error);
        assert_eq!(rows[1].error_message.as_deref(), Some("unknown group: Nieznana"));
        assert_eq!(importer.store().created_trips.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_trip_record_combines_date_and_time() {
        let row = ImportTripRow {
            id: Uuid::new_v4(),
            title: Some("Białka Tatrzańska".to_string()),
            departure_date: Some("14.02.2026".to_string()),
            departure_time: Some("06:30".to_string()),
            departure_location: Some("Kraków".to_string()),
            return_date: Some("2026-02-15".to_string()),
            return_time: None,
            return_location: Some("Kraków".to_string()),
            group_names: Some("Mini;Junior".to_string()),
            status: ImportStatus::Error,
            error_message: Some("old error".to_string()),
            imported_at: None,
        };

        let record = TripRecord::from_row(&row, Warsaw).unwrap();
        assert_eq!(record.departure_datetime.to_rfc3339(), "2026-02-14T05:30:00+00:00");
        assert_eq!(record.return_datetime.to_rfc3339(), "2026-02-15T22:59:00+00:00");
        assert_eq!(record.group_names, vec!["Mini", "Junior"]);
    }

    #[test]
    fn test_same_day_trip_without_times() {
        let mut row = trip_row("Kluszkowce", "Mini");
        row.departure_time = None;
        row.return_time = None;

        let record = TripRecord::from_row(&row, Warsaw).unwrap();
        assert_eq!(record.departure_datetime.to_rfc3339(), "2026-02-13T23:00:00+00:00");
        assert_eq!(record.return_datetime.to_rfc3339(), "2026-02-14T22:59:00+00:00");
    }

    #[test]
    fn test_same_day_trip_with_return_before_departure() {
        let mut row = trip_row("Kluszkowce", "Mini");
        row.departure_time = Some("10:00".to_string());
        row.return_time = Some("09:00".to_string());

        assert_eq!(TripRecord::from_row(&row, Warsaw).unwrap_err(), "return is before departure");
    }

    #[test]
    fn test_departure_in_dst_gap_is_rejected() {
        let mut row = trip_row("Szczyrk", "Mini");
        row.departure_date = Some("2026-03-29".to_string());
        row.departure_time = Some("02:30".to_string());
        row.return_date = Some("2026-03-29".to_string());

        assert!(TripRecord::from_row(&row, Warsaw).unwrap_err().starts_with("departure time does not exist locally"));
    }
}
