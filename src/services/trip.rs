//! Trip scheduling and payment templates

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{
    CreatePaymentTemplateRequest, CreateTripRequest, PaymentTemplate, PaymentType, Profile, Trip,
    TripStatus, TripWithGroups, UpdateTripRequest,
};
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::logging::log_admin_action;

const CURRENCIES: &[&str] = &["PLN", "EUR"];

/// A second stop needs both its time and its place
pub fn check_stop(datetime: Option<DateTime<Utc>>, location: Option<&str>, label: &str) -> Result<()> {
    let has_location = location.is_some_and(|l| !l.trim().is_empty());
    match (datetime.is_some(), has_location) {
        (true, false) | (false, true) => Err(SkiClubError::Validation(format!(
            "{label} second stop needs both time and place"
        ))),
        _ => Ok(()),
    }
}

pub fn check_schedule(departure: DateTime<Utc>, return_at: DateTime<Utc>) -> Result<()> {
    if return_at < departure {
        return Err(SkiClubError::Validation("Return is before departure".to_string()));
    }
    Ok(())
}

pub fn check_template(request: &CreatePaymentTemplateRequest) -> Result<()> {
    if let Some(currency) = request.currency.as_deref() {
        if !CURRENCIES.contains(&currency.to_uppercase().as_str()) {
            return Err(SkiClubError::Validation(format!("Unsupported currency: {currency}")));
        }
    }

    match request.payment_type {
        PaymentType::Installment if request.installment_number.is_none() => {
            Err(SkiClubError::Validation("Installment needs an installment number".to_string()))
        }
        PaymentType::SeasonPass => match (request.birth_year_from, request.birth_year_to) {
            (Some(from), Some(to)) if from <= to => Ok(()),
            (Some(_), Some(_)) => Err(SkiClubError::Validation("Birth year range is reversed".to_string())),
            _ => Err(SkiClubError::Validation("Season pass needs a birth year range".to_string())),
        },
        PaymentType::Installment => Ok(()),
    }
}

fn check_create(request: &CreateTripRequest) -> Result<()> {
    check_schedule(request.departure_datetime, request.return_datetime)?;
    check_stop(request.departure_stop2_datetime, request.departure_stop2_location.as_deref(), "Departure")?;
    check_stop(request.return_stop2_datetime, request.return_stop2_location.as_deref(), "Return")
}

/// Second stop after an update: cleared, replaced field by field, or kept
fn merged_stop<'a>(
    clear: bool,
    datetime: Option<DateTime<Utc>>,
    location: Option<&'a str>,
    current_datetime: Option<DateTime<Utc>>,
    current_location: Option<&'a str>,
    label: &str,
) -> Result<(Option<DateTime<Utc>>, Option<&'a str>)> {
    if !clear {
        return Ok((datetime.or(current_datetime), location.or(current_location)));
    }
    if datetime.is_some() || location.is_some() {
        return Err(SkiClubError::Validation(format!("{label} second stop cannot be set and cleared at once")));
    }
    Ok((None, None))
}

/// Apply an update to the stored trip and check the merged result
fn check_update(trip: &Trip, request: &UpdateTripRequest) -> Result<()> {
    check_schedule(
        request.departure_datetime.unwrap_or(trip.departure_datetime),
        request.return_datetime.unwrap_or(trip.return_datetime),
    )?;

    let (datetime, location) = merged_stop(
        request.clear_departure_stop2,
        request.departure_stop2_datetime,
        request.departure_stop2_location.as_deref(),
        trip.departure_stop2_datetime,
        trip.departure_stop2_location.as_deref(),
        "Departure",
    )?;
    check_stop(datetime, location, "Departure")?;

    let (datetime, location) = merged_stop(
        request.clear_return_stop2,
        request.return_stop2_datetime,
        request.return_stop2_location.as_deref(),
        trip.return_stop2_datetime,
        trip.return_stop2_location.as_deref(),
        "Return",
    )?;
    check_stop(datetime, location, "Return")
}

#[derive(Clone)]
pub struct TripService {
    db: DatabaseService,
}

impl TripService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn create(&self, admin_id: Uuid, request: CreateTripRequest) -> Result<TripWithGroups> {
        check_create(&request)?;
        let trip = self.db.trips.create(request).await?;

        log_admin_action(admin_id, "create_trip", Some(&trip.id.to_string()), Some(&trip.title));
        self.with_groups(trip).await
    }

    pub async fn update(&self, admin_id: Uuid, trip_id: Uuid, request: UpdateTripRequest) -> Result<TripWithGroups> {
        let trip = self.find(trip_id).await?;
        check_update(&trip, &request)?;

        let trip = self.db.trips.update(trip_id, request).await?;
        log_admin_action(admin_id, "update_trip", Some(&trip_id.to_string()), None);
        self.with_groups(trip).await
    }

    pub async fn delete(&self, admin_id: Uuid, trip_id: Uuid) -> Result<()> {
        if !self.db.trips.delete(trip_id).await? {
            return Err(SkiClubError::not_found("trip", trip_id));
        }
        log_admin_action(admin_id, "delete_trip", Some(&trip_id.to_string()), None);
        Ok(())
    }

    /// Trips visible to a profile: everything for admins, published trips of
    /// their children's groups for parents
    pub async fn list_for(&self, actor: &Profile) -> Result<Vec<Trip>> {
        if actor.is_admin() {
            return self.db.trips.list().await;
        }

        let groups = self.parent_groups(actor.id).await?;
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        self.db.trips.list_published_for_groups(&groups).await
    }

    pub async fn get_for(&self, actor: &Profile, trip_id: Uuid) -> Result<TripWithGroups> {
        let trip = self.find(trip_id).await?;
        let details = self.with_groups(trip).await?;

        if actor.is_admin() {
            return Ok(details);
        }

        let groups = self.parent_groups(actor.id).await?;
        let visible = details.trip.status == TripStatus::Published
            && details.group_ids.iter().any(|id| groups.contains(id));
        if !visible {
            return Err(SkiClubError::not_found("trip", trip_id));
        }
        Ok(details)
    }

    pub async fn create_template(&self, admin_id: Uuid, trip_id: Uuid, request: CreatePaymentTemplateRequest) -> Result<PaymentTemplate> {
        check_template(&request)?;
        self.find(trip_id).await?;

        let template = self.db.trips.create_template(trip_id, request).await?;
        log_admin_action(admin_id, "create_payment_template", Some(&template.id.to_string()), Some(&trip_id.to_string()));
        Ok(template)
    }

    pub async fn list_templates(&self, trip_id: Uuid) -> Result<Vec<PaymentTemplate>> {
        self.find(trip_id).await?;
        self.db.trips.list_templates(trip_id).await
    }

    /// Remove a template; payments already created from it keep their amounts
    pub async fn delete_template(&self, admin_id: Uuid, template_id: Uuid) -> Result<()> {
        if !self.db.trips.delete_template(template_id).await? {
            return Err(SkiClubError::not_found("payment template", template_id));
        }
        log_admin_action(admin_id, "delete_payment_template", Some(&template_id.to_string()), None);
        Ok(())
    }

    async fn find(&self, trip_id: Uuid) -> Result<Trip> {
        self.db.trips.find_by_id(trip_id).await?
            .ok_or_else(|| SkiClubError::not_found("trip", trip_id))
    }

    async fn with_groups(&self, trip: Trip) -> Result<TripWithGroups> {
        let group_ids = self.db.trips.group_ids(trip.id).await?;
        Ok(TripWithGroups { trip, group_ids })
    }

    async fn parent_groups(&self, parent_id: Uuid) -> Result<Vec<Uuid>> {
        let groups: BTreeSet<Uuid> = self.db.participants
            .list(Some(parent_id))
            .await?
            .into_iter()
            .filter_map(|p| p.group_id)
            .collect();
        Ok(groups.into_iter().collect())
    }
}
