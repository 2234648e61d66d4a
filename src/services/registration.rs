//! Trip registration rules

use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{
    CreateRegistrationRequest, ParticipationStatus, Payment, Profile, RegistrationView, Trip,
    TripRegistration, TripStatus,
};
use crate::services::auth::ensure_owner;
use crate::services::payments::PaymentService;
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::logging::{log_admin_action, log_parent_action};

/// A new registration together with the payments created for it
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    pub registration: TripRegistration,
    pub payments: Vec<Payment>,
}

/// Decide whether a registration is allowed; returns the `is_outside_group` flag.
///
/// Parents may register only for published trips and only when the child's
/// group is one of the trip's groups. Admins may register for any trip that
/// is not cancelled and may override the group rule.
pub fn check_eligibility(
    actor_is_admin: bool,
    trip: &Trip,
    participant_group: Option<Uuid>,
    trip_groups: &[Uuid],
    outside_group_requested: bool,
) -> Result<bool> {
    match trip.status {
        TripStatus::Published => {}
        TripStatus::Draft if actor_is_admin => {}
        TripStatus::Draft => {
            return Err(SkiClubError::Validation("Trip is not open for registration".to_string()));
        }
        TripStatus::Cancelled => {
            return Err(SkiClubError::Validation("Trip is cancelled".to_string()));
        }
    }

    let in_group = participant_group.is_some_and(|group| trip_groups.contains(&group));
    if in_group {
        return Ok(false);
    }

    if actor_is_admin && outside_group_requested {
        Ok(true)
    } else {
        Err(SkiClubError::PermissionDenied("Participant is outside the trip's groups".to_string()))
    }
}

/// Participation statuses a parent may set
pub fn check_participation_change(actor_is_admin: bool, status: ParticipationStatus) -> Result<()> {
    if !actor_is_admin && status == ParticipationStatus::Unconfirmed {
        return Err(SkiClubError::Validation("Participation can only be confirmed or declined".to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct RegistrationService {
    db: DatabaseService,
    payments: PaymentService,
}

impl RegistrationService {
    pub fn new(db: DatabaseService, timezone: Tz) -> Self {
        let payments = PaymentService::new(db.clone(), timezone);
        Self { db, payments }
    }

    pub async fn register(&self, actor: &Profile, trip_id: Uuid, request: CreateRegistrationRequest) -> Result<RegistrationOutcome> {
        let trip = self.db.trips.find_by_id(trip_id).await?
            .ok_or_else(|| SkiClubError::not_found("trip", trip_id))?;
        let participant = self.db.participants.find_by_id(request.participant_id).await?
            .ok_or_else(|| SkiClubError::not_found("participant", request.participant_id))?;
        ensure_owner(actor, participant.parent_id)?;

        let participant_group = self.db.participants.group_id(participant.id).await?;
        let trip_groups = self.db.trips.group_ids(trip.id).await?;
        let is_outside_group = check_eligibility(
            actor.is_admin(),
            &trip,
            participant_group,
            &trip_groups,
            request.outside_group,
        )?;

        if self.db.registrations.find_by_trip_participant(trip.id, participant.id).await?.is_some() {
            return Err(SkiClubError::Conflict("Participant is already registered for this trip".to_string()));
        }

        let registration = self.db.registrations
            .create(trip.id, participant.id, actor.id, is_outside_group)
            .await?;

        let payments = match self.payments.create_for_registration(registration.id, trip.id, &participant).await {
            Ok(payments) => payments,
            Err(e) => {
                warn!(registration_id = %registration.id, error = %e, "Payment creation failed, removing registration");
                self.db.registrations.delete(registration.id).await?;
                return Err(e);
            }
        };

        let details = format!("trip={} participant={}", trip.id, participant.id);
        if actor.is_admin() {
            log_admin_action(actor.id, "register_participant", Some(&registration.id.to_string()), Some(&details));
        } else {
            log_parent_action(actor.id, "register_participant", Some(&details));
        }

        info!(
            registration_id = %registration.id,
            outside_group = is_outside_group,
            payments = payments.len(),
            "Participant registered for trip"
        );
        Ok(RegistrationOutcome { registration, payments })
    }

    pub async fn set_participation(&self, actor: &Profile, registration_id: Uuid, status: ParticipationStatus) -> Result<TripRegistration> {
        check_participation_change(actor.is_admin(), status)?;
        self.owned_registration(actor, registration_id).await?;

        let registration = self.db.registrations.update_participation(registration_id, status).await?;
        log_parent_action(actor.id, "set_participation", Some(status.as_str()));
        Ok(registration)
    }

    /// Cancel a registration; its payments and contract go with it
    pub async fn unregister(&self, actor: &Profile, registration_id: Uuid) -> Result<()> {
        self.owned_registration(actor, registration_id).await?;

        if !actor.is_admin() && self.db.payments.any_paid_for_registration(registration_id).await? {
            return Err(SkiClubError::Conflict(
                "Registration has recorded payments; contact the club to cancel".to_string(),
            ));
        }

        if !self.db.registrations.delete(registration_id).await? {
            return Err(SkiClubError::not_found("registration", registration_id));
        }

        if actor.is_admin() {
            log_admin_action(actor.id, "unregister", Some(&registration_id.to_string()), None);
        } else {
            log_parent_action(actor.id, "unregister", Some(&registration_id.to_string()));
        }
        Ok(())
    }

    pub async fn list_for_trip(&self, trip_id: Uuid) -> Result<Vec<RegistrationView>> {
        self.db.trips.find_by_id(trip_id).await?
            .ok_or_else(|| SkiClubError::not_found("trip", trip_id))?;
        self.db.registrations.list_by_trip(trip_id).await
    }

    pub async fn list_for_parent(&self, parent_id: Uuid) -> Result<Vec<TripRegistration>> {
        self.db.registrations.list_by_parent(parent_id).await
    }

    async fn owned_registration(&self, actor: &Profile, registration_id: Uuid) -> Result<TripRegistration> {
        let registration = self.db.registrations.find_by_id(registration_id).await?
            .ok_or_else(|| SkiClubError::not_found("registration", registration_id))?;
        let participant = self.db.participants.find_by_id(registration.participant_id).await?
            .ok_or_else(|| SkiClubError::not_found("participant", registration.participant_id))?;

        ensure_owner(actor, participant.parent_id)?;
        Ok(registration)
    }
}
