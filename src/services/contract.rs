//! Contract text materialization and acceptance

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;
use uuid::Uuid;
use crate::database::DatabaseService;
use crate::models::{ContractView, Participant, Payment, Profile, Trip, TripContract, TripContractTemplate};
use crate::services::email::render_template;
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::helpers::{format_amount, format_date, format_local_datetime, local_today};

/// Tokens understood inside a contract template
pub const CONTRACT_TOKENS: &[&str] = &[
    "child_name",
    "child_first_name",
    "child_last_name",
    "child_birth_date",
    "parent_name",
    "parent_email",
    "parent_phone",
    "parent_address",
    "parent_pesel",
    "trip_title",
    "trip_dates",
    "departure_datetime",
    "departure_location",
    "return_datetime",
    "return_location",
    "total_amount",
    "current_date",
];

/// Values substituted into a contract template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractContext {
    values: HashMap<&'static str, String>,
}

impl ContractContext {
    /// Dates and times are rendered in the club's local zone
    pub fn build(
        participant: &Participant,
        parent: &Profile,
        trip: &Trip,
        payments: &[Payment],
        today: NaiveDate,
        tz: Tz,
    ) -> Self {
        let mut values = HashMap::new();

        values.insert("child_name", participant.full_name());
        values.insert("child_first_name", participant.first_name.clone());
        values.insert("child_last_name", participant.last_name.clone());
        values.insert("child_birth_date", format_date(participant.birth_date));
        values.insert("parent_name", parent.full_name());
        values.insert("parent_email", parent.email.clone());
        values.insert("parent_phone", parent.phone.clone().unwrap_or_default());
        values.insert("parent_address", parent.address_line());
        values.insert("parent_pesel", parent.pesel.clone().unwrap_or_default());
        values.insert("trip_title", trip.title.clone());
        values.insert("trip_dates", trip.date_range(tz));
        values.insert("departure_datetime", format_local_datetime(trip.departure_datetime, tz));
        values.insert("departure_location", trip.departure_location.clone());
        values.insert("return_datetime", format_local_datetime(trip.return_datetime, tz));
        values.insert("return_location", trip.return_location.clone());
        values.insert("total_amount", total_amount(payments));
        values.insert("current_date", format_date(today));

        Self { values }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    /// Override a single value
    pub fn set(&mut self, token: &'static str, value: impl Into<String>) {
        self.values.insert(token, value.into());
    }
}

/// Sum of payment amounts per currency, e.g. `1250.00 PLN + 300.00 EUR`
fn total_amount(payments: &[Payment]) -> String {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for payment in payments.iter().filter(|p| !p.status.is_manual()) {
        *totals.entry(payment.currency.as_str()).or_insert(0) += payment.amount;
    }

    if totals.is_empty() {
        return format_amount(0, "PLN");
    }

    // PLN first, then the rest alphabetically
    let mut parts: Vec<(&str, i64)> = totals.into_iter().collect();
    parts.sort_by_key(|(currency, _)| (*currency != "PLN", *currency));
    parts
        .into_iter()
        .map(|(currency, amount)| format_amount(amount, currency))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Replace every known token; unknown tokens are kept verbatim
pub fn render(template: &str, context: &ContractContext) -> String {
    render_template(template, &context.values)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub generated: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct ContractService {
    db: DatabaseService,
    timezone: Tz,
}

impl ContractService {
    pub fn new(db: DatabaseService, timezone: Tz) -> Self {
        Self { db, timezone }
    }

    pub async fn get_template(&self, trip_id: Uuid) -> Result<TripContractTemplate> {
        self.db.contracts.find_template(trip_id).await?
            .ok_or_else(|| SkiClubError::not_found("contract template", trip_id))
    }

    pub async fn upsert_template(&self, trip_id: Uuid, content: &str) -> Result<TripContractTemplate> {
        self.db.trips.find_by_id(trip_id).await?
            .ok_or_else(|| SkiClubError::not_found("trip", trip_id))?;

        self.db.contracts.upsert_template(trip_id, content).await
    }

    /// Materialize contracts for every registration of the trip without one
    pub async fn generate_for_trip(&self, trip_id: Uuid) -> Result<GenerationSummary> {
        let trip = self.db.trips.find_by_id(trip_id).await?
            .ok_or_else(|| SkiClubError::not_found("trip", trip_id))?;
        let template = self.get_template(trip_id).await?;

        let existing: HashSet<Uuid> = self.db.contracts.participants_with_contract(trip_id).await?
            .into_iter()
            .collect();
        let registrations = self.db.registrations.list_by_trip(trip_id).await?;
        let today = local_today(self.timezone);
        let mut summary = GenerationSummary::default();

        for view in registrations {
            let registration = view.registration;
            if existing.contains(&registration.participant_id) {
                summary.skipped += 1;
                continue;
            }

            let participant = self.db.participants.find_by_id(registration.participant_id).await?
                .ok_or_else(|| SkiClubError::not_found("participant", registration.participant_id))?;
            let parent = self.db.profiles.find_by_id(participant.parent_id).await?
                .ok_or_else(|| SkiClubError::not_found("profile", participant.parent_id))?;
            let payments = self.db.payments.list_for_registration(registration.id).await?;

            let context = ContractContext::build(&participant, &parent, &trip, &payments, today, self.timezone);
            let content = render(&template.content, &context);

            match self.db.contracts.create(trip_id, participant.id, registration.id, &content).await? {
                Some(_) => summary.generated += 1,
                None => summary.skipped += 1,
            }
        }

        info!(trip_id = %trip_id, generated = summary.generated, skipped = summary.skipped, "Contracts generated");
        Ok(summary)
    }

    pub async fn list_for_parent(&self, parent_id: Uuid) -> Result<Vec<ContractView>> {
        self.db.contracts.list_views(None, Some(parent_id)).await
    }

    pub async fn list_for_trip(&self, trip_id: Uuid) -> Result<Vec<ContractView>> {
        self.db.contracts.list_views(Some(trip_id), None).await
    }

    /// Accept a contract on behalf of its owning parent
    pub async fn accept(&self, contract_id: Uuid, parent: &Profile) -> Result<TripContract> {
        let view = self.db.contracts.find_view(contract_id).await?
            .ok_or_else(|| SkiClubError::not_found("contract", contract_id))?;

        check_acceptance(&view, parent)?;

        let contract = self.db.contracts.accept(contract_id, &parent.full_name()).await?
            .ok_or_else(|| SkiClubError::Conflict("Contract has already been accepted".to_string()))?;

        info!(contract_id = %contract_id, parent_id = %parent.id, "Contract accepted");
        Ok(contract)
    }
}

/// Rules a parent must satisfy before accepting a contract
pub fn check_acceptance(view: &ContractView, parent: &Profile) -> Result<()> {
    if view.parent_id != parent.id {
        return Err(SkiClubError::PermissionDenied("Only the child's parent can accept this contract".to_string()));
    }
    if view.contract.is_accepted() {
        return Err(SkiClubError::Conflict("Contract has already been accepted".to_string()));
    }
    if !parent.has_contract_data() {
        return Err(SkiClubError::Validation(
            "Complete your address and PESEL in the profile before accepting the contract".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Europe::Warsaw;
    use sqlx::types::Json;
    use crate::models::{PaymentStatus, Role, TripStatus};

    fn participant() -> Participant {
        Participant {
            id: Uuid::new_v4(),
            parent_id: Uuid::new_v4(),
            first_name: "Jan".to_string(),
            last_name: "Kowalski".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2015, 3, 7).unwrap(),
            notes: None,
            custom_fields: Json(Default::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn parent(id: Uuid) -> Profile {
        Profile {
            id,
            email: "ewa@example.pl".to_string(),
            first_name: "Ewa".to_string(),
            last_name: "Kowalska".to_string(),
            phone: Some("600100200".to_string()),
            role: Role::Parent,
            address_street: Some("ul. Lipowa 1".to_string()),
            address_city: Some("Kraków".to_string()),
            address_zip: Some("30-002".to_string()),
            pesel: Some("02070803628".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn trip() -> Trip {
        Trip {
            id: Uuid::new_v4(),
            title: "Obóz Zakopane".to_string(),
            description: None,
            departure_datetime: Utc.with_ymd_and_hms(2026, 2, 14, 7, 30, 0).unwrap(),
            departure_location: "Kraków, Plac Inwalidów".to_string(),
            departure_stop2_datetime: None,
            departure_stop2_location: None,
            return_datetime: Utc.with_ymd_and_hms(2026, 2, 21, 18, 0, 0).unwrap(),
            return_location: "Kraków, Plac Inwalidów".to_string(),
            return_stop2_datetime: None,
            return_stop2_location: None,
            bank_account_pln: None,
            bank_account_eur: None,
            status: TripStatus::Published,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payment(amount: i64, currency: &str, status: PaymentStatus) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            registration_id: Uuid::new_v4(),
            template_id: None,
            amount,
            amount_paid: 0,
            currency: currency.to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            status,
            admin_notes: None,
            marked_by: None,
            paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn context() -> ContractContext {
        let child = participant();
        let payments = vec![
            payment(100_000, "PLN", PaymentStatus::Pending),
            payment(25_050, "PLN", PaymentStatus::Pending),
            payment(30_000, "EUR", PaymentStatus::Pending),
            payment(99_999, "PLN", PaymentStatus::Waived),
        ];
        ContractContext::build(
            &child,
            &parent(child.parent_id),
            &trip(),
            &payments,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            Warsaw,
        )
    }

    #[test]
    fn test_context_has_every_token() {
        let ctx = context();
        for token in CONTRACT_TOKENS {
            assert!(ctx.get(token).is_some(), "missing {token}");
        }
    }

    #[test]
    fn test_render_known_tokens() {
        let rendered = render(
            "Umowa dla {{child_name}} ({{ child_birth_date }}), rodzic {{parent_name}}, {{parent_address}}. Wyjazd {{trip_dates}} z {{departure_location}}. Razem {{total_amount}}. Data {{current_date}}.",
            &context(),
        );

        assert_eq!(
            rendered,
            "Umowa dla Jan Kowalski (07.03.2015), rodzic Ewa Kowalska, ul. Lipowa 1, 30-002 Kraków. Wyjazd 14.02.2026 - 21.02.2026 z Kraków, Plac Inwalidów. Razem 1250.50 PLN + 300.00 EUR. Data 05.01.2026."
        );
    }

    #[test]
    fn test_times_are_rendered_in_club_zone() {
        let ctx = context();
        assert_eq!(ctx.get("departure_datetime"), Some("14.02.2026 08:30"));
        assert_eq!(ctx.get("return_datetime"), Some("21.02.2026 19:00"));
    }

    #[test]
    fn test_late_return_keeps_local_date() {
        let mut late = trip();
        late.departure_datetime = DateTime::parse_from_rfc3339("2026-02-14T07:30:00+01:00").unwrap().with_timezone(&Utc);
        late.return_datetime = DateTime::parse_from_rfc3339("2026-02-15T00:30:00+01:00").unwrap().with_timezone(&Utc);
        let child = participant();

        let ctx = ContractContext::build(
            &child,
            &parent(child.parent_id),
            &late,
            &[],
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            Warsaw,
        );

        assert_eq!(ctx.get("departure_datetime"), Some("14.02.2026 07:30"));
        assert_eq!(ctx.get("return_datetime"), Some("15.02.2026 00:30"));
        assert_eq!(ctx.get("trip_dates"), Some("14.02.2026 - 15.02.2026"));
    }

    #[test]
    fn test_render_keeps_unknown_tokens() {
        assert_eq!(render("{{insurance_number}} / {{trip_title}}", &context()), "{{insurance_number}} / Obóz Zakopane");
    }

    #[test]
    fn test_render_without_tokens_is_unchanged() {
        let text = "Plain contract text without placeholders.";
        assert_eq!(render(text, &context()), text);
    }

    #[test]
    fn test_value_with_token_syntax_is_not_expanded() {
        let mut ctx = context();
        ctx.set("child_name", "{{parent_pesel}}");
        assert_eq!(render("{{child_name}}", &ctx), "{{parent_pesel}}");
    }

    #[test]
    fn test_total_amount_defaults_to_zero() {
        assert_eq!(total_amount(&[]), "0.00 PLN");
    }

    fn view(parent_id: Uuid, accepted: bool) -> ContractView {
        ContractView {
            contract: TripContract {
                id: Uuid::new_v4(),
                trip_id: Uuid::new_v4(),
                participant_id: Uuid::new_v4(),
                registration_id: Uuid::new_v4(),
                content: "text".to_string(),
                accepted_at: accepted.then(Utc::now),
                accepted_by_name: None,
                created_at: Utc::now(),
            },
            trip_title: "Trip".to_string(),
            participant_name: "Jan Kowalski".to_string(),
            parent_id,
        }
    }

    #[test]
    fn test_acceptance_rules() {
        let owner = parent(Uuid::new_v4());

        assert!(check_acceptance(&view(owner.id, false), &owner).is_ok());
        assert!(matches!(check_acceptance(&view(Uuid::new_v4(), false), &owner), Err(SkiClubError::PermissionDenied(_))));
        assert!(matches!(check_acceptance(&view(owner.id, true), &owner), Err(SkiClubError::Conflict(_))));

        let mut incomplete = owner.clone();
        incomplete.pesel = None;
        assert!(matches!(check_acceptance(&view(owner.id, false), &incomplete), Err(SkiClubError::Validation(_))));
    }
}
