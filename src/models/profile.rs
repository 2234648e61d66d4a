//! Profile model (parent or admin account)

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

text_enum! {
    /// Account role checked by every action
    pub enum Role {
        Parent => "parent",
        Admin => "admin",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_zip: Option<String>,
    pub pesel: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Single-line postal address, empty parts skipped
    pub fn address_line(&self) -> String {
        let city_line = [self.address_zip.as_deref(), self.address_city.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        [self.address_street.as_deref().unwrap_or(""), city_line.as_str()]
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether the fields needed to sign a contract are present and valid
    pub fn has_contract_data(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);

        !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && filled(&self.address_street)
            && filled(&self.address_city)
            && filled(&self.address_zip)
            && self.pesel.as_deref().map(crate::utils::helpers::is_valid_pesel).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(min = 6, max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub address_street: Option<String>,
    #[validate(length(max = 100))]
    pub address_city: Option<String>,
    #[validate(length(max = 10))]
    pub address_zip: Option<String>,
    pub pesel: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "anna@example.pl".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Nowak".to_string(),
            phone: None,
            role: Role::Parent,
            address_street: Some("ul. Zielona 5".to_string()),
            address_city: Some("Kraków".to_string()),
            address_zip: Some("30-001".to_string()),
            pesel: Some("44051401359".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn address_line_joins_parts() {
        assert_eq!(profile().address_line(), "ul. Zielona 5, 30-001 Kraków");
    }

    #[test]
    fn contract_data_requires_valid_pesel() {
        let mut p = profile();
        assert!(p.has_contract_data());
        p.pesel = Some("12345678901".to_string());
        assert!(!p.has_contract_data());
        p.pesel = Some("44051401359".to_string());
        p.address_city = None;
        assert!(!p.has_contract_data());
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }
}
