//! Profile repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::profile::{Profile, Role, UpdateProfileRequest};
use crate::utils::errors::SkiClubError;

const PROFILE_COLUMNS: &str = "id, email, first_name, last_name, phone, role, address_street, address_city, address_zip, pesel, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a profile. Imported parents get a fresh id until they sign in.
    pub async fn create(&self, id: Uuid, email: &str, first_name: &str, last_name: &str, phone: Option<&str>, role: Role) -> Result<Profile, SkiClubError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            INSERT INTO profiles (id, email, first_name, last_name, phone, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Find profile by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, SkiClubError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Find profile by email (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, SkiClubError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// List profiles, optionally restricted to one role
    pub async fn list(&self, role: Option<Role>) -> Result<Vec<Profile>, SkiClubError> {
        let profiles = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE ($1::text IS NULL OR role = $1) ORDER BY last_name, first_name"
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    /// Update contact and contract-signing fields
    pub async fn update(&self, id: Uuid, request: UpdateProfileRequest) -> Result<Profile, SkiClubError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                address_street = COALESCE($5, address_street),
                address_city = COALESCE($6, address_city),
                address_zip = COALESCE($7, address_zip),
                pesel = COALESCE($8, pesel),
                updated_at = $9
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.phone)
        .bind(request.address_street)
        .bind(request.address_city)
        .bind(request.address_zip)
        .bind(request.pesel)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<Profile, SkiClubError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profiles SET role = $2, updated_at = $3 WHERE id = $1 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

}
