// src/models/profile.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'resume_profile' table. Effectively a singleton: public
/// reads take the latest row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub linkedin: Option<String>,
    pub github_link: Option<String>,
    /// Professional headline (e.g., "Software Engineer").
    pub title: Option<String>,
    pub summary: Option<String>,
    pub bio_photo: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for the profile upsert.
#[derive(Debug, Deserialize, Validate)]
pub struct ProfilePayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub location: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    pub linkedin: Option<String>,
    pub github_link: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub bio_photo: Option<String>,
}
