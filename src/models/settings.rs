// src/models/settings.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

/// The singleton 'site_settings' row. The table's `CHECK (id = 1)` primary
/// key makes initialization race-safe: both of two near-simultaneous first
/// requests run the conditional insert, exactly one row results.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SiteSettings {
    pub id: i64,
    pub allow_registration: bool,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub allow_registration: bool,
}

impl SiteSettings {
    /// Idempotent first-use initialization. Safe to call on every read.
    pub async fn ensure_row(pool: &PgPool) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO site_settings (id, allow_registration) VALUES (1, TRUE)
             ON CONFLICT (id) DO NOTHING",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn fetch(pool: &PgPool) -> Result<SiteSettings, AppError> {
        Self::ensure_row(pool).await?;
        let settings = sqlx::query_as::<_, SiteSettings>(
            "SELECT id, allow_registration, updated_at FROM site_settings WHERE id = 1",
        )
        .fetch_one(pool)
        .await?;
        Ok(settings)
    }

    /// Whether self-registration is currently open. Defaults to true on a
    /// fresh datastore; a failed read fails closed.
    pub async fn is_registration_allowed(pool: &PgPool) -> bool {
        if let Err(e) = Self::ensure_row(pool).await {
            tracing::error!("Failed to initialize site settings: {}", e);
            return false;
        }

        match sqlx::query_scalar::<_, bool>(
            "SELECT allow_registration FROM site_settings WHERE id = 1",
        )
        .fetch_optional(pool)
        .await
        {
            Ok(Some(allowed)) => allowed,
            Ok(None) => true,
            Err(e) => {
                tracing::error!("Failed to read registration setting: {}", e);
                false
            }
        }
    }

    pub async fn set_allow_registration(
        pool: &PgPool,
        allowed: bool,
    ) -> Result<SiteSettings, AppError> {
        Self::ensure_row(pool).await?;
        let settings = sqlx::query_as::<_, SiteSettings>(
            "UPDATE site_settings SET allow_registration = $1, updated_at = NOW()
             WHERE id = 1
             RETURNING id, allow_registration, updated_at",
        )
        .bind(allowed)
        .fetch_one(pool)
        .await?;
        Ok(settings)
    }
}
