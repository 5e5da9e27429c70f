// src/handlers/resume.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        certification::Certification, education::Education, experience::Experience,
        profile::Profile,
    },
};

/// The portfolio owner's profile. The latest row is canonical; null when
/// nothing has been entered yet.
pub async fn get_profile(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let profile = sqlx::query_as::<_, Profile>(
        "SELECT * FROM resume_profile ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(&pool)
    .await?;

    Ok(Json(profile))
}

pub async fn list_experience(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let experience = sqlx::query_as::<_, Experience>(
        "SELECT * FROM experience ORDER BY start_date DESC NULLS LAST",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(experience))
}

pub async fn list_education(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let education = sqlx::query_as::<_, Education>(
        "SELECT * FROM education ORDER BY start_date DESC NULLS LAST",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(education))
}

pub async fn list_certifications(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let certifications = sqlx::query_as::<_, Certification>(
        "SELECT * FROM certifications ORDER BY issue_date DESC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(certifications))
}
