// src/handlers/admin.rs

use std::sync::LazyLock;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        certification::{Certification, CertificationPayload},
        education::{Education, EducationPayload},
        experience::{Experience, ExperiencePayload},
        profile::{Profile, ProfilePayload},
        project::{Project, ProjectPayload},
        settings::{SiteSettings, UpdateSettingsRequest},
        user::User,
    },
    utils::{
        hash::hash_password,
        html::{clean_html, clean_paragraphs},
        jwt::Claims,
        slug::{ProjectSlugs, allocate, slugify},
    },
};

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

// ---------------------------------------------------------------------------
// Projects

/// Lists every project including unpublished drafts, for the admin table.
pub async fn list_all_projects(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let projects = sqlx::query_as::<_, Project>(
        "SELECT * FROM projects ORDER BY featured DESC, start_date DESC NULLS LAST",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(projects))
}

/// Creates a new project. The slug is computed before the write: derived
/// from the title when absent, normalized and uniqueness-checked when
/// supplied.
pub async fn create_project(
    State(pool): State<PgPool>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.sanitize();
    payload.validate()?;

    let slug_source = payload.slug.clone().unwrap_or_else(|| payload.title.clone());
    let slug = allocate(&slug_source, &ProjectSlugs::new(&pool, None)).await?;

    let project = insert_project(&pool, &payload, &slug).await?;

    tracing::info!("Created project {} ('{}')", project.id, slug);
    Ok((StatusCode::CREATED, Json(project)))
}

/// Updates a project by id. The record's own slug is excluded from the
/// collision probe, so an unchanged title keeps its slug.
pub async fn update_project(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<ProjectPayload>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.sanitize();
    payload.validate()?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    let slug_source = payload.slug.clone().unwrap_or_else(|| payload.title.clone());
    let slug = allocate(&slug_source, &ProjectSlugs::new(&pool, Some(id))).await?;

    let project = sqlx::query_as::<_, Project>(
        r#"
        UPDATE projects SET
            title = $1, slug = $2, summary = $3, description = $4, role = $5,
            goal = $6, image_url = $7, demo_url = $8, github_url = $9,
            technologies = $10, skills = $11, tools = $12, tags = $13,
            start_date = $14, end_date = $15, featured = $16, organization = $17,
            updated_at = NOW()
        WHERE id = $18
        RETURNING *
        "#,
    )
    .bind(&payload.title)
    .bind(&slug)
    .bind(&payload.summary)
    .bind(&payload.description)
    .bind(&payload.role)
    .bind(&payload.goal)
    .bind(&payload.image_url)
    .bind(&payload.demo_url)
    .bind(&payload.github_url)
    .bind(&payload.technologies)
    .bind(&payload.skills)
    .bind(&payload.tools)
    .bind(&payload.tags)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.featured)
    .bind(&payload.organization)
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("A project with this slug already exists".to_string())
        } else {
            tracing::error!("Failed to update project {}: {:?}", id, e);
            AppError::from(e)
        }
    })?;

    Ok(Json(project))
}

async fn insert_project(
    pool: &PgPool,
    payload: &ProjectPayload,
    slug: &str,
) -> Result<Project, AppError> {
    sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects
            (title, slug, summary, description, role, goal, image_url, demo_url,
             github_url, technologies, skills, tools, tags, start_date, end_date,
             featured, organization)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING *
        "#,
    )
    .bind(&payload.title)
    .bind(slug)
    .bind(&payload.summary)
    .bind(&payload.description)
    .bind(&payload.role)
    .bind(&payload.goal)
    .bind(&payload.image_url)
    .bind(&payload.demo_url)
    .bind(&payload.github_url)
    .bind(&payload.technologies)
    .bind(&payload.skills)
    .bind(&payload.tools)
    .bind(&payload.tags)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.featured)
    .bind(&payload.organization)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        // The allocator already probed for collisions; losing the race to a
        // concurrent insert still lands here.
        if is_unique_violation(&e) {
            AppError::Conflict("A project with this slug already exists".to_string())
        } else {
            tracing::error!("Failed to create project: {:?}", e);
            AppError::from(e)
        }
    })
}

/// Deletes a project by id.
pub async fn delete_project(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete project {}: {:?}", id, e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CheckSlugParams {
    pub slug: Option<String>,
    /// The record's current slug in edit mode: an unchanged slug is
    /// available by definition.
    #[serde(rename = "currentSlug")]
    pub current_slug: Option<String>,
}

/// Availability check backing the project form's slug field.
pub async fn check_slug(
    State(pool): State<PgPool>,
    Query(params): Query<CheckSlugParams>,
) -> Result<impl IntoResponse, AppError> {
    let slug = params
        .slug
        .ok_or(AppError::BadRequest("Slug parameter is required".to_string()))?;

    if !SLUG_RE.is_match(&slug) {
        return Err(AppError::BadRequest(
            "Slug may only contain lowercase letters, digits and hyphens".to_string(),
        ));
    }

    if params.current_slug.as_deref() == Some(slug.as_str()) {
        return Ok(Json(json!({ "available": true })));
    }

    let taken = sqlx::query_scalar::<_, i64>("SELECT id FROM projects WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&pool)
        .await?
        .is_some();

    Ok(Json(json!({ "available": !taken })))
}

/// Backfills slugs for drafts created before slugs existed. Titles with no
/// slug material are skipped rather than aborting the whole run.
pub async fn generate_slugs(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let drafts = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, title FROM projects WHERE slug IS NULL OR slug = ''",
    )
    .fetch_all(&pool)
    .await?;

    let mut updated = Vec::new();

    for (id, title) in drafts {
        if slugify(&title).is_empty() {
            tracing::warn!("Project {} has no slug material in its title, skipping", id);
            continue;
        }

        let slug = allocate(&title, &ProjectSlugs::new(&pool, Some(id))).await?;

        sqlx::query("UPDATE projects SET slug = $1, updated_at = NOW() WHERE id = $2")
            .bind(&slug)
            .bind(id)
            .execute(&pool)
            .await?;

        updated.push(json!({ "id": id, "title": title, "slug": slug }));
    }

    Ok(Json(json!({
        "message": format!("Updated {} projects with generated slugs", updated.len()),
        "updated_projects": updated,
    })))
}

// ---------------------------------------------------------------------------
// Resume

/// Upserts the profile: updates the latest row, inserting the first one if
/// none exists yet.
pub async fn upsert_profile(
    State(pool): State<PgPool>,
    Json(payload): Json<ProfilePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let summary = payload.summary.as_deref().map(clean_html);

    let updated = sqlx::query_as::<_, Profile>(
        r#"
        UPDATE resume_profile SET
            name = $1, location = $2, phone = $3, email = $4, linkedin = $5,
            github_link = $6, title = $7, summary = $8, bio_photo = $9,
            updated_at = NOW()
        WHERE id = (SELECT id FROM resume_profile ORDER BY id DESC LIMIT 1)
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.location)
    .bind(&payload.phone)
    .bind(&payload.email)
    .bind(&payload.linkedin)
    .bind(&payload.github_link)
    .bind(&payload.title)
    .bind(&summary)
    .bind(&payload.bio_photo)
    .fetch_optional(&pool)
    .await?;

    if let Some(profile) = updated {
        return Ok(Json(profile));
    }

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO resume_profile
            (name, location, phone, email, linkedin, github_link, title, summary, bio_photo)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.location)
    .bind(&payload.phone)
    .bind(&payload.email)
    .bind(&payload.linkedin)
    .bind(&payload.github_link)
    .bind(&payload.title)
    .bind(&summary)
    .bind(&payload.bio_photo)
    .fetch_one(&pool)
    .await?;

    Ok(Json(profile))
}

pub async fn create_experience(
    State(pool): State<PgPool>,
    Json(payload): Json<ExperiencePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let description = clean_paragraphs(payload.description);

    let experience = sqlx::query_as::<_, Experience>(
        r#"
        INSERT INTO experience
            (position, company, location, employment_type, start_date, end_date,
             current, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(&payload.position)
    .bind(&payload.company)
    .bind(&payload.location)
    .bind(&payload.employment_type)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.current)
    .bind(&description)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(experience)))
}

pub async fn update_experience(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<ExperiencePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let description = clean_paragraphs(payload.description);

    let experience = sqlx::query_as::<_, Experience>(
        r#"
        UPDATE experience SET
            position = $1, company = $2, location = $3, employment_type = $4,
            start_date = $5, end_date = $6, current = $7, description = $8,
            updated_at = NOW()
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(&payload.position)
    .bind(&payload.company)
    .bind(&payload.location)
    .bind(&payload.employment_type)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.current)
    .bind(&description)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Experience entry not found".to_string()))?;

    Ok(Json(experience))
}

pub async fn delete_experience(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM experience WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Experience entry not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_education(
    State(pool): State<PgPool>,
    Json(payload): Json<EducationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let education = sqlx::query_as::<_, Education>(
        r#"
        INSERT INTO education (degree, institution, location, start_date, end_date, gpa)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&payload.degree)
    .bind(&payload.institution)
    .bind(&payload.location)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(&payload.gpa)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(education)))
}

pub async fn update_education(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<EducationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let education = sqlx::query_as::<_, Education>(
        r#"
        UPDATE education SET
            degree = $1, institution = $2, location = $3, start_date = $4,
            end_date = $5, gpa = $6, updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(&payload.degree)
    .bind(&payload.institution)
    .bind(&payload.location)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(&payload.gpa)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Education entry not found".to_string()))?;

    Ok(Json(education))
}

pub async fn delete_education(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM education WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Education entry not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_certification(
    State(pool): State<PgPool>,
    Json(payload): Json<CertificationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if !payload.dates_ordered() {
        return Err(AppError::BadRequest(
            "Expiry date cannot be before issue date".to_string(),
        ));
    }

    let certification = sqlx::query_as::<_, Certification>(
        r#"
        INSERT INTO certifications (title, issuer, issue_date, expiry_date, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.issuer)
    .bind(payload.issue_date)
    .bind(payload.expiry_date)
    .bind(&payload.description)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(certification)))
}

pub async fn update_certification(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<CertificationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if !payload.dates_ordered() {
        return Err(AppError::BadRequest(
            "Expiry date cannot be before issue date".to_string(),
        ));
    }

    let certification = sqlx::query_as::<_, Certification>(
        r#"
        UPDATE certifications SET
            title = $1, issuer = $2, issue_date = $3, expiry_date = $4,
            description = $5, updated_at = NOW()
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.issuer)
    .bind(payload.issue_date)
    .bind(payload.expiry_date)
    .bind(&payload.description)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Certification not found".to_string()))?;

    Ok(Json(certification))
}

pub async fn delete_certification(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM certifications WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Certification not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Users

/// Lists all users in the system.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password, role, created_at, updated_at
         FROM users ORDER BY id DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(users))
}

/// DTO for updating a user. Fields are optional. Accounts are never hard
/// deleted, so role demotion is the way to revoke access.
#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// Updates user information.
pub async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if let Some(new_name) = payload.name {
        sqlx::query("UPDATE users SET name = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_name)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(new_role) = payload.role {
        if new_role != "user" && new_role != "admin" {
            return Err(AppError::BadRequest(
                "Role must be 'user' or 'admin'".to_string(),
            ));
        }
        sqlx::query("UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_role)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(new_password) = payload.password {
        if new_password.len() < 8 {
            return Err(AppError::BadRequest(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        let hashed = hash_password(&new_password)?;
        sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(&hashed)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// Settings

pub async fn get_settings(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let settings = SiteSettings::fetch(&pool).await?;
    Ok(Json(settings))
}

/// The registration toggle's only write path. The route guard guarantees
/// the claims extension is present and carries the admin role here.
pub async fn update_settings(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let settings = SiteSettings::set_allow_registration(&pool, payload.allow_registration).await?;

    tracing::info!(
        "User {} turned self-registration {}",
        claims.sub,
        if settings.allow_registration { "on" } else { "off" }
    );
    Ok(Json(settings))
}
