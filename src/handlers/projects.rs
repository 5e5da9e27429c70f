// src/handlers/projects.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{error::AppError, models::project::Project};

#[derive(Debug, Deserialize)]
pub struct ProjectListParams {
    pub featured: Option<bool>,
    pub limit: Option<i64>,
}

/// Lists published projects (drafts without a slug stay invisible),
/// featured work first, newest start date first.
pub async fn list_projects(
    State(pool): State<PgPool>,
    Query(params): Query<ProjectListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, title, slug, summary, description, role, goal, image_url,
                demo_url, github_url, technologies, skills, tools, tags,
                start_date, end_date, featured, organization, created_at, updated_at
         FROM projects
         WHERE slug IS NOT NULL",
    );

    if let Some(featured) = params.featured {
        builder.push(" AND featured = ");
        builder.push_bind(featured);
    }

    builder.push(" ORDER BY featured DESC, start_date DESC NULLS LAST");

    if let Some(limit) = params.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit.clamp(1, 100));
    }

    let projects = builder
        .build_query_as::<Project>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list projects: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(projects))
}

/// Fetches a single published project by slug.
pub async fn get_project(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch project '{}': {:?}", slug, e);
            AppError::from(e)
        })?
        .ok_or(AppError::NotFound("Project not found".to_string()))?;

    Ok(Json(project))
}
