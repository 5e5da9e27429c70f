// src/utils/slug.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;

/// Keeps identifiers URL-friendly; a collision suffix may run slightly past it.
pub const MAX_SLUG_LENGTH: usize = 60;

/// Collisions growing unbounded indicate a data problem, so the retry loop
/// fails loudly instead of spinning.
pub const MAX_SLUG_ATTEMPTS: u32 = 100;

/// Derives a URL-safe identifier from a free-text title: lowercase, runs of
/// non-alphanumerics collapse to a single hyphen, no leading/trailing hyphen,
/// truncated to `MAX_SLUG_LENGTH`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Uniqueness probe for candidate slugs. The allocator only computes; the
/// probe is the single point that touches existing records.
#[async_trait]
pub trait SlugProbe {
    async fn is_taken(&self, slug: &str) -> Result<bool, AppError>;
}

/// Probe over the projects table, excluding the record being edited so an
/// unchanged title is a non-collision with itself.
pub struct ProjectSlugs<'a> {
    pool: &'a PgPool,
    exclude_id: Option<i64>,
}

impl<'a> ProjectSlugs<'a> {
    pub fn new(pool: &'a PgPool, exclude_id: Option<i64>) -> Self {
        Self { pool, exclude_id }
    }
}

#[async_trait]
impl SlugProbe for ProjectSlugs<'_> {
    async fn is_taken(&self, slug: &str) -> Result<bool, AppError> {
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM projects WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2)",
        )
        .bind(slug)
        .bind(self.exclude_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(existing.is_some())
    }
}

/// Computes a slug for `title` that is unique per `probe`, appending `-1`,
/// `-2`, ... on collision. Pure compute: nothing is written until the caller
/// persists the record.
pub async fn allocate<P: SlugProbe + Sync>(title: &str, probe: &P) -> Result<String, AppError> {
    let base = slugify(title);
    if base.is_empty() {
        return Err(AppError::BadRequest(
            "Title must contain at least one alphanumeric character".to_string(),
        ));
    }

    let mut candidate = base.clone();
    let mut attempt: u32 = 0;

    while probe.is_taken(&candidate).await? {
        attempt += 1;
        if attempt > MAX_SLUG_ATTEMPTS {
            return Err(AppError::Conflict(format!(
                "Could not find a unique slug for '{}' within {} attempts",
                base, MAX_SLUG_ATTEMPTS
            )));
        }
        candidate = format!("{}-{}", base, attempt);
    }

    Ok(candidate)
}
