// src/models/project.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use url::Url;
use validator::Validate;

use crate::utils::html::{clean_html, clean_paragraphs};

/// Represents the 'projects' table in the database.
/// A project with a NULL slug is an unpublished draft and is invisible on
/// the public routes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,

    pub title: String,

    /// URL identifier, unique across all projects once assigned.
    pub slug: Option<String>,

    pub summary: Option<String>,

    /// Free-text paragraphs describing the work.
    pub description: Vec<String>,

    /// The author's role on the project (e.g., "Lead Engineer").
    pub role: Option<String>,

    pub goal: Option<String>,

    pub image_url: Option<String>,
    pub demo_url: Option<String>,
    pub github_url: Option<String>,

    pub technologies: Vec<String>,
    pub skills: Vec<String>,
    pub tools: Vec<String>,
    pub tags: Vec<String>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub featured: bool,

    pub organization: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating or updating a project. Slug is derived from the title
/// when absent; when supplied it is normalized and uniqueness-checked
/// before the write.
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectPayload {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    pub slug: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Vec<String>,
    pub role: Option<String>,
    pub goal: Option<String>,

    #[validate(custom(function = validate_url_string))]
    pub image_url: Option<String>,
    #[validate(custom(function = validate_url_string))]
    pub demo_url: Option<String>,
    #[validate(custom(function = validate_url_string))]
    pub github_url: Option<String>,

    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub featured: bool,

    pub organization: Option<String>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

fn trim_to_option(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn drop_blank_entries(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

impl ProjectPayload {
    /// Form-side cleanup before validation and persistence: trimmed title,
    /// sanitized free text, blank array entries dropped.
    pub fn sanitize(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.slug = trim_to_option(self.slug);
        self.summary = trim_to_option(self.summary).map(|s| clean_html(&s));
        self.description = clean_paragraphs(self.description);
        self.role = trim_to_option(self.role);
        self.goal = trim_to_option(self.goal).map(|g| clean_html(&g));
        self.image_url = trim_to_option(self.image_url);
        self.demo_url = trim_to_option(self.demo_url);
        self.github_url = trim_to_option(self.github_url);
        self.technologies = drop_blank_entries(self.technologies);
        self.skills = drop_blank_entries(self.skills);
        self.tools = drop_blank_entries(self.tools);
        self.tags = drop_blank_entries(self.tags);
        self.organization = trim_to_option(self.organization);
        self
    }
}
