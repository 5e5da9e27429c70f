// src/models/certification.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'certifications' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Certification {
    pub id: i64,
    pub title: String,
    pub issuer: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CertificationPayload {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Issuer is required"))]
    pub issuer: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl CertificationPayload {
    /// issue_date <= expiry_date whenever an expiry is present.
    pub fn dates_ordered(&self) -> bool {
        match self.expiry_date {
            Some(expiry) => self.issue_date <= expiry,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(issue: &str, expiry: Option<&str>) -> CertificationPayload {
        CertificationPayload {
            title: "Certified Kubernetes Administrator".into(),
            issuer: "CNCF".into(),
            issue_date: issue.parse().unwrap(),
            expiry_date: expiry.map(|e| e.parse().unwrap()),
            description: None,
        }
    }

    #[test]
    fn expiry_before_issue_is_rejected() {
        assert!(!payload("2024-06-01", Some("2023-06-01")).dates_ordered());
        assert!(payload("2024-06-01", Some("2027-06-01")).dates_ordered());
        assert!(payload("2024-06-01", None).dates_ordered());
        // Same-day issue and expiry is valid.
        assert!(payload("2024-06-01", Some("2024-06-01")).dates_ordered());
    }
}
