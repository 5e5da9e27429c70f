// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique login identifier.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for self-registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// DTO for login. The optional callbackUrl is where the client is sent
/// after a successful sign-in (defaults to home).
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default, rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// DTO for the email pre-check used by the registration form.
#[derive(Debug, Deserialize)]
pub struct CheckEmailRequest {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_enforces_field_rules() {
        let ok = RegisterRequest {
            name: "Al".into(),
            email: "a@b.com".into(),
            password: "longenough1".into(),
        };
        assert!(ok.validate().is_ok());

        let short_password = RegisterRequest {
            name: "Al".into(),
            email: "a@b.com".into(),
            password: "short".into(),
        };
        let err = short_password.validate().unwrap_err();
        assert!(err.field_errors().contains_key("password"));

        let bad_email = RegisterRequest {
            name: "Al".into(),
            email: "not-an-email".into(),
            password: "longenough1".into(),
        };
        let err = bad_email.validate().unwrap_err();
        assert!(err.field_errors().contains_key("email"));

        let short_name = RegisterRequest {
            name: "A".into(),
            email: "a@b.com".into(),
            password: "longenough1".into(),
        };
        let err = short_name.validate().unwrap_err();
        assert!(err.field_errors().contains_key("name"));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            name: "Al".into(),
            email: "a@b.com".into(),
            password: "$argon2id$secret".into(),
            role: "user".into(),
            created_at: None,
            updated_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}
