// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use validator::ValidationErrors;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 400 Bad Request with a field -> messages map (user-correctable)
    Validation(ValidationErrors),

    // 401 Unauthorized. Carries no detail: the caller must not be able to
    // tell an unknown email apart from a wrong password.
    AuthFailure,

    // 403 Forbidden, surfaced as a form-level error (registration closed)
    Forbidden(String),

    // 409 Conflict (duplicate email, slug retry budget exceeded)
    Conflict(String),

    // 404 Not Found
    NotFound(String),

    // 400 Bad Request (non-field-level, e.g. malformed query params)
    BadRequest(String),

    // 500 Internal Server Error. Detail is logged, never sent to the caller.
    Infrastructure(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Flattens `ValidationErrors` into a field -> messages map, matching the
/// error shape the admin forms consume.
fn field_error_map(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    for (field, errs) in errors.field_errors() {
        let messages: Vec<String> = errs
            .iter()
            .map(|e| {
                e.message
                    .clone()
                    .unwrap_or_else(|| e.code.clone())
                    .to_string()
            })
            .collect();
        map.insert(field.to_string(), messages);
    }
    map
}

/// Implements `IntoResponse` for `AppError`.
///
/// Form-flow outcomes (validation, auth, conflict) render as an `errors`
/// map with `_form` carrying form-level messages; resource errors render
/// as a single `error` string.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": field_error_map(&errors) })),
            )
                .into_response(),
            AppError::AuthFailure => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "errors": { "_form": ["Invalid email or password"] } })),
            )
                .into_response(),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "errors": { "_form": [msg] } })),
            )
                .into_response(),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                Json(json!({ "errors": { "_form": [msg] } })),
            )
                .into_response(),
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Infrastructure(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError::Infrastructure`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Infrastructure(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// True when a database error is a unique-constraint violation, used to
/// map insert races (duplicate email, duplicate slug) to `Conflict`.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
        password: String,
    }

    #[test]
    fn validation_errors_flatten_to_field_map() {
        let err = Probe {
            password: "short".into(),
        }
        .validate()
        .unwrap_err();

        let map = field_error_map(&err);
        assert_eq!(
            map.get("password").unwrap(),
            &vec!["Password must be at least 8 characters".to_string()]
        );
    }
}
