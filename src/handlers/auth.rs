// src/handlers/auth.rs

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::{
        settings::SiteSettings,
        user::{CheckEmailRequest, LoginRequest, RegisterRequest, User},
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::{sign_jwt, verify_jwt},
    },
};

/// Registers a new user.
///
/// Flow: registration gate -> field validation -> duplicate check -> hash
/// -> insert. A duplicate email lost to a concurrent insert still surfaces
/// as a conflict via the unique constraint.
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !SiteSettings::is_registration_allowed(&pool).await {
        return Err(AppError::Forbidden(
            "Registration is currently disabled".to_string(),
        ));
    }

    payload.validate()?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Duplicate-email check failed: {:?}", e);
            AppError::from(e)
        })?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password, role)
        VALUES ($1, $2, $3, 'user')
        RETURNING id, name, email, password, role, created_at, updated_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("User with this email already exists".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!("Registered user {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a session JWT.
///
/// Unknown email, missing stored hash, and wrong password all collapse into
/// the same generic failure so callers cannot enumerate accounts.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password, role, created_at, updated_at
         FROM users WHERE email = $1",
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::from(e)
    })?;

    let user = user.ok_or(AppError::AuthFailure)?;

    if user.password.is_empty() {
        return Err(AppError::AuthFailure);
    }

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthFailure);
    }

    let token = sign_jwt(
        user.id,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    let redirect_to = payload.callback_url.unwrap_or_else(|| "/".to_string());

    tracing::info!("User {} logged in", user.id);
    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "redirect_to": redirect_to,
    })))
}

/// Ends the session on the client side. Tokens are stateless, so there is
/// nothing to revoke server-side; the client discards the token.
pub async fn logout() -> impl IntoResponse {
    Json(json!({ "redirect_to": "/" }))
}

/// Echoes the current session, or null when the request carries no valid
/// token.
pub async fn session(State(config): State<Config>, headers: HeaderMap) -> impl IntoResponse {
    let user = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| verify_jwt(token, &config.jwt_secret).ok())
        .map(|c| {
            json!({
                "id": c.sub,
                "role": c.role,
            })
        });

    Json(json!({ "user": user }))
}

/// Pre-checks whether an email is already registered, used by the
/// registration form before submit.
pub async fn check_email(
    State(pool): State<PgPool>,
    Json(payload): Json<CheckEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
        .bind(payload.email.trim())
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Email check failed: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(json!({ "exists": existing.is_some() })))
}
