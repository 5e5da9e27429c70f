// src/utils/guard.rs

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{config::Config, utils::jwt::{Claims, verify_jwt}};

pub const ADMIN_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

/// Outcome of authorizing a request path against the session (or lack of one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// Send to the login page, carrying the original path so the user lands
    /// back where they were headed after signing in.
    RedirectToLogin { callback: String },
    RedirectHome,
}

fn is_admin_path(path: &str) -> bool {
    path == ADMIN_PREFIX || path.starts_with("/admin/")
}

/// Rule table, evaluated in order, first match wins. Re-evaluated on every
/// request; decisions are never cached.
pub fn authorize(path: &str, claims: Option<&Claims>) -> RouteDecision {
    let is_admin = claims.map(Claims::is_admin).unwrap_or(false);

    if is_admin_path(path) && !is_admin {
        return RouteDecision::RedirectToLogin {
            callback: path.to_string(),
        };
    }

    if (path == LOGIN_PATH || path == REGISTER_PATH) && claims.is_some() {
        return RouteDecision::RedirectHome;
    }

    RouteDecision::Allow
}

/// Percent-encodes a path for use as a callbackUrl query value.
/// Everything outside the RFC 3986 unreserved set is escaped, slashes included.
fn encode_callback(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Axum Middleware: Route Guard.
///
/// Decodes the optional 'Authorization: Bearer <token>' session, injects the
/// decoded `Claims` into request extensions for handlers, and enforces the
/// rule table. An invalid or expired token counts as no session at all.
pub async fn route_guard(
    State(config): State<Config>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| verify_jwt(token, &config.jwt_secret).ok());

    if let Some(claims) = &claims {
        req.extensions_mut().insert(claims.clone());
    }

    match authorize(req.uri().path(), claims.as_ref()) {
        RouteDecision::Allow => next.run(req).await,
        RouteDecision::RedirectToLogin { callback } => Redirect::temporary(&format!(
            "{}?callbackUrl={}",
            LOGIN_PATH,
            encode_callback(&callback)
        ))
        .into_response(),
        RouteDecision::RedirectHome => Redirect::temporary("/").into_response(),
    }
}
