//! This file defines the route for logging out.

use axum::{Json, http::StatusCode, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;

use crate::auth_cookie::invalidate_auth_cookie;

/// Handler for log-out requests.
///
/// Invalidates the auth cookies. Safe to call without a session: logging out
/// twice is not an error.
pub async fn get_log_out(jar: PrivateCookieJar) -> impl IntoResponse {
    (
        StatusCode::OK,
        invalidate_auth_cookie(jar),
        Json(json!({ "message": "logged out" })),
    )
}
