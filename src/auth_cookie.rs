//! Defines functions for handling user authentication with cookies.

use std::num::ParseIntError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::user::UserID;

pub(crate) const COOKIE_USER_ID: &str = "user_id";
pub(crate) const COOKIE_EXPIRY: &str = "expiry";
/// The default duration for which auth cookies are valid.
pub(crate) const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// The errors that may occur while validating the auth cookies on a request.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthError {
    /// Either the user ID or expiry cookie is missing from the cookie jar in
    /// the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The user ID or expiry cookie could not be parsed.
    #[error("could not parse auth cookie: {0}")]
    InvalidCookie(String),

    /// The expiry recorded in the auth cookies has passed.
    #[error("the session has expired")]
    SessionExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // The client gets the same response for every auth failure. The
        // details are only useful on the server.
        tracing::debug!("rejecting request: {}", self);

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "authentication required" })),
        )
            .into_response()
    }
}

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// Sets the expiry of the cookie to `duration` from the current time.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> PrivateCookieJar {
    let expiry = OffsetDateTime::now_utc() + duration;

    jar.add(
        Cookie::build((COOKIE_USER_ID, user_id.as_i64().to_string()))
            .expires(expiry)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
    .add(
        Cookie::build((COOKIE_EXPIRY, expiry.unix_timestamp().to_string()))
            .expires(expiry)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the auth cookies to an invalid value and set their max age to zero, which should delete the cookies on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_USER_ID, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
    .add(
        Cookie::build((COOKIE_EXPIRY, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the authenticated user ID from the auth cookies in `jar`.
///
/// # Errors
///
/// Returns:
/// - [AuthError::CookieMissing] if the user ID or expiry cookie are not in the cookie jar.
/// - [AuthError::InvalidCookie] if either cookie cannot be parsed.
/// - [AuthError::SessionExpired] if the recorded expiry has passed.
pub(crate) fn get_user_id_from_cookies(jar: &PrivateCookieJar) -> Result<UserID, AuthError> {
    let user_id_cookie = jar.get(COOKIE_USER_ID).ok_or(AuthError::CookieMissing)?;
    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(AuthError::CookieMissing)?;

    let expiry_timestamp: i64 = expiry_cookie
        .value()
        .parse()
        .map_err(|error: ParseIntError| AuthError::InvalidCookie(error.to_string()))?;
    let expiry = OffsetDateTime::from_unix_timestamp(expiry_timestamp)
        .map_err(|error| AuthError::InvalidCookie(error.to_string()))?;

    if expiry < OffsetDateTime::now_utc() {
        return Err(AuthError::SessionExpired);
    }

    let raw_user_id: i64 = user_id_cookie
        .value()
        .parse()
        .map_err(|error: ParseIntError| AuthError::InvalidCookie(error.to_string()))?;

    Ok(UserID::new(raw_user_id))
}
