//! This file defines the route for handling log-in requests.
//! The auth_cookie module handles the lower level cookie auth logic.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{Error, auth_cookie::set_auth_cookie, state::AppState, user::authenticate};

/// The raw data entered by the user in the log-in form.
///
/// The username and password are stored as plain strings. There is no need
/// for validation here since they will be compared against the username and
/// password hash in the database, which have been verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Username entered during log-in.
    pub username: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client
/// receives the authenticated user's ID. Otherwise a 401 response with a
/// generic error message is returned: the client cannot tell whether the
/// username or the password was wrong.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(user_data): Json<LogInData>,
) -> Result<impl IntoResponse, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        authenticate(&user_data.username, &user_data.password, &connection)?
    };

    let updated_jar = set_auth_cookie(jar, user.id, state.cookie_duration);

    Ok((
        StatusCode::OK,
        updated_jar,
        Json(json!({ "user_id": user.id })),
    ))
}
