//! This file defines the route for registering a new user.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    Error, PasswordHash,
    state::AppState,
    user::{Registration, register_user},
};

/// The data entered by the user in the registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUserData {
    /// The name to register. Must not already be taken.
    pub username: String,
    /// The raw password. Only its hash is stored.
    pub password: String,
    /// The name of the bank for the user's default account.
    pub bank_name: String,
    /// The starting balance for the user's default account.
    pub initial_balance: f64,
}

/// Handler for registration requests via the POST method.
///
/// Creates the user and their default bank account as a single unit: if the
/// username is taken, neither is created and the client receives a 409
/// response.
///
/// # Errors
///
/// This function will return an error if:
/// - the username is empty or already registered,
/// - the password could not be hashed,
/// - or there was an error trying to access the store.
pub async fn create_user(
    State(state): State<AppState>,
    Json(user_data): Json<NewUserData>,
) -> Result<(StatusCode, Json<Registration>), Error> {
    let password_hash =
        PasswordHash::from_raw_password(&user_data.password, PasswordHash::DEFAULT_COST)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let registration = register_user(
        &user_data.username,
        password_hash,
        &user_data.bank_name,
        user_data.initial_balance,
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(registration)))
}
