//! Route handlers for listing and creating the authenticated user's bank
//! accounts.

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    Error,
    account::{Account, create_account, list_accounts},
    state::AppState,
    user::UserID,
};

/// The data for creating a new bank account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccountData {
    /// The name of the bank the account is held with.
    pub bank_name: String,
    /// The starting balance for the account.
    pub initial_balance: f64,
}

/// A route handler for listing the authenticated user's accounts in creation
/// order.
pub async fn get_accounts(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    list_accounts(user_id, &connection).map(Json)
}

/// A route handler for creating a new account for the authenticated user.
pub async fn create_account_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(account_data): Json<NewAccountData>,
) -> Result<(StatusCode, Json<Account>), Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let account = create_account(
        user_id,
        &account_data.bank_name,
        account_data.initial_balance,
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(account)))
}
