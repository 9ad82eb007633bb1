//! Route handler for the authenticated user's income/expense summary.

use axum::{Extension, Json, extract::State};

use crate::{
    Error,
    state::AppState,
    transaction::{Summary, summarize_transactions},
    user::UserID,
};

/// A route handler for the authenticated user's aggregate summary.
///
/// The totals are recomputed from the transactions table on every request
/// and are independent of per account balances.
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Summary>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    summarize_transactions(user_id, &connection).map(Json)
}
