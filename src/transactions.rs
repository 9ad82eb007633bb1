//! Route handlers for listing, creating and deleting the authenticated
//! user's transactions.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    state::AppState,
    transaction::{
        NewTransaction, Transaction, TransactionId, create_transaction, delete_transaction,
        list_transactions,
    },
    user::UserID,
};

/// A route handler for listing the authenticated user's transactions in
/// creation order.
pub async fn get_transactions(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    list_transactions(user_id, &connection).map(Json)
}

/// A route handler for recording a new transaction for the authenticated
/// user. The referenced account's balance is adjusted in the same operation.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(new_transaction): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(user_id, new_transaction, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for deleting one of the authenticated user's
/// transactions.
///
/// Responds with 204 whether or not the ID matched one of the caller's
/// transactions, so the existence of other users' transactions does not
/// leak. The transaction's earlier balance adjustment is not reversed.
pub async fn delete_transaction_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
