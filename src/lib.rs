//! Pocketledger is a web app for tracking personal income and expenses
//! across bank accounts.
//!
//! This library provides the core ledger logic (users, accounts,
//! transactions and the rules that keep account balances consistent with
//! the transaction log) and a JSON API that serves it behind cookie based
//! authentication. Core functions take the authenticated user's ID as an
//! explicit parameter and return plain data; all response shaping happens
//! in the route handlers.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod accounts;
mod auth_cookie;
mod auth_middleware;
mod db;
mod endpoints;
mod error;
mod log_in;
mod log_out;
mod logging;
mod password;
mod register;
mod routing;
mod state;
mod summary;
mod transaction;
mod transactions;
mod user;

pub use account::{Account, AccountId, adjust_balance, create_account, get_account, list_accounts};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::PasswordHash;
pub use routing::build_router;
pub use state::AppState;
pub use transaction::{
    NewTransaction, Summary, Transaction, TransactionId, TransactionKind, create_transaction,
    delete_transaction, list_transactions, summarize_transactions,
};
pub use user::{Registration, User, UserID, authenticate, count_users, register_user};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
