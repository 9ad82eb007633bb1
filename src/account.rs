//! Code for creating the accounts table and maintaining per user bank
//! accounts and their running balances.

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, user::UserID};

/// Alias for the integer type used for account IDs.
pub type AccountId = i64;

/// A bank account owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The ID for the account.
    pub id: AccountId,
    /// The ID of the user that owns the account.
    pub user_id: UserID,
    /// The name of the bank the account is held with.
    pub bank_name: String,
    /// The current balance.
    ///
    /// Mutated only through [adjust_balance] after creation.
    pub balance: f64,
}

/// Create the accounts table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                bank_name TEXT NOT NULL,
                balance REAL NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id)
                )",
        (),
    )?;

    Ok(())
}

pub(crate) fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        bank_name: row.get(2)?,
        balance: row.get(3)?,
    })
}

/// Create and insert a new account for `user_id` with the given starting
/// balance. No other account is touched.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn create_account(
    user_id: UserID,
    bank_name: &str,
    initial_balance: f64,
    connection: &Connection,
) -> Result<Account, Error> {
    connection.execute(
        "INSERT INTO accounts (user_id, bank_name, balance) VALUES (?1, ?2, ?3)",
        (user_id.as_i64(), bank_name, initial_balance),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        user_id,
        bank_name: bank_name.to_owned(),
        balance: initial_balance,
    })
}

/// Get all accounts owned by `user_id`, in creation order.
///
/// A user ID without accounts yields an empty list, not an error.
///
/// # Errors
///
/// This function will return an error if there is an SQL error.
pub fn list_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, bank_name, balance FROM accounts
                WHERE user_id = :user_id ORDER BY id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::SqlError))
        .collect()
}

/// Get the account with `account_id`, scoped to its owner.
///
/// # Errors
///
/// This function will return an error if:
/// - the account does not exist, or exists but is not owned by `user_id`.
///   Both cases return [Error::NotFound] so that one user cannot probe for
///   another user's account IDs.
/// - there was an error trying to access the store.
pub fn get_account(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, user_id, bank_name, balance FROM accounts
                WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((account_id, user_id.as_i64()), map_row_to_account)
        .map_err(|error| error.into())
}

/// Apply a signed `delta` to the balance of the account with `account_id`.
///
/// Called exactly once per transaction creation and never on deletion.
/// Initial balances are set when the account row is inserted, not through
/// this function.
///
/// # Errors
///
/// This function will return an error if:
/// - `account_id` does not refer to an existing account ([Error::NotFound]),
/// - or there was some other SQL error.
pub fn adjust_balance(
    account_id: AccountId,
    delta: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_updated = connection.execute(
        "UPDATE accounts SET balance = balance + ?1 WHERE id = ?2",
        (delta, account_id),
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
