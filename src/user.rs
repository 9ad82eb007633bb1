//! Code for creating the users table, registering users and verifying
//! credentials.

use std::fmt::Display;

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::{
    Error, PasswordHash,
    account::{Account, create_account},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The caller should ensure that `id` is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user registered and logs in with.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// The result of registering a new user: the new user's ID and their default
/// bank account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    /// The ID of the newly created user.
    pub user_id: UserID,
    /// The default account created alongside the user.
    pub account: Account,
}

/// Create the users table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new user along with their default bank account.
///
/// The user row and the account row are written in a single SQL transaction:
/// on any failure neither row exists afterwards. The new user's ID is taken
/// from `last_insert_rowid`, so no re-select by username happens.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` is empty or whitespace ([Error::EmptyUsername]),
/// - `username` is already registered ([Error::DuplicateUsername]),
/// - or there was some other SQL error.
pub fn register_user(
    username: &str,
    password_hash: PasswordHash,
    bank_name: &str,
    initial_balance: f64,
    connection: &Connection,
) -> Result<Registration, Error> {
    if username.trim().is_empty() {
        return Err(Error::EmptyUsername);
    }

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    sql_transaction.execute(
        "INSERT INTO users (username, password) VALUES (?1, ?2)",
        (username, password_hash.as_ref()),
    )?;
    let user_id = UserID::new(sql_transaction.last_insert_rowid());

    let account = create_account(user_id, bank_name, initial_balance, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(Registration { user_id, account })
}

/// Check `username` and `password` against the registered users.
///
/// Returns the matching user on success. An unknown username and a wrong
/// password both return [Error::InvalidCredentials] so that callers cannot
/// tell which of the two was wrong.
///
/// # Errors
///
/// This function will return an error if:
/// - the credentials do not match a registered user ([Error::InvalidCredentials]),
/// - or there was an error trying to access the store.
pub fn authenticate(username: &str, password: &str, connection: &Connection) -> Result<User, Error> {
    let user = match get_user_by_username(username, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    match user.password_hash.verify(password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(Error::InvalidCredentials),
        Err(error) => Err(Error::HashingError(error.to_string())),
    }
}

/// Get the user from the database with a username equal to `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password FROM users WHERE username = :username")?
        .query_row(&[(":username", username)], |row| {
            let raw_id = row.get(0)?;
            let username: String = row.get(1)?;
            let raw_password_hash: String = row.get(2)?;

            Ok(User {
                id: UserID::new(raw_id),
                username,
                password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            })
        })
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM users;", [], |row| {
            row.get::<_, i64>(0).map(|count| count as usize)
        })
        .map_err(|error| error.into())
}
