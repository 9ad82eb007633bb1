//! Defines the app level error type and its conversion to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided a username and password combination that does not
    /// match a registered user.
    ///
    /// An unknown username and a wrong password both produce this same value
    /// so that the two cases cannot be told apart from the outside.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// The username chosen at registration is already taken.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// An empty string was used as a username at registration.
    #[error("username cannot be empty")]
    EmptyUsername,

    /// A transaction was created with an amount that is not a positive,
    /// finite number.
    #[error("{0} is not a valid transaction amount, amounts must be positive")]
    InvalidAmount(f64),

    /// A transaction type other than "income" or "expense" was used.
    #[error("\"{0}\" is not a recognized transaction type")]
    UnrecognizedTransactionKind(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows. It is
    /// also returned for resources owned by another user, which must be
    /// indistinguishable from missing ones.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("users.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match &self {
            Error::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            Error::DuplicateUsername => (StatusCode::CONFLICT, self.to_string()),
            Error::EmptyUsername
            | Error::InvalidAmount(_)
            | Error::UnrecognizedTransactionKind(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            Error::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                )
            }
        };

        (status_code, Json(json!({ "error": error_message }))).into_response()
    }
}

#[cfg(test)]
mod error_conversion_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use super::Error;

    fn init_users_table() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        conn.execute(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
            (),
        )
        .expect("Could not create users table");

        conn
    }

    #[test]
    fn unique_username_violation_maps_to_duplicate_username() {
        let conn = init_users_table();
        conn.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)",
            ("alice", "hash"),
        )
        .unwrap();

        let error = conn
            .execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                ("alice", "otherhash"),
            )
            .expect_err("inserting a duplicate username should fail");

        assert_eq!(Error::from(error), Error::DuplicateUsername);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let conn = init_users_table();

        let error = conn
            .query_row("SELECT id FROM users WHERE username = 'nobody'", [], |row| {
                row.get::<_, i64>(0)
            })
            .expect_err("the query should return no rows");

        assert_eq!(Error::from(error), Error::NotFound);
    }

    #[test]
    fn invalid_credentials_renders_unauthorized() {
        let response = Error::InvalidCredentials.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn duplicate_username_renders_conflict() {
        let response = Error::DuplicateUsername.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_errors_render_unprocessable_entity() {
        let response = Error::InvalidAmount(-1.0).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = Error::UnrecognizedTransactionKind("transfer".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
