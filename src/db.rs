//! Initializes the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the tables for the domain models if they do not exist.
///
/// The tables are created inside a single exclusive SQL transaction so a
/// partially created schema cannot be observed.
///
/// # Errors
///
/// This function will return an error if an SQL related error occurred.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&sql_transaction)?;
    create_account_table(&sql_transaction)?;
    create_transaction_table(&sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use crate::user::count_users;

    use super::initialize;

    #[test]
    fn creates_all_tables() {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");

        initialize(&conn).expect("Could not initialize database");

        for table in ["users", "accounts", "transactions"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = :name",
                    &[(":name", table)],
                    |row| row.get(0),
                )
                .expect("Could not query sqlite_master");

            assert_eq!(count, 1, "want table {table} to exist");
        }
    }

    #[test]
    fn is_idempotent() {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");

        initialize(&conn).expect("Could not initialize database");
        initialize(&conn).expect("Initializing twice should succeed");

        assert_eq!(count_users(&conn).unwrap(), 0);
    }
}
