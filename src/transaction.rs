//! Code for creating the transactions table and recording income and expense
//! events against bank accounts.
//!
//! Creating a transaction and adjusting the owning account's balance happen
//! in the same SQL transaction, so the ledger cannot observe one write
//! without the other. Deleting a transaction does NOT reverse its earlier
//! balance adjustment: account balances reflect every transaction ever
//! applied, while the summary in [summarize_transactions] reflects only the
//! rows that currently exist. See `deleting_transaction_does_not_restore_balance`
//! in the tests below.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Transaction as SqlTransaction, TransactionBehavior, types::Type,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    account::{AccountId, adjust_balance, get_account},
    user::UserID,
};

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

/// The two kinds of monetary event a transaction can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money flowing into an account.
    Income,
    /// Money flowing out of an account.
    Expense,
}

impl TransactionKind {
    /// The string stored in the transactions table's type column.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The signed delta that `amount` applies to an account balance:
    /// positive for income, negative for expense.
    pub fn signed(&self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(Error::UnrecognizedTransactionKind(other.to_owned())),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single income or expense event affecting exactly one account.
///
/// Transactions are immutable once created; there is no edit operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID for the transaction.
    pub id: TransactionId,
    /// The ID of the user that recorded the transaction.
    pub user_id: UserID,
    /// The ID of the account the transaction applies to.
    pub account_id: AccountId,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The transaction amount. Always positive; the sign of the balance
    /// adjustment comes from `kind`.
    pub amount: f64,
    /// A user supplied label such as "salary" or "food".
    pub category: String,
    /// Free form notes about the transaction.
    pub description: Option<String>,
    /// When the transaction was recorded. Assigned by the server.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data for creating a new transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    /// The ID of the account the transaction applies to. Must be owned by
    /// the user creating the transaction.
    pub account_id: AccountId,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The transaction amount. Must be a positive, finite number.
    pub amount: f64,
    /// A user supplied label such as "salary" or "food".
    pub category: String,
    /// Free form notes about the transaction.
    #[serde(default)]
    pub description: Option<String>,
}

/// The income and expense totals derived from a user's transactions.
///
/// This is a stateless projection recomputed from the transactions table on
/// every request. It is independent of per account balances and the two can
/// diverge, because deleting a transaction removes it from these totals but
/// leaves account balances untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// The sum of all income amounts.
    pub income: f64,
    /// The sum of all expense amounts.
    pub expense: f64,
    /// `income - expense`.
    pub balance: f64,
}

/// Create the transactions table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                account_id INTEGER NOT NULL,
                type TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id),
                FOREIGN KEY(account_id) REFERENCES accounts(id)
                )",
        (),
    )?;

    Ok(())
}

fn map_row_to_transaction(row: &rusqlite::Row) -> Result<Transaction, rusqlite::Error> {
    let raw_kind: String = row.get(3)?;
    let kind = raw_kind
        .parse::<TransactionKind>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        account_id: row.get(2)?,
        kind,
        amount: row.get(4)?,
        category: row.get(5)?,
        description: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Record a new transaction for `user_id` and adjust the referenced
/// account's balance by the transaction's signed amount.
///
/// The row insert and the balance adjustment run in one SQL transaction:
/// both commit or neither does. The referenced account must be owned by
/// `user_id`; the check happens here rather than relying on the foreign key,
/// which cannot see the user/account pairing.
///
/// # Errors
///
/// This function will return an error if:
/// - `amount` is not a positive, finite number ([Error::InvalidAmount]),
/// - the account does not exist or belongs to another user
///   ([Error::NotFound], so that foreign accounts cannot be probed),
/// - or there was some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if !new_transaction.amount.is_finite() || new_transaction.amount <= 0.0 {
        return Err(Error::InvalidAmount(new_transaction.amount));
    }

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let account = get_account(new_transaction.account_id, user_id, &sql_transaction)?;

    let created_at = OffsetDateTime::now_utc();
    sql_transaction.execute(
        "INSERT INTO transactions (user_id, account_id, type, amount, category, description, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            user_id.as_i64(),
            account.id,
            new_transaction.kind.as_str(),
            new_transaction.amount,
            &new_transaction.category,
            &new_transaction.description,
            &created_at,
        ),
    )?;
    let id = sql_transaction.last_insert_rowid();

    adjust_balance(
        account.id,
        new_transaction.kind.signed(new_transaction.amount),
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(Transaction {
        id,
        user_id,
        account_id: account.id,
        kind: new_transaction.kind,
        amount: new_transaction.amount,
        category: new_transaction.category,
        description: new_transaction.description,
        created_at,
    })
}

/// Get all transactions recorded by `user_id` across all their accounts, in
/// creation order.
///
/// # Errors
///
/// This function will return an error if there is an SQL error.
pub fn list_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, account_id, type, amount, category, description, created_at
                FROM transactions WHERE user_id = :user_id ORDER BY id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_transaction)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
        .collect()
}

/// Delete the transaction with `transaction_id` if it is owned by `user_id`.
///
/// An ID that does not exist, or that belongs to another user, is a silent
/// no-op rather than an error, so a caller cannot learn whether the ID
/// exists. The earlier balance adjustment is NOT reversed.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn delete_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
        (transaction_id, user_id.as_i64()),
    )?;

    Ok(())
}

/// Compute the income/expense/balance totals over the transactions that
/// currently exist for `user_id`.
///
/// # Errors
///
/// This function will return an error if there is an SQL error.
pub fn summarize_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Summary, Error> {
    let (income, expense) = connection
        .prepare(
            "SELECT
                    COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0)
                FROM transactions WHERE user_id = :user_id",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], |row| {
            Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?))
        })?;

    Ok(Summary {
        income,
        expense,
        balance: income - expense,
    })
}
