//! Database operations for transactions.
//!
//! Soft deleted transactions stay in the table with `deleted_at` set and are
//! invisible to every read.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    database_id::TransactionId,
    error::{Constraint, violated_constraint},
    pagination::{DEFAULT_PAGE_LIMIT, Page},
    transaction::{Amount, NewTransaction, Transaction, TransactionFilter},
};

/// Create the transaction table and its listing index.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT,
                amount INTEGER NOT NULL CHECK (amount > 0),
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                date TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id, user_id) REFERENCES category(id, user_id)
                );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date
            ON \"transaction\"(user_id, date DESC, id DESC);",
    )?;

    Ok(())
}

const SELECT_TRANSACTION: &str = "SELECT t.id, t.description, t.amount, t.type, t.date, t.category_id, c.name, t.user_id, t.created_at, t.updated_at
     FROM \"transaction\" t INNER JOIN category c ON c.id = t.category_id
     WHERE t.user_id = ?1 AND t.deleted_at IS NULL";

const ORDER_NEWEST_FIRST: &str = " ORDER BY t.date DESC, t.id DESC";

/// Record a transaction for `user_id` and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [ErrorKind::Validation](crate::ErrorKind::Validation) if the category does not exist or
///   belongs to another user, or a column check fails,
/// - [ErrorKind::Conflict](crate::ErrorKind::Conflict) if the row clashes with a unique key,
/// - or [ErrorKind::Internal](crate::ErrorKind::Internal) if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO \"transaction\" (description, amount, type, date, category_id, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            (
                transaction.description.as_deref(),
                transaction.amount.cents(),
                transaction.kind,
                transaction.date,
                transaction.category_id,
                user_id.as_i64(),
                now,
            ),
        )
        .map_err(|error| match violated_constraint(&error) {
            Some(Constraint::ForeignKey) => {
                Error::validation(format!("category {} does not exist", transaction.category_id))
                    .with_source(error)
            }
            Some(Constraint::Check) => {
                Error::validation("the transaction has an invalid amount or type").with_source(error)
            }
            Some(Constraint::Unique) => {
                Error::conflict("the transaction already exists").with_source(error)
            }
            None => error.into(),
        })?;

    get_transaction(user_id, connection.last_insert_rowid(), connection)
}

/// Retrieve a single transaction owned by `user_id`.
///
/// # Errors
/// Returns a [ErrorKind::NotFound](crate::ErrorKind::NotFound) error if the
/// transaction does not exist, was deleted, or belongs to another user.
pub fn get_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!("{SELECT_TRANSACTION} AND t.id = ?2"))?
        .query_row((user_id.as_i64(), transaction_id), map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve a page of the transactions owned by `user_id` that match `filter`.
///
/// Transactions are ordered newest first, with ties on the date broken by the
/// most recently created. A `limit` that is not positive falls back to
/// [DEFAULT_PAGE_LIMIT] and a negative `offset` is treated as zero.
///
/// # Errors
/// Returns an [ErrorKind::Internal](crate::ErrorKind::Internal) error if there is an SQL error.
pub fn list_transactions(
    user_id: UserID,
    limit: i64,
    offset: i64,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let page = Page::new(limit, offset, DEFAULT_PAGE_LIMIT);
    let mut query_string = String::from(SELECT_TRANSACTION);
    let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

    let mut add_condition = |condition: &str, value: Value| {
        query_parameters.push(value);
        query_string.push_str(&condition.replace("?", &format!("?{}", query_parameters.len())));
    };

    if let Some(start_date) = filter.start_date {
        add_condition(" AND t.date >= ?", Value::Text(start_date.to_string()));
    }

    if let Some(end_date) = filter.end_date {
        add_condition(" AND t.date <= ?", Value::Text(end_date.to_string()));
    }

    if let Some(kind) = filter.kind {
        add_condition(" AND t.type = ?", Value::Text(kind.as_str().to_owned()));
    }

    if let Some(description) = filter
        .description
        .as_deref()
        .map(str::trim)
        .filter(|description| !description.is_empty())
    {
        add_condition(
            " AND instr(lower(coalesce(t.description, '')), lower(?)) > 0",
            Value::Text(description.to_owned()),
        );
    }

    query_parameters.push(Value::Integer(page.limit()));
    query_parameters.push(Value::Integer(page.offset()));
    query_string.push_str(&format!(
        "{ORDER_NEWEST_FIRST} LIMIT ?{} OFFSET ?{}",
        query_parameters.len() - 1,
        query_parameters.len()
    ));

    connection
        .prepare(&query_string)?
        .query_map(params_from_iter(query_parameters.iter()), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve every transaction owned by `user_id` in listing order.
///
/// # Errors
/// Returns an [ErrorKind::Internal](crate::ErrorKind::Internal) error if there is an SQL error.
pub fn export_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!("{SELECT_TRANSACTION}{ORDER_NEWEST_FIRST}"))?
        .query_map([user_id.as_i64()], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Soft delete a transaction owned by `user_id`.
///
/// # Errors
/// Returns a [ErrorKind::NotFound](crate::ErrorKind::NotFound) error if the
/// transaction does not exist, was already deleted, or belongs to another user.
pub fn delete_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let now = OffsetDateTime::now_utc();

    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET deleted_at = ?1, updated_at = ?1
         WHERE id = ?2 AND user_id = ?3 AND deleted_at IS NULL",
        (now, transaction_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::not_found("the transaction could not be found"));
    }

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_amount = row.get(2)?;
    let raw_user_id = row.get(7)?;

    Ok(Transaction {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: Amount::from_cents_unchecked(raw_amount),
        kind: row.get(3)?,
        date: row.get(4)?,
        category_id: row.get(5)?,
        category_name: row.get(6)?,
        user_id: UserID::new(raw_user_id),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
