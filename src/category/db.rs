//! Database operations for categories.
//!
//! Every function is scoped to the user that owns the categories.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    category::{Category, CategoryName, NewCategory},
    database_id::CategoryId,
    error::{Constraint, violated_constraint},
    pagination::{DEFAULT_PAGE_LIMIT, Page},
};

/// Create the category table in the database.
///
/// Category names are unique per user. The parent category must belong to the
/// same user, which the composite foreign key on `(parent_id, user_id)` enforces.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                parent_id INTEGER,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, name),
                UNIQUE(id, user_id),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(parent_id, user_id) REFERENCES category(id, user_id)
                )",
        (),
    )?;

    Ok(())
}

/// Create a category for `user_id` and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [ErrorKind::AlreadyExists](crate::ErrorKind::AlreadyExists) if the user already has a category with the same name,
/// - [ErrorKind::Validation](crate::ErrorKind::Validation) if the user or the parent category does not exist,
/// - or [ErrorKind::Internal](crate::ErrorKind::Internal) if there is some other SQL error.
pub fn create_category(
    user_id: UserID,
    category: &NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(
            "INSERT INTO category (name, parent_id, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING id, name, parent_id, user_id, created_at, updated_at",
        )?
        .query_row(
            (
                category.name.as_ref(),
                category.parent_id,
                user_id.as_i64(),
                now,
            ),
            map_category_row,
        )
        .map_err(|error| match violated_constraint(&error) {
            Some(Constraint::Unique) => Error::already_exists(format!(
                "a category named \"{}\" already exists",
                category.name
            ))
            .with_source(error),
            Some(Constraint::ForeignKey) if category.parent_id.is_some() => {
                Error::validation("the parent category does not exist").with_source(error)
            }
            Some(Constraint::ForeignKey) => {
                Error::validation("the user does not exist").with_source(error)
            }
            _ => error.into(),
        })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
/// Returns a [ErrorKind::NotFound](crate::ErrorKind::NotFound) error if there is
/// no category with `category_id`, or if it belongs to another user.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, parent_id, user_id, created_at, updated_at
             FROM category WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_category_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a page of the categories owned by `user_id`, ordered by name.
///
/// A `limit` that is not positive falls back to [DEFAULT_PAGE_LIMIT] and a
/// negative `offset` is treated as zero. `name_filter` keeps the categories
/// whose name contains it, ignoring case.
///
/// # Errors
/// Returns an [ErrorKind::Internal](crate::ErrorKind::Internal) error if there is an SQL error.
pub fn list_categories(
    user_id: UserID,
    limit: i64,
    offset: i64,
    name_filter: Option<&str>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let page = Page::new(limit, offset, DEFAULT_PAGE_LIMIT);
    let mut query_string = String::from(
        "SELECT id, name, parent_id, user_id, created_at, updated_at
         FROM category WHERE user_id = ?1",
    );
    let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

    if let Some(name) = name_filter.map(str::trim).filter(|name| !name.is_empty()) {
        query_parameters.push(Value::Text(name.to_owned()));
        query_string.push_str(&format!(
            " AND instr(lower(name), lower(?{})) > 0",
            query_parameters.len()
        ));
    }

    query_parameters.push(Value::Integer(page.limit()));
    query_parameters.push(Value::Integer(page.offset()));
    query_string.push_str(&format!(
        " ORDER BY name COLLATE NOCASE ASC, id ASC LIMIT ?{} OFFSET ?{}",
        query_parameters.len() - 1,
        query_parameters.len()
    ));

    connection
        .prepare(&query_string)?
        .query_map(params_from_iter(query_parameters.iter()), map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;
    let raw_user_id = row.get(3)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        parent_id: row.get(2)?,
        user_id: UserID::new(raw_user_id),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
