//! Code for creating the user table and storing and fetching user credentials.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    error::{Constraint, violated_constraint},
    password::PasswordHash,
};

/// The minimum number of characters in a username.
pub const MIN_USERNAME_LENGTH: usize = 3;
/// The maximum number of characters in a username.
pub const MAX_USERNAME_LENGTH: usize = 50;

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

/// A username that is between [MIN_USERNAME_LENGTH] and [MAX_USERNAME_LENGTH] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Username(String);

impl Username {
    /// Create a username from a raw string.
    ///
    /// Leading and trailing whitespace is removed before validation.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the trimmed name is too short or too long.
    pub fn new(raw_username: &str) -> Result<Self, Error> {
        let username = raw_username.trim();
        let length = username.chars().count();

        if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
            return Err(Error::validation(format!(
                "username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters long"
            )));
        }

        Ok(Self(username.to_owned()))
    }

    /// Create a username without validation.
    ///
    /// The caller should ensure that the string is a valid username.
    pub fn new_unchecked(raw_username: &str) -> Self {
        Self(raw_username.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered user of the application.
///
/// The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's unique name.
    pub username: Username,
    /// The user's password hash.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// This function will return a:
/// - [ErrorKind::AlreadyExists](crate::ErrorKind::AlreadyExists) if the username is taken,
/// - or [ErrorKind::Internal](crate::ErrorKind::Internal) if there is some other SQL error.
pub fn create_user(
    username: &Username,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(
            "INSERT INTO user (username, password, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             RETURNING id, username, password, created_at, updated_at",
        )?
        .query_row(
            (username.as_ref(), password_hash.as_ref(), now),
            map_user_row,
        )
        .map_err(|error| match violated_constraint(&error) {
            Some(Constraint::Unique) => {
                Error::already_exists(format!("the username \"{username}\" is already taken"))
                    .with_source(error)
            }
            _ => error.into(),
        })
}

/// Get the user from the database with the username `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered user,
/// - or there was an error trying to access the store.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, password, created_at, updated_at FROM user WHERE username = :username",
        )?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_username: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(raw_id),
        username: Username::new_unchecked(&raw_username),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}


#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        ErrorKind,
        password::PasswordHash,
        user::{Username, create_user, get_user_by_username},
    };

    use super::create_user_table;

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();
        let username = Username::new_unchecked("alice");
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let inserted_user = create_user(&username, &password_hash, &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.username, username);
        assert_eq!(inserted_user.password_hash, password_hash);
    }

    #[test]
    fn insert_user_fails_on_duplicate_username() {
        let db_connection = get_db_connection();
        let username = Username::new_unchecked("alice");
        create_user(
            &username,
            &PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let result = create_user(
            &username,
            &PasswordHash::new_unchecked("hunter3"),
            &db_connection,
        );

        assert_eq!(result.unwrap_err().kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn get_user_by_username_succeeds() {
        let db_connection = get_db_connection();
        let test_user = create_user(
            &Username::new_unchecked("alice"),
            &PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .unwrap();

        let retrieved_user = get_user_by_username("alice", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_username_fails_with_unknown_username() {
        let db_connection = get_db_connection();

        let result = get_user_by_username("nobody", &db_connection);

        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn serialized_user_omits_password_hash() {
        let db_connection = get_db_connection();
        let user = create_user(
            &Username::new_unchecked("alice"),
            &PasswordHash::new_unchecked("supersecrethash"),
            &db_connection,
        )
        .unwrap();

        let json = serde_json::to_string(&user).unwrap();

        assert!(!json.contains("supersecrethash"));
        assert!(json.contains("\"username\":\"alice\""));
    }
}
