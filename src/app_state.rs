//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    Error,
    config::{AppConfig, JwtKeys},
    db::Database,
    password::{PasswordHash, ValidatedPassword},
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The settings shared by every request.
    pub config: Arc<AppConfig>,

    /// The database that the services run their store operations on.
    pub db: Database,

    /// A hash at the configured bcrypt cost that log ins for unknown usernames
    /// are verified against, so they take as long as a wrong password.
    pub(crate) dummy_password_hash: PasswordHash,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, config: AppConfig) -> Result<Self, Error> {
        let dummy_password_hash = PasswordHash::new(
            ValidatedPassword::new_unchecked("not the password"),
            config.bcrypt_cost,
        )?;

        Ok(Self {
            config: Arc::new(config),
            db: Database::new(db_connection)?,
            dummy_password_hash,
        })
    }
}

// this impl tells the `AuthUser` extractor how to access the token keys from our state
impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.config.jwt_keys.clone()
    }
}
