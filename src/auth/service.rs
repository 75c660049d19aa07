//! Registers users and exchanges credentials for session tokens.

use axum::extract::FromRef;

use crate::{
    AppState, Error, ErrorKind,
    auth::{SessionToken, encode_token},
    config::JwtKeys,
    db::Database,
    password::{PasswordHash, ValidatedPassword},
    user::{User, Username, create_user, get_user_by_username},
};

const INVALID_CREDENTIALS_MSG: &str = "invalid username or password";

/// Registration and authentication on top of the credential store.
#[derive(Debug, Clone)]
pub struct AuthService {
    db: Database,
    jwt_keys: JwtKeys,
    token_duration: time::Duration,
    bcrypt_cost: u32,
    dummy_password_hash: PasswordHash,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            jwt_keys: state.config.jwt_keys.clone(),
            token_duration: state.config.token_duration,
            bcrypt_cost: state.config.bcrypt_cost,
            dummy_password_hash: state.dummy_password_hash.clone(),
        }
    }
}

impl AuthService {
    /// Create a user with `raw_username` and a salted hash of `raw_password`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [ErrorKind::Validation] if the username or password break the length rules,
    /// - [ErrorKind::AlreadyExists] if the username is taken,
    /// - or [ErrorKind::Internal] if hashing or storing failed.
    pub async fn register_user(&self, raw_username: &str, raw_password: &str) -> Result<User, Error> {
        let username = Username::new(raw_username)?;
        let password = ValidatedPassword::new(raw_password)?;
        let cost = self.bcrypt_cost;

        let password_hash = tokio::task::spawn_blocking(move || PasswordHash::new(password, cost))
            .await
            .map_err(|error| Error::internal("the password hashing task failed").with_source(error))??;

        let user = self
            .db
            .run(move |connection| create_user(&username, &password_hash, connection))
            .await?;

        tracing::info!("registered user \"{}\" with ID {}", user.username, user.id);

        Ok(user)
    }

    /// Check the credentials and issue a session token for the matching user.
    ///
    /// # Errors
    /// Returns an [ErrorKind::Unauthorized] error if there is no user with
    /// `username` or the password does not match. The two cases cannot be told apart.
    pub async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionToken, Error> {
        let lookup_username = username.trim().to_owned();
        let user = match self
            .db
            .run(move |connection| get_user_by_username(&lookup_username, connection))
            .await
        {
            Ok(user) => Some(user),
            Err(error) if error.kind() == ErrorKind::NotFound => None,
            Err(error) => return Err(error),
        };

        let password = password.to_owned();
        let dummy_password_hash = self.dummy_password_hash.clone();
        let verified_user = tokio::task::spawn_blocking(move || match user {
            Some(user) => user
                .password_hash
                .verify(&password)
                .map(|is_match| is_match.then_some(user)),
            None => {
                let _ = dummy_password_hash.verify(&password);
                Ok(None)
            }
        })
        .await
        .map_err(|error| Error::internal("the password verification task failed").with_source(error))??;

        let Some(user) = verified_user else {
            tracing::info!("failed log in attempt for username \"{}\"", username.trim());
            return Err(Error::unauthorized(INVALID_CREDENTIALS_MSG));
        };

        let session = encode_token(
            user.id,
            user.username.as_ref(),
            self.token_duration,
            &self.jwt_keys,
        )?;

        tracing::info!("user {} logged in", user.id);

        Ok(session)
    }
}
