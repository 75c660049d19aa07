//! Process wide configuration, built once at startup and never mutated afterwards.

use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::{Error, pagination::PaginationConfig, password::PasswordHash};

/// How long a session token is valid for.
pub const DEFAULT_TOKEN_DURATION: time::Duration = time::Duration::hours(24);

/// How long a request may run before it is cancelled.
pub const DEFAULT_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

struct KeyPair {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// The keys for signing and verifying session tokens, derived from one shared secret.
#[derive(Clone)]
pub struct JwtKeys(Arc<KeyPair>);

impl JwtKeys {
    /// Derive the signing and verification keys from `secret`.
    ///
    /// # Errors
    /// Returns a validation error if `secret` is empty.
    pub fn from_secret(secret: &str) -> Result<Self, Error> {
        if secret.is_empty() {
            return Err(Error::validation("the JWT secret cannot be empty"));
        }

        Ok(Self(Arc::new(KeyPair {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })))
    }

    /// The key for signing tokens.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.0.encoding_key
    }

    /// The key for verifying tokens.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.0.decoding_key
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys(********)")
    }
}

/// The settings shared by every request.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The keys for signing and verifying session tokens.
    pub jwt_keys: JwtKeys,
    /// How long an issued session token is valid for.
    pub token_duration: time::Duration,
    /// The bcrypt cost used when hashing new passwords.
    pub bcrypt_cost: u32,
    /// The config that controls the size of listing pages.
    pub pagination: PaginationConfig,
    /// How long a request may run before it is cancelled.
    pub request_timeout: std::time::Duration,
}

impl AppConfig {
    /// Create the config with default settings and the given token secret.
    ///
    /// # Errors
    /// Returns a validation error if `jwt_secret` is empty.
    pub fn new(jwt_secret: &str) -> Result<Self, Error> {
        Ok(Self {
            jwt_keys: JwtKeys::from_secret(jwt_secret)?,
            token_duration: DEFAULT_TOKEN_DURATION,
            bcrypt_cost: PasswordHash::DEFAULT_COST,
            pagination: PaginationConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Use `request_timeout` instead of [DEFAULT_REQUEST_TIMEOUT].
    pub fn with_request_timeout(mut self, request_timeout: std::time::Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}
