//! Signed, time limited session tokens.

use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID, config::JwtKeys};

/// The contents of a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub user_id: UserID,
    /// The username of the user the token was issued to.
    pub username: String,
    /// When the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// When the token expires, in seconds since the Unix epoch.
    pub exp: i64,
}

/// An issued session token and when it stops being valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    /// The encoded and signed token.
    pub token: String,
    /// When the token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Issue a token for the user that expires `duration` from now.
///
/// # Errors
/// Returns an internal error if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    username: &str,
    duration: Duration,
    keys: &JwtKeys,
) -> Result<SessionToken, Error> {
    let issued_at = OffsetDateTime::now_utc();
    let expires_at = issued_at + duration;
    let claims = Claims {
        user_id,
        username: username.to_owned(),
        iat: issued_at.unix_timestamp(),
        exp: expires_at.unix_timestamp(),
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, keys.encoding_key())
        .map_err(|error| Error::internal("could not sign the session token").with_source(error))?;

    Ok(SessionToken { token, expires_at })
}

/// Verify `token` and return its claims.
///
/// Only HS256 tokens are accepted and expiry is checked without leeway.
///
/// # Errors
/// Returns an unauthorized error if the token is malformed, has the wrong
/// signature or algorithm, or has expired.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, keys.decoding_key(), &validation)
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("rejected session token: {error}");
            Error::unauthorized("the session token is invalid or has expired").with_source(error)
        })
}
