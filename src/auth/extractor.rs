//! Resolves the bearer token of a request to the signed in user.

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{Error, UserID, auth::decode_token, config::JwtKeys};

/// The user that sent a request, taken from its `Authorization: Bearer` header.
///
/// Handlers that take this extractor are only called for requests with a
/// valid, unexpired session token. Every other request is rejected with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// The ID of the signed in user.
    pub user_id: UserID,
    /// The username of the signed in user.
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|rejection| {
                tracing::debug!("missing or malformed authorization header: {rejection}");
                Error::unauthorized("a valid bearer token is required")
            })?;

        let keys = JwtKeys::from_ref(state);
        let claims = decode_token(bearer.token(), &keys)?;

        Ok(Self {
            user_id: claims.user_id,
            username: claims.username,
        })
    }
}
