//! The registration and log in endpoints.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{AuthService, SessionToken},
    user::User,
};

/// The username and password sent to register or log in.
#[derive(Deserialize, Serialize)]
pub struct Credentials {
    /// The user's unique name.
    pub username: String,
    /// The user's password in plain text.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Handle a request to register a new user.
///
/// Responds with 201 and the new user, without the password hash.
pub async fn register_user_endpoint(
    State(auth): State<AuthService>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), Error> {
    let Json(credentials) = payload?;

    let user = auth
        .register_user(&credentials.username, &credentials.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Handle a request to exchange credentials for a session token.
pub async fn log_in_endpoint(
    State(auth): State<AuthService>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SessionToken>, Error> {
    let Json(credentials) = payload?;

    let session = auth
        .authenticate_user(&credentials.username, &credentials.password)
        .await?;

    Ok(Json(session))
}

#[cfg(test)]
mod register_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{endpoints, test_utils::get_test_server};

    #[tokio::test]
    async fn register_returns_created_user_without_hash() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({ "username": "alice", "password": "hunter22" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let user = response.json::<Value>();
        assert_eq!(user["id"], 1);
        assert_eq!(user["username"], "alice");
        assert!(user.get("createdAt").is_some());
        assert!(user.get("passwordHash").is_none());
        assert!(!response.text().contains("$2b$"));
    }

    #[tokio::test]
    async fn register_taken_username_returns_conflict() {
        let server = get_test_server();
        let body = json!({ "username": "alice", "password": "hunter22" });
        server.post(endpoints::REGISTER).json(&body).await;

        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn register_short_password_returns_bad_request() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({ "username": "alice", "password": "abc" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "VALIDATION_ERROR");
    }
}
