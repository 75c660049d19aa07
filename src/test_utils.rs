#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{AppState, build_router, config::AppConfig, endpoints};

pub(crate) const TEST_PASSWORD: &str = "hunter22";

/// Build the full app on an in-memory database with a cheap bcrypt cost.
pub(crate) fn get_test_server() -> TestServer {
    let mut config = AppConfig::new("foobar").expect("Could not create config.");
    config.bcrypt_cost = 4;
    let state = AppState::new(
        Connection::open_in_memory().expect("Could not open database in memory."),
        config,
    )
    .expect("Could not create app state.");

    TestServer::new(build_router(state))
}

/// Register `username` and return a session token for it.
pub(crate) async fn register_and_log_in(server: &TestServer, username: &str) -> String {
    let credentials = json!({ "username": username, "password": TEST_PASSWORD });

    server
        .post(endpoints::REGISTER)
        .json(&credentials)
        .await
        .assert_status_success();

    let response = server.post(endpoints::LOG_IN).json(&credentials).await;
    response.assert_status_ok();

    response.json::<Value>()["token"]
        .as_str()
        .expect("log in response is missing the token")
        .to_owned()
}

/// Create a category and return its ID.
pub(crate) async fn create_test_category(server: &TestServer, token: &str, name: &str) -> i64 {
    let response = server
        .post(endpoints::CATEGORIES)
        .authorization_bearer(token)
        .json(&json!({ "name": name }))
        .await;
    response.assert_status_success();

    response.json::<Value>()["id"]
        .as_i64()
        .expect("category response is missing the ID")
}

/// Record a 50.00 expense on `date` and return the created transaction as JSON.
pub(crate) async fn create_test_transaction(
    server: &TestServer,
    token: &str,
    category_id: i64,
    date: &str,
) -> Value {
    let response = server
        .post(endpoints::TRANSACTIONS)
        .authorization_bearer(token)
        .json(&json!({
            "amount": 50.00,
            "type": "expense",
            "date": date,
            "categoryId": category_id,
        }))
        .await;
    response.assert_status_success();

    response.json::<Value>()
}
