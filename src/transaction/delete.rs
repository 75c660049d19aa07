//! Transaction deletion endpoint.

use axum::{
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
};

use crate::{Error, auth::AuthUser, database_id::TransactionId, ledger::LedgerService};

/// Handle a request to soft delete one of the signed in user's transactions.
///
/// Responds with 404 both when the transaction does not exist and when it
/// belongs to another user.
pub async fn delete_transaction_endpoint(
    State(ledger): State<LedgerService>,
    user: AuthUser,
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(transaction_id) = path?;

    ledger
        .delete_transaction(user.user_id, transaction_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod delete_transaction_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{
            create_test_category, create_test_transaction, get_test_server, register_and_log_in,
        },
    };

    #[tokio::test]
    async fn delete_removes_transaction_from_listing() {
        let server = get_test_server();
        let token = register_and_log_in(&server, "alice").await;
        let category_id = create_test_category(&server, &token, "Groceries").await;
        let transaction = create_test_transaction(&server, &token, category_id, "2024-01-15").await;
        let id = transaction["id"].as_i64().unwrap();

        server
            .delete(&format_endpoint(endpoints::TRANSACTION, id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let listing = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await;
        assert_eq!(listing.json::<Value>(), json!([]));
    }

    #[tokio::test]
    async fn delete_other_users_transaction_returns_not_found() {
        let server = get_test_server();
        let alice = register_and_log_in(&server, "alice").await;
        let bob = register_and_log_in(&server, "bob").await;
        let category_id = create_test_category(&server, &alice, "Groceries").await;
        let transaction = create_test_transaction(&server, &alice, category_id, "2024-01-15").await;
        let id = transaction["id"].as_i64().unwrap();

        let foreign = server
            .delete(&format_endpoint(endpoints::TRANSACTION, id))
            .authorization_bearer(&bob)
            .await;
        let missing = server
            .delete(&format_endpoint(endpoints::TRANSACTION, 9999))
            .authorization_bearer(&bob)
            .await;

        foreign.assert_status(StatusCode::NOT_FOUND);
        missing.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(foreign.json::<Value>(), missing.json::<Value>());
    }

    #[tokio::test]
    async fn delete_with_non_numeric_id_returns_json_validation_error() {
        let server = get_test_server();
        let token = register_and_log_in(&server, "alice").await;

        let response = server
            .delete(&format!("{}/abc", endpoints::TRANSACTIONS))
            .authorization_bearer(&token)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn delete_without_token_returns_unauthorized() {
        let server = get_test_server();

        server
            .delete(&format_endpoint(endpoints::TRANSACTION, 1))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
