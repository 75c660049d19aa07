//! Application router configuration for the JSON API.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{log_in_endpoint, register_user_endpoint},
    category::{create_category_endpoint, list_categories_endpoint},
    endpoints,
    logging::logging_middleware,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, export_transactions_endpoint,
        list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every request is logged and cancelled if it runs longer than the
/// configured request timeout.
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;

    Router::new()
        .route(endpoints::REGISTER, post(register_user_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(list_transactions_endpoint),
        )
        .route(
            endpoints::EXPORT_TRANSACTIONS_CSV,
            get(export_transactions_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(
            endpoints::CATEGORIES,
            post(create_category_endpoint).get(list_categories_endpoint),
        )
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(
            request_timeout,
            timeout_middleware,
        ))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Respond with 408 if the rest of the stack takes longer than `request_timeout`.
///
/// The handler future is dropped on timeout, which cancels any database call it was waiting on.
pub async fn timeout_middleware(
    State(request_timeout): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    match tokio::time::timeout(request_timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!("{method} {uri} timed out after {request_timeout:?}");

            (
                StatusCode::REQUEST_TIMEOUT,
                Json(json!({
                    "error": "REQUEST_TIMEOUT",
                    "details": "The request took too long to complete.",
                })),
            )
                .into_response()
        }
    }
}

async fn get_404_not_found(uri: Uri) -> Error {
    Error::not_found(format!("there is no route for {}", uri.path()))
}
