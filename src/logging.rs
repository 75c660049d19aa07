//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// The number of bytes of a body that is logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "token"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and session tokens in JSON bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return Error::validation("could not read the request body")
                .with_source(error)
                .into_response();
        }
    };

    log_body(
        "Received request",
        &parts.method,
        &parts.uri,
        &loggable_body(&parts.headers, &body_bytes),
    );

    let method = parts.method.clone();
    let uri = parts.uri.clone();
    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return Error::internal("could not read the response body")
                .with_source(error)
                .into_response();
        }
    };

    log_body(
        &format!("Sending response {}", parts.status),
        &method,
        &uri,
        &loggable_body(&parts.headers, &body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

/// The body as text, with sensitive fields redacted if it is JSON.
fn loggable_body(headers: &HeaderMap, body_bytes: &[u8]) -> String {
    let body_text = String::from_utf8_lossy(body_bytes);
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"));

    if is_json {
        redact_json(&body_text)
    } else {
        body_text.into_owned()
    }
}

/// Replace the values of [REDACTED_FIELDS] in a JSON object.
///
/// Text that is not a JSON object is returned unchanged.
fn redact_json(body_text: &str) -> String {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    for field in REDACTED_FIELDS {
        if let Some(value) = object.get_mut(field) {
            *value = Value::String("********".to_owned());
        }
    }

    Value::Object(object).to_string()
}

fn log_body(message: &str, method: &axum::http::Method, uri: &axum::http::Uri, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        let mut end = LOG_BODY_LENGTH_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }

        tracing::info!("{message}: {method} {uri}\nbody: {}...", &body[..end]);
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}: {method} {uri}\nbody: {body:?}");
    }
}
