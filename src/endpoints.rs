//! The paths of the JSON API, all served under [API_PREFIX].
//!
//! For endpoints that take a parameter, e.g., '/api/v1/transactions/{transaction_id}', use [format_endpoint].

/// The prefix shared by every API route.
pub const API_PREFIX: &str = "/api/v1";
/// The route for registering a new user.
pub const REGISTER: &str = "/api/v1/users/register";
/// The route for exchanging credentials for a session token.
pub const LOG_IN: &str = "/api/v1/users/login";
/// The route for recording and listing transactions.
pub const TRANSACTIONS: &str = "/api/v1/transactions";
/// The route for a single transaction.
pub const TRANSACTION: &str = "/api/v1/transactions/{transaction_id}";
/// The route for downloading every transaction as CSV.
pub const EXPORT_TRANSACTIONS_CSV: &str = "/api/v1/transactions/export/csv";
/// The route for creating and listing categories.
pub const CATEGORIES: &str = "/api/v1/categories";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with the next right brace,
/// e.g., '{transaction_id}' in '/api/v1/transactions/{transaction_id}'.
/// Only the first parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
