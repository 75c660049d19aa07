//! Fintrack is a multi-tenant personal finance ledger.
//!
//! Users record income and expense transactions, file them under (optionally
//! nested) categories, and read them back as filtered pages or a CSV export.
//!
//! This library provides a JSON REST API. Every ledger route requires a
//! bearer token issued at log in, and every read and write is scoped to the
//! user that token belongs to.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod config;
mod database_id;
mod db;
mod endpoints;
mod error;
mod ledger;
mod logging;
mod pagination;
mod password;
mod routing;
#[cfg(test)]
mod test_utils;
mod transaction;
mod user;

pub use app_state::AppState;
pub use auth::{AuthService, AuthUser, Claims, Credentials, SessionToken};
pub use category::{Category, CategoryName, NewCategory};
pub use config::{AppConfig, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TOKEN_DURATION, JwtKeys};
pub use db::{Database, atomically, initialize as initialize_db};
pub use error::{Error, ErrorKind};
pub use ledger::{LedgerService, MAX_CATEGORY_DEPTH};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::{DEFAULT_PAGE_LIMIT, PaginationConfig};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::{build_router, timeout_middleware};
pub use transaction::{
    Amount, NewTransaction, Transaction, TransactionFilter, TransactionType, write_csv,
};
pub use user::{User, UserID, Username};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
