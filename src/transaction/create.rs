//! Transaction creation endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::AuthUser,
    database_id::CategoryId,
    ledger::LedgerService,
    transaction::{Amount, NewTransaction, Transaction, TransactionType},
};

/// The request body for recording a transaction.
///
/// `date` uses the `YYYY-MM-DD` format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub description: Option<String>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub date: Date,
    pub category_id: CategoryId,
}

/// Handle a request to record a transaction for the signed in user.
pub async fn create_transaction_endpoint(
    State(ledger): State<LedgerService>,
    user: AuthUser,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let Json(request) = payload?;

    let new_transaction = NewTransaction {
        description: None,
        amount: Amount::new(request.amount)?,
        kind: request.kind,
        date: request.date,
        category_id: request.category_id,
    }
    .description(request.description.as_deref());

    let transaction = ledger
        .create_transaction(user.user_id, new_transaction)
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
