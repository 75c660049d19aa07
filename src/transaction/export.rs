//! CSV export of a user's transactions.

use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{Error, auth::AuthUser, ledger::LedgerService, transaction::Transaction};

/// The header row of the exported file.
pub const CSV_HEADER: [&str; 6] = ["ID", "Description", "Amount", "Type", "Date", "Category"];

/// Write `transactions` as CSV, one row per transaction after a header row.
///
/// Amounts have two fraction digits and dates use the `YYYY-MM-DD` format.
///
/// # Errors
/// Returns an internal error if a row could not be written.
pub fn write_csv(transactions: &[Transaction]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    for transaction in transactions {
        writer
            .write_record([
                transaction.id.to_string(),
                transaction.description.clone().unwrap_or_default(),
                transaction.amount.to_string(),
                transaction.kind.to_string(),
                transaction.date.to_string(),
                transaction.category_name.clone(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::internal("could not finish the CSV export").with_source(error.into_error()))
}

fn csv_error(error: csv::Error) -> Error {
    Error::internal("could not write the CSV export").with_source(error)
}

/// Handle a request to download all of the signed in user's transactions as a CSV file.
pub async fn export_transactions_endpoint(
    State(ledger): State<LedgerService>,
    user: AuthUser,
) -> Result<Response, Error> {
    let transactions = ledger.export_transactions(user.user_id).await?;
    let body = write_csv(&transactions)?;

    tracing::debug!(
        "exported {} transactions for user {}",
        transactions.len(),
        user.user_id
    );

    Ok((
        [
            (CONTENT_TYPE, "text/csv"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}
