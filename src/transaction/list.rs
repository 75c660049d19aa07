//! Transaction listing endpoint.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    auth::AuthUser,
    ledger::LedgerService,
    pagination::parse_or_default,
    transaction::{Transaction, TransactionFilter},
};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// The query parameters for listing transactions.
///
/// Every value is kept as a raw string. Pagination values that are not
/// integers fall back to the defaults, while malformed filters are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
}

impl ListTransactionsQuery {
    /// Parse the filter parameters.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a date is not in `YYYY-MM-DD` format or
    /// the type is neither "income" nor "expense".
    pub fn filter(&self) -> Result<TransactionFilter, Error> {
        Ok(TransactionFilter {
            start_date: parse_date(self.start_date.as_deref(), "startDate")?,
            end_date: parse_date(self.end_date.as_deref(), "endDate")?,
            kind: non_blank(self.kind.as_deref())
                .map(str::parse)
                .transpose()?,
            description: non_blank(self.description.as_deref()).map(str::to_owned),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_date(raw_date: Option<&str>, parameter: &str) -> Result<Option<Date>, Error> {
    non_blank(raw_date)
        .map(|raw_date| {
            Date::parse(raw_date, DATE_FORMAT).map_err(|error| {
                Error::validation(format!(
                    "{parameter} must be a date in the format YYYY-MM-DD"
                ))
                .with_source(error)
            })
        })
        .transpose()
}

/// Handle a request for a page of the signed in user's transactions.
pub async fn list_transactions_endpoint(
    State(ledger): State<LedgerService>,
    user: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let filter = query.filter()?;
    let limit = parse_or_default(query.limit.as_deref(), 0);
    let offset = parse_or_default(query.offset.as_deref(), 0);

    let transactions = ledger
        .list_transactions(user.user_id, limit, offset, filter)
        .await?;

    Ok(Json(transactions))
}

#[cfg(test)]
mod list_query_tests {
    use time::macros::date;

    use crate::{
        ErrorKind,
        transaction::{TransactionFilter, TransactionType},
    };

    use super::ListTransactionsQuery;

    #[test]
    fn parses_all_filters() {
        let query = ListTransactionsQuery {
            start_date: Some("2024-01-01".to_owned()),
            end_date: Some("2024-01-31".to_owned()),
            kind: Some("income".to_owned()),
            description: Some(" rent ".to_owned()),
            ..Default::default()
        };

        let filter = query.filter().unwrap();

        assert_eq!(filter.start_date, Some(date!(2024 - 01 - 01)));
        assert_eq!(filter.end_date, Some(date!(2024 - 01 - 31)));
        assert_eq!(filter.kind, Some(TransactionType::Income));
        assert_eq!(filter.description.as_deref(), Some("rent"));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let query = ListTransactionsQuery {
            start_date: Some(String::new()),
            kind: Some("  ".to_owned()),
            description: Some(String::new()),
            ..Default::default()
        };

        assert_eq!(query.filter().unwrap(), TransactionFilter::default());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let query = ListTransactionsQuery {
            end_date: Some("31/01/2024".to_owned()),
            ..Default::default()
        };

        assert_eq!(query.filter().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let query = ListTransactionsQuery {
            kind: Some("transfer".to_owned()),
            ..Default::default()
        };

        assert_eq!(query.filter().unwrap_err().kind(), ErrorKind::Validation);
    }
}
