//! Core transaction domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    database_id::{CategoryId, TransactionId},
};

/// The largest amount a transaction may have, in cents.
pub const MAX_AMOUNT_CENTS: i64 = 99_999_999_99;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received, e.g., a salary.
    Income,
    /// Money spent, e.g., groceries.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in the database, JSON and CSV.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::validation(format!(
                "\"{other}\" is not a transaction type, expected \"income\" or \"expense\""
            ))),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A positive amount of money with exactly two fraction digits.
///
/// Values are rounded half away from zero to cents, so `10.005` becomes `10.01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the rounded value is not greater than zero
    /// or is larger than 99,999,999.99.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);

        if rounded <= Decimal::ZERO {
            return Err(Error::validation("amount must be greater than zero"));
        }

        if rounded.mantissa() > i128::from(MAX_AMOUNT_CENTS) {
            return Err(Error::validation("amount must be at most 99999999.99"));
        }

        Ok(Self(rounded))
    }

    /// Create an amount from a number of cents without validation.
    ///
    /// The caller should ensure that `cents` is positive and at most [MAX_AMOUNT_CENTS].
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the range invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn from_cents_unchecked(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        // The mantissa of a scale 2 decimal is the number of cents, bounded by MAX_AMOUNT_CENTS.
        self.0.mantissa() as i64
    }

    /// The amount as a decimal with two fraction digits.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;

        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// An optional free text description.
    pub description: Option<String>,
    /// How much money moved.
    pub amount: Amount,
    /// Whether the money came in or went out.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The day the transaction happened.
    pub date: Date,
    /// The category the transaction is filed under.
    pub category_id: CategoryId,
    /// The name of the category, for display and export.
    pub category_name: String,
    /// The ID of the user that owns the transaction.
    pub user_id: UserID,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to record a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Optional free text, never blank.
    pub description: Option<String>,
    /// How much money moved.
    pub amount: Amount,
    /// Whether the money came in or went out.
    pub kind: TransactionType,
    /// The calendar date the money moved.
    pub date: Date,
    /// The category to file the transaction under.
    pub category_id: CategoryId,
}

impl NewTransaction {
    /// Set the description, treating blank text as no description.
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned);
        self
    }
}

/// Optional conditions a listed transaction must meet.
///
/// Date bounds are inclusive and the description match ignores case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Keep transactions on or after this date.
    pub start_date: Option<Date>,
    /// Keep transactions on or before this date.
    pub end_date: Option<Date>,
    /// Keep only incomes or only expenses.
    pub kind: Option<TransactionType>,
    /// Keep transactions whose description contains this text.
    pub description: Option<String>,
}
