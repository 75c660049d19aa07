//! Income and expense transactions.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its `Amount` and `TransactionType`
//! - Database functions for storing, querying and soft deleting transactions
//! - The JSON and CSV endpoints for transactions

mod create;
mod db;
mod delete;
mod domain;
mod export;
mod list;

pub use create::create_transaction_endpoint;
pub use db::{
    create_transaction, create_transaction_table, delete_transaction, export_transactions,
    get_transaction, list_transactions,
};
pub use delete::delete_transaction_endpoint;
pub use domain::{Amount, NewTransaction, Transaction, TransactionFilter, TransactionType};
pub use export::{export_transactions_endpoint, write_csv};
pub use list::list_transactions_endpoint;
