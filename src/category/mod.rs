//! Category management for grouping transactions, optionally in a hierarchy.

mod create;
mod db;
mod domain;
mod list;

pub use create::create_category_endpoint;
pub use db::{create_category, create_category_table, get_category, list_categories};
pub use domain::{Category, CategoryName, NewCategory};
pub use list::list_categories_endpoint;
