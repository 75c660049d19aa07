//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, UserID, database_id::CategoryId};

/// The minimum number of characters in a category name.
pub const MIN_CATEGORY_NAME_LENGTH: usize = 2;
/// The maximum number of characters in a category name.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// A validated category name between 2 and 100 characters long.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// Leading and trailing whitespace is removed before validation.
    ///
    /// # Errors
    ///
    /// This function will return a validation error if the trimmed name is
    /// shorter than [MIN_CATEGORY_NAME_LENGTH] or longer than [MAX_CATEGORY_NAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();
        let length = name.chars().count();

        if !(MIN_CATEGORY_NAME_LENGTH..=MAX_CATEGORY_NAME_LENGTH).contains(&length) {
            return Err(Error::validation(format!(
                "category name must be between {MIN_CATEGORY_NAME_LENGTH} and \
                {MAX_CATEGORY_NAME_LENGTH} characters long"
            )));
        }

        Ok(Self(name.to_string()))
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is a valid name.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the length invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category for grouping transactions (e.g., 'Groceries', 'Salary').
///
/// Categories belong to exactly one user and may have a parent category owned by the same user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category, unique for its owner.
    pub name: CategoryName,
    /// The category this one is nested under, if any.
    pub parent_id: Option<CategoryId>,
    /// The ID of the user that owns the category.
    pub user_id: UserID,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the category was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to create a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    /// The name of the new category.
    pub name: CategoryName,
    /// The optional parent of the new category.
    pub parent_id: Option<CategoryId>,
}

#[cfg(test)]
mod tests {
    use crate::{ErrorKind, category::CategoryName};

    #[test]
    fn name_is_trimmed() {
        assert_eq!(CategoryName::new("  Groceries ").unwrap().as_ref(), "Groceries");
    }

    #[test]
    fn rejects_short_name() {
        assert_eq!(
            CategoryName::new(" a ").unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn rejects_long_name() {
        assert_eq!(
            CategoryName::new(&"x".repeat(101)).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert!(CategoryName::new(&"x".repeat(100)).is_ok());
    }
}
