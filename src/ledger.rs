//! The business rules for a user's transactions and categories.
//!
//! Writes run as one atomic unit on the database, and listing pages are
//! clamped here before they reach the store.

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    AppState, Error, ErrorKind, UserID,
    category::{self, Category, NewCategory},
    database_id::{CategoryId, TransactionId},
    db::Database,
    pagination::{Page, PaginationConfig},
    transaction::{self, NewTransaction, Transaction, TransactionFilter},
};

/// The deepest a category may be nested, counting the category itself.
pub const MAX_CATEGORY_DEPTH: usize = 8;

/// Creates, lists, exports and deletes the data owned by a user.
#[derive(Debug, Clone)]
pub struct LedgerService {
    db: Database,
    pagination: PaginationConfig,
}

impl FromRef<AppState> for LedgerService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.db.clone(), state.config.pagination.clone())
    }
}

impl LedgerService {
    /// Create a ledger service that clamps listings with `pagination`.
    pub fn new(db: Database, pagination: PaginationConfig) -> Self {
        Self { db, pagination }
    }

    fn page(&self, limit: i64, offset: i64) -> Page {
        Page::new(limit, offset, self.pagination.default_limit)
    }

    /// Record a transaction for `user_id`.
    ///
    /// # Errors
    /// Returns a [ErrorKind::Validation] error if the category does not exist
    /// or belongs to another user.
    pub async fn create_transaction(
        &self,
        user_id: UserID,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, Error> {
        self.db
            .atomic(move |connection| {
                transaction::create_transaction(user_id, &new_transaction, connection)
            })
            .await
    }

    /// Create a category for `user_id`.
    ///
    /// If a parent is given it must be owned by the same user, and the new
    /// category may not end up more than [MAX_CATEGORY_DEPTH] levels deep.
    ///
    /// # Errors
    /// This function will return a:
    /// - [ErrorKind::Validation] if the parent is missing, foreign, too deep or part of a cycle,
    /// - [ErrorKind::AlreadyExists] if the user already has a category with the same name.
    pub async fn create_category(
        &self,
        user_id: UserID,
        new_category: NewCategory,
    ) -> Result<Category, Error> {
        self.db
            .atomic(move |connection| {
                if let Some(parent_id) = new_category.parent_id {
                    check_ancestry(user_id, parent_id, connection)?;
                }

                category::create_category(user_id, &new_category, connection)
            })
            .await
    }

    /// Retrieve a page of the transactions owned by `user_id` that match `filter`.
    ///
    /// # Errors
    /// Returns an [ErrorKind::Internal] error if the store fails.
    pub async fn list_transactions(
        &self,
        user_id: UserID,
        limit: i64,
        offset: i64,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, Error> {
        let page = self.page(limit, offset);

        self.db
            .run(move |connection| {
                transaction::list_transactions(
                    user_id,
                    page.limit(),
                    page.offset(),
                    &filter,
                    connection,
                )
            })
            .await
    }

    /// Retrieve a page of the categories owned by `user_id`, optionally filtered by name.
    ///
    /// # Errors
    /// Returns an [ErrorKind::Internal] error if the store fails.
    pub async fn list_categories(
        &self,
        user_id: UserID,
        limit: i64,
        offset: i64,
        name_filter: Option<String>,
    ) -> Result<Vec<Category>, Error> {
        let page = self.page(limit, offset);

        self.db
            .run(move |connection| {
                category::list_categories(
                    user_id,
                    page.limit(),
                    page.offset(),
                    name_filter.as_deref(),
                    connection,
                )
            })
            .await
    }

    /// Retrieve every transaction owned by `user_id`, newest first.
    ///
    /// # Errors
    /// Returns an [ErrorKind::Internal] error if the store fails.
    pub async fn export_transactions(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        self.db
            .run(move |connection| transaction::export_transactions(user_id, connection))
            .await
    }

    /// Soft delete a transaction owned by `user_id`.
    ///
    /// # Errors
    /// Returns a [ErrorKind::NotFound] error if the transaction does not exist
    /// or belongs to another user.
    pub async fn delete_transaction(
        &self,
        user_id: UserID,
        transaction_id: TransactionId,
    ) -> Result<(), Error> {
        self.db
            .run(move |connection| {
                transaction::delete_transaction(user_id, transaction_id, connection)
            })
            .await
    }
}

/// Walk up from `parent_id` to the root, checking that a child of `parent_id`
/// would stay within [MAX_CATEGORY_DEPTH] levels and that the chain has no cycle.
fn check_ancestry(
    user_id: UserID,
    parent_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let mut visited = Vec::with_capacity(MAX_CATEGORY_DEPTH);
    let mut next_id = Some(parent_id);

    while let Some(category_id) = next_id {
        if visited.contains(&category_id) {
            return Err(Error::validation(format!(
                "category {parent_id} is part of a cycle"
            )));
        }

        // The new category adds one more level below its parent.
        if visited.len() + 1 >= MAX_CATEGORY_DEPTH {
            return Err(Error::validation(format!(
                "categories cannot be nested more than {MAX_CATEGORY_DEPTH} levels deep"
            )));
        }

        let category = category::get_category(user_id, category_id, connection).map_err(
            |error| match error.kind() {
                ErrorKind::NotFound => {
                    Error::validation(format!("parent category {category_id} does not exist"))
                }
                _ => error,
            },
        )?;

        visited.push(category_id);
        next_id = category.parent_id;
    }

    Ok(())
}

#[cfg(test)]
mod ledger_service_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        ErrorKind, UserID,
        category::{CategoryName, NewCategory},
        database_id::CategoryId,
        db::Database,
        pagination::PaginationConfig,
        password::PasswordHash,
        transaction::{Amount, NewTransaction, TransactionFilter, TransactionType},
        user::{Username, create_user},
    };

    use super::{LedgerService, MAX_CATEGORY_DEPTH};

    async fn get_ledger(default_limit: i64) -> (LedgerService, Database, UserID, UserID) {
        let db = Database::new(Connection::open_in_memory().unwrap()).unwrap();
        let (alice, bob) = db
            .run(|connection| {
                let hash = PasswordHash::new_unchecked("hunter2");
                let alice = create_user(&Username::new_unchecked("alice"), &hash, connection)?;
                let bob = create_user(&Username::new_unchecked("bob"), &hash, connection)?;
                Ok((alice.id, bob.id))
            })
            .await
            .unwrap();

        (
            LedgerService::new(db.clone(), PaginationConfig { default_limit }),
            db,
            alice,
            bob,
        )
    }

    fn category(name: &str, parent_id: Option<CategoryId>) -> NewCategory {
        NewCategory {
            name: CategoryName::new_unchecked(name),
            parent_id,
        }
    }

    fn expense(category_id: CategoryId) -> NewTransaction {
        NewTransaction {
            description: None,
            amount: Amount::new(dec!(50.00)).unwrap(),
            kind: TransactionType::Expense,
            date: date!(2024 - 01 - 15),
            category_id,
        }
    }

    #[tokio::test]
    async fn category_names_are_unique_per_user() {
        let (ledger, _, alice, bob) = get_ledger(100).await;

        let first = ledger
            .create_category(alice, category("Groceries", None))
            .await
            .unwrap();
        let duplicate = ledger.create_category(alice, category("Groceries", None)).await;
        let other_user = ledger.create_category(bob, category("Groceries", None)).await;

        assert_eq!(first.id, 1);
        assert_eq!(duplicate.unwrap_err().kind(), ErrorKind::AlreadyExists);
        assert!(other_user.is_ok());
    }

    #[tokio::test]
    async fn create_category_with_foreign_parent_fails() {
        let (ledger, _, alice, bob) = get_ledger(100).await;
        let bobs = ledger.create_category(bob, category("Food", None)).await.unwrap();

        let result = ledger
            .create_category(alice, category("Groceries", Some(bobs.id)))
            .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn create_category_allows_max_depth() {
        let (ledger, _, alice, _) = get_ledger(100).await;
        let mut parent_id = None;

        for level in 1..=MAX_CATEGORY_DEPTH {
            let created = ledger
                .create_category(alice, category(&format!("Level {level}"), parent_id))
                .await
                .unwrap();
            parent_id = Some(created.id);
        }

        let too_deep = ledger
            .create_category(alice, category("Too deep", parent_id))
            .await;

        assert_eq!(too_deep.unwrap_err().kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn create_category_rejects_cyclic_parent_chain() {
        let (ledger, db, alice, _) = get_ledger(100).await;
        let a = ledger.create_category(alice, category("Aa", None)).await.unwrap();
        let b = ledger
            .create_category(alice, category("Bb", Some(a.id)))
            .await
            .unwrap();
        // Only possible by editing the table directly.
        db.run(move |connection| {
            connection.execute(
                "UPDATE category SET parent_id = ?1 WHERE id = ?2",
                (b.id, a.id),
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let result = ledger.create_category(alice, category("Cc", Some(b.id))).await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn create_transaction_round_trips_through_listing() {
        let (ledger, _, alice, _) = get_ledger(100).await;
        let groceries = ledger
            .create_category(alice, category("Groceries", None))
            .await
            .unwrap();
        let new_transaction = expense(groceries.id);

        let created = ledger
            .create_transaction(alice, new_transaction.clone())
            .await
            .unwrap();
        let listed = ledger
            .list_transactions(alice, 0, 0, TransactionFilter::default())
            .await
            .unwrap();

        assert_eq!(listed, vec![created.clone()]);
        assert_eq!(created.amount, new_transaction.amount);
        assert_eq!(created.kind, new_transaction.kind);
        assert_eq!(created.date, new_transaction.date);
        assert_eq!(created.category_id, new_transaction.category_id);
        assert_eq!(created.description, None);
    }

    #[tokio::test]
    async fn january_filter_example() {
        let (ledger, _, alice, _) = get_ledger(100).await;
        let groceries = ledger
            .create_category(alice, category("Groceries", None))
            .await
            .unwrap();
        let created = ledger
            .create_transaction(alice, expense(groceries.id))
            .await
            .unwrap();

        let january = ledger
            .list_transactions(
                alice,
                10,
                0,
                TransactionFilter {
                    start_date: Some(date!(2024 - 01 - 01)),
                    end_date: Some(date!(2024 - 01 - 31)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let before = ledger
            .list_transactions(
                alice,
                10,
                0,
                TransactionFilter {
                    end_date: Some(date!(2023 - 12 - 31)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(january, vec![created]);
        assert!(before.is_empty());
    }

    #[tokio::test]
    async fn listing_is_clamped_to_configured_limit() {
        let (ledger, _, alice, _) = get_ledger(2).await;
        for name in ["Aa", "Bb", "Cc"] {
            ledger.create_category(alice, category(name, None)).await.unwrap();
        }

        let defaulted = ledger.list_categories(alice, 0, -1, None).await.unwrap();
        let capped = ledger.list_categories(alice, 50, 0, None).await.unwrap();
        let past_end = ledger.list_categories(alice, 2, 3, None).await.unwrap();

        assert_eq!(defaulted.len(), 2);
        assert_eq!(capped.len(), 2);
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn export_returns_all_owned_transactions() {
        let (ledger, _, alice, bob) = get_ledger(1).await;
        let groceries = ledger
            .create_category(alice, category("Groceries", None))
            .await
            .unwrap();
        for _ in 0..3 {
            ledger
                .create_transaction(alice, expense(groceries.id))
                .await
                .unwrap();
        }

        let exported = ledger.export_transactions(alice).await.unwrap();

        assert_eq!(exported.len(), 3);
        assert!(ledger.export_transactions(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_is_scoped_to_owner() {
        let (ledger, _, alice, bob) = get_ledger(100).await;
        let groceries = ledger
            .create_category(alice, category("Groceries", None))
            .await
            .unwrap();
        let created = ledger
            .create_transaction(alice, expense(groceries.id))
            .await
            .unwrap();

        let by_bob = ledger.delete_transaction(bob, created.id).await;
        let by_alice = ledger.delete_transaction(alice, created.id).await;

        assert_eq!(by_bob.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(by_alice.is_ok());
        assert!(ledger.export_transactions(alice).await.unwrap().is_empty());
    }
}
