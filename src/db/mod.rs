/*! This module sets up the application's database and runs store operations against it. */

mod cancel;

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, InterruptHandle, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

use cancel::{Call, CancelOnDrop};

/// Create the tables for the domain models if they do not exist yet.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must be set first.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Run `unit` inside a single database transaction.
///
/// The transaction is committed if `unit` succeeds. If `unit` returns an error,
/// every change it made is rolled back and the error is returned unchanged.
///
/// # Errors
/// Returns the error from `unit`, or an internal error if the transaction could
/// not be started or committed.
pub fn atomically<T, F>(connection: &mut Connection, unit: F) -> Result<T, Error>
where
    F: FnOnce(&SqlTransaction) -> Result<T, Error>,
{
    let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Dropping `transaction` without committing rolls it back.
    let value = unit(&transaction)?;

    transaction.commit()?;

    Ok(value)
}

/// A handle to the application database that is shared between requests.
///
/// Store operations are run on a blocking worker thread. If the future returned
/// by [Database::run] or [Database::atomic] is dropped before the operation
/// finishes, e.g., because the request timed out, the operation is cancelled.
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
    interrupt_handle: Arc<InterruptHandle>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Wrap a SQLite connection, creating the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        initialize(&connection)?;

        let interrupt_handle = Arc::new(connection.get_interrupt_handle());

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            interrupt_handle,
        })
    }

    /// Run `operation` with exclusive access to the database connection.
    ///
    /// # Errors
    /// Returns the error from `operation`, or an internal error if the
    /// connection lock is poisoned, the call was cancelled or the worker panicked.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, Error> + Send + 'static,
    {
        let call = Arc::new(Call::default());
        let _cancel_on_drop = CancelOnDrop::new(call.clone(), self.interrupt_handle.clone());
        let connection = self.connection.clone();

        let task = tokio::task::spawn_blocking(move || {
            let mut connection = connection
                .lock()
                .map_err(|_| Error::internal("could not acquire the database lock"))?;
            let _running = call.start()?;

            operation(&mut *connection)
        });

        match task.await {
            Ok(result) => result,
            Err(error) => Err(Error::internal("the database worker failed").with_source(error)),
        }
    }

    /// Run `unit` as one atomic unit: either all of its writes are committed or none are.
    ///
    /// See [atomically] for the commit and rollback rules.
    ///
    /// # Errors
    /// Returns the error from `unit` unchanged, or an internal error if the
    /// transaction could not be started or committed.
    pub async fn atomic<T, F>(&self, unit: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&SqlTransaction) -> Result<T, Error> + Send + 'static,
    {
        self.run(move |connection| atomically(connection, unit))
            .await
    }
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert_eq!(enabled, 1);
    }
}


#[cfg(test)]
mod database_tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::Duration,
    };

    use rusqlite::Connection;

    use crate::{Error, ErrorKind};

    use super::Database;

    fn get_database() -> Database {
        Database::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn run_returns_operation_result() {
        let db = get_database();

        let got = db
            .run(|conn| {
                conn.query_row("SELECT 40 + 2", [], |row| row.get::<_, i64>(0))
                    .map_err(Error::from)
            })
            .await
            .unwrap();

        assert_eq!(got, 42);
    }

    #[tokio::test]
    async fn atomic_propagates_error_unchanged() {
        let db = get_database();

        let result: Result<(), Error> = db
            .atomic(|_| Err(Error::already_exists("duplicate")))
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AlreadyExists);
        assert_eq!(error.message(), "duplicate");
    }

    #[tokio::test]
    async fn cancelled_call_never_starts() {
        let db = get_database();
        let did_run = Arc::new(AtomicBool::new(false));

        let connection_lock = db.connection.lock().unwrap();
        let flag = did_run.clone();
        let result = tokio::time::timeout(
            Duration::from_millis(20),
            db.run(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }),
        )
        .await;
        drop(connection_lock);

        assert!(result.is_err(), "want timeout, got {result:?}");
        // Queue another call so the cancelled worker has had the lock at least once.
        tokio::time::sleep(Duration::from_millis(50)).await;
        db.run(|_| Ok(())).await.unwrap();
        assert!(!did_run.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn timed_out_query_is_interrupted() {
        let db = get_database();

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            db.run(|conn| {
                conn.query_row(
                    "WITH RECURSIVE counter(x) AS (
                        SELECT 1 UNION ALL SELECT x + 1 FROM counter WHERE x < 10000000000
                    ) SELECT COUNT(*) FROM counter",
                    [],
                    |row| row.get::<_, i64>(0),
                )
                .map_err(Error::from)
            }),
        )
        .await;
        assert!(result.is_err(), "want timeout, got {result:?}");

        // The connection is only free again if the long query was interrupted.
        let follow_up = tokio::time::timeout(
            Duration::from_secs(5),
            db.run(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                    .map_err(Error::from)
            }),
        )
        .await;

        assert_eq!(follow_up.unwrap().unwrap(), 1);
    }
}
