//! Cancellation of database calls whose caller has gone away.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::InterruptHandle;

use crate::Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Phase {
    #[default]
    Pending,
    Running,
    Finished,
    Cancelled,
}

/// Tracks the progress of one database call so that it can be cancelled safely.
///
/// The connection is shared, so an interrupt must only be sent while this call
/// is the one executing on it.
#[derive(Debug, Default)]
pub(super) struct Call {
    phase: Mutex<Phase>,
}

impl Call {
    /// Mark the call as running.
    ///
    /// Must be called while holding the connection lock.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the caller cancelled the call before it could start.
    pub(super) fn start(&self) -> Result<Running<'_>, Error> {
        let mut phase = self.phase();

        match *phase {
            Phase::Cancelled => Err(Error::internal(
                "the database call was cancelled before it started",
            )),
            _ => {
                *phase = Phase::Running;
                Ok(Running(self))
            }
        }
    }

    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks the call as finished when dropped.
pub(super) struct Running<'a>(&'a Call);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        *self.0.phase() = Phase::Finished;
    }
}

/// Cancels the call when dropped before the call has finished.
///
/// A call that has not started yet will never start, and a running call has
/// its statement interrupted.
pub(super) struct CancelOnDrop {
    call: Arc<Call>,
    interrupt_handle: Arc<InterruptHandle>,
}

impl CancelOnDrop {
    pub(super) fn new(call: Arc<Call>, interrupt_handle: Arc<InterruptHandle>) -> Self {
        Self {
            call,
            interrupt_handle,
        }
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        let mut phase = self.call.phase();

        match *phase {
            Phase::Pending => {
                *phase = Phase::Cancelled;
                tracing::debug!("Cancelled a database call before it started.");
            }
            Phase::Running => {
                // The phase lock is held, so the call cannot finish and hand the
                // connection to another caller before the interrupt lands.
                self.interrupt_handle.interrupt();
                tracing::warn!("Interrupted an in-flight database call.");
            }
            Phase::Finished | Phase::Cancelled => {}
        }
    }
}
