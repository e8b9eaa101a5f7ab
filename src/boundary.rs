//! Error boundary.
//!
//! Every public store, evaluation and execution entry point, and every
//! grounded-procedure call, runs inside [`guard`]. Errors pass through
//! unchanged; a panic is caught and converted into
//! `Error::ExecutionError` so it never unwinds into the caller.
//!
//! The store stays usable after a caught panic: `parking_lot` locks do
//! not poison, and no store lock is held while user code runs.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::{Error, Result};

/// Run `f`, translating a panic into an error tagged with `op`.
pub fn guard<T, F>(op: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            debug!(op, kind = ?err.kind(), error = %err, "operation failed");
            Err(err)
        }
        Err(payload) => {
            let message = panic_message(&*payload);
            warn!(op, panic = %message, "caught panic at error boundary");
            Err(Error::ExecutionError(format!("{op} panicked: {message}")))
        }
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(err) = payload.downcast_ref::<Error>() {
        err.to_string()
    } else {
        "non-string panic payload".to_string()
    }
}
