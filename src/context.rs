//! Active-atomspace context.
//!
//! The free constructors in [`crate::constructors`] build atoms in the
//! *active* atomspace of the calling thread. `initialize` binds one,
//! `finalize` releases it.
//!
//! | Call | Effect |
//! |------|--------|
//! | `initialize(&space)` | bind `space`, replacing any earlier binding |
//! | `finalize()` | release the binding; a no-op when nothing is bound |
//! | `scoped(&space)` | bind `space` until the returned guard drops |
//!
//! Bindings are per thread, so tests running in parallel never see each
//! other's store. Releasing a binding drops only this handle; the store
//! lives on as long as any other `AtomSpace` clone does.

use std::cell::RefCell;

use tracing::{debug, warn};

use crate::{AtomSpace, Error, Result};

thread_local! {
    static ACTIVE: RefCell<Option<AtomSpace>> = const { RefCell::new(None) };
}

/// Make `space` the active atomspace for this thread.
pub fn initialize(space: &AtomSpace) {
    let previous = ACTIVE.with(|active| active.borrow_mut().replace(space.clone()));
    match previous {
        Some(prev) if !prev.same_as(space) => {
            warn!(previous = %prev.id(), space = %space.id(), "replacing active atomspace without finalize");
        }
        _ => debug!(space = %space.id(), "atomspace initialized"),
    }
}

/// Release the active atomspace. Safe to call any number of times, and
/// during thread teardown.
pub fn finalize() {
    let released = ACTIVE
        .try_with(|active| active.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
        .ok()
        .flatten();
    match released {
        Some(space) => debug!(space = %space.id(), "atomspace finalized"),
        None => debug!("finalize with no active atomspace"),
    }
}

pub fn is_initialized() -> bool {
    ACTIVE.with(|active| active.borrow().is_some())
}

/// The active atomspace, or a context error if none is bound.
pub fn active() -> Result<AtomSpace> {
    ACTIVE
        .with(|active| active.borrow().clone())
        .ok_or_else(|| Error::Context("no active atomspace; call initialize() first".into()))
}

/// Bind `space` until the guard drops, then restore whatever was bound
/// before.
pub fn scoped(space: &AtomSpace) -> ContextGuard {
    let previous = ACTIVE.with(|active| active.borrow_mut().replace(space.clone()));
    debug!(space = %space.id(), "atomspace scoped");
    ContextGuard { previous }
}

/// Restores the previous binding on drop.
#[must_use = "the binding is released when the guard drops"]
pub struct ContextGuard {
    previous: Option<AtomSpace>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = ACTIVE.try_with(|active| {
            if let Ok(mut slot) = active.try_borrow_mut() {
                *slot = previous;
            }
        });
    }
}
