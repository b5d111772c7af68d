//! Cascade re-entry guard.
//!
//! # Responsibility
//! - Track whether a synchronizer is inside one of its own cascades.
//! - Hand out a scoped token whose drop ends the cascade.
//!
//! # Invariants
//! - At most one `UpdateScope` per guard is alive at any time.
//! - The depth returns to zero on every exit path, including early returns
//!   and unwinding, because it is restored in `Drop`.

use std::cell::Cell;

/// Single-threaded call-depth counter shared by one synchronizer's handlers.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    depth: Cell<u32>,
}

impl ReentrancyGuard {
    /// Creates a closed guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the outermost update scope.
    ///
    /// Returns `None` while another scope of this guard is alive; callers
    /// drop the nested write without logging it.
    pub fn try_enter(&self) -> Option<UpdateScope<'_>> {
        if self.depth.get() > 0 {
            return None;
        }
        self.depth.set(self.depth.get() + 1);
        Some(UpdateScope { guard: self })
    }

    /// Whether a scope of this guard is alive.
    pub fn is_updating(&self) -> bool {
        self.depth.get() > 0
    }

    /// Number of live scopes; zero or one.
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }
}

/// Live cascade token. Dropping it reopens the guard.
#[must_use = "dropping the scope immediately ends the cascade"]
#[derive(Debug)]
pub struct UpdateScope<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for UpdateScope<'_> {
    fn drop(&mut self) {
        self.guard.depth.set(self.guard.depth.get().saturating_sub(1));
    }
}
