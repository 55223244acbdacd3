//! `Guard` implementation on top of crossbeam-epoch.
//!
//! Every set operation pins the current thread for its duration. A node
//! unlinked by `delete` is handed to the global collector, which runs the
//! destructor once every thread pinned at that moment has unpinned.
//!
//! ```text
//! LazyList<i64, EpochGuard>
//!     │
//!     └── pin() per operation, defer_unchecked() per unlinked node
//! ```

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use lazyset_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// Zero-sized: all state lives in crossbeam's global collector, so storing
/// one in a list costs nothing and keeps the list `Send` and `Sync`.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochGuard {}

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard {}
    }
}

impl Guard for EpochGuard {
    /// A pinned crossbeam guard. Nodes retired after it was taken stay
    /// allocated until it is dropped.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N: Send + 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || {
                dealloc(node);
            });
        }
        tracing::trace!(node = ?node, "node deferred to epoch collector");
    }
}
