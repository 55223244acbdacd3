//! Memory reclamation for unlinked nodes.
//!
//! Readers walk the list without locks, so a node unlinked by `delete` may
//! still be under another thread's feet. The `Guard` trait decides when such a
//! node can actually be freed:
//!
//! ```text
//! LazyList<T, G: Guard>
//!     │
//!     ├── LazyList<T, EpochGuard>      (crossbeam-epoch, lazyset-crossbeam)
//!     └── LazyList<T, DeferredGuard>   (free everything on drop, tests)
//! ```

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation strategy for nodes removed from a collection.
///
/// # Safety Contract
///
/// Implementations must not run `dealloc` for a node passed to
/// `defer_destroy` while any `ReadGuard` pinned before the call is alive.
///
/// The guard stored in a collection only schedules destruction. Protection of
/// an individual operation comes from the `ReadGuard` returned by `pin`.
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active read section.
    ///
    /// Epoch guards hold a pinned `crossbeam_epoch::Guard` here. The deferred
    /// guard uses `()` because nothing is freed before the collection drops.
    ///
    type ReadGuard: Sized;

    /// Pin a read section for the current thread.
    ///
    fn pin() -> Self::ReadGuard;

    /// Schedule an unlinked node for destruction.
    ///
    /// # Safety
    ///
    /// - `node` must have been allocated by the collection
    /// - `node` must no longer be reachable from the collection's head
    /// - `node` must be scheduled at most once
    /// - `dealloc` must be the matching deallocation function
    ///
    /// `N: Send + 'static` because the node may be freed on another thread,
    /// after the collection that owned it is gone.
    ///
    unsafe fn defer_destroy<N: Send + 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
