//! Epoch-based reclamation for lazyset collections.
//!
//! `lazyset-core` leaves the freeing of unlinked nodes to a `Guard`. This
//! crate provides `EpochGuard`, backed by crossbeam-epoch, and the
//! `ConcurrentSortedSet` alias that most users want.
//!
//! # Usage
//!
//! ```ignore
//! use lazyset_core::SortedSet;
//! use lazyset_crossbeam::ConcurrentSortedSet;
//!
//! let set: ConcurrentSortedSet = ConcurrentSortedSet::new();
//! set.insert(42);
//! assert!(set.contains(&42));
//! ```
//!
//! Deleted values are dropped by the epoch collector, possibly on another
//! thread and after the set is gone, so values must be `Send + 'static`:
//!
//! ```compile_fail
//! use std::rc::Rc;
//! use lazyset_core::SortedSet;
//! use lazyset_crossbeam::ConcurrentSortedSet;
//!
//! let set: ConcurrentSortedSet<Rc<i64>> = ConcurrentSortedSet::new();
//! set.insert(Rc::new(1));
//! ```
//!
//! ```compile_fail
//! use lazyset_core::SortedSet;
//! use lazyset_crossbeam::ConcurrentSortedSet;
//!
//! let local = 7i64;
//! let set: ConcurrentSortedSet<&i64> = ConcurrentSortedSet::new();
//! set.insert(&local);
//! ```

pub mod epoch_guard;

pub use epoch_guard::EpochGuard;

use lazyset_core::LazyList;

/// Lazy list whose unlinked nodes are reclaimed through crossbeam-epoch.
pub type ConcurrentSortedSet<T = i64> = LazyList<T, EpochGuard>;
