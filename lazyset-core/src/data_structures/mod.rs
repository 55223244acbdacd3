//! Data structures.
//!
//! # Organization
//!
//! - [`sorted`] - The lazy list and its node
//! - [`ordered_iterator`] - Ordered input for batch inserts
//! - `internal` - The `SortedSet` trait and its iterator

pub(crate) mod internal;
pub mod ordered_iterator;
pub mod sorted;

pub use internal::{SetNode, SortedSet, SortedSetIter};
pub use ordered_iterator::{Ordered, OrderedIterator, ordered_from_vec};
pub use sorted::{LazyList, LazyListNode};
