//! Internal implementation details.

pub mod sorted_set;

pub use sorted_set::SetNode;
pub use sorted_set::SortedSet;
pub use sorted_set::SortedSetIter;
