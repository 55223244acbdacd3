//! Sorted set implementations.
//!
//! Parameterized by a guard type `G: Guard` that decides when unlinked nodes
//! are freed:
//!
//! - `DeferredGuard`: Testing - frees removed nodes when the list drops
//! - `EpochGuard`: Production - epoch-based reclamation (crossbeam-epoch)

pub mod lazy_list;
pub mod lazy_list_node;

pub use lazy_list::LazyList;
pub use lazy_list_node::LazyListNode;
