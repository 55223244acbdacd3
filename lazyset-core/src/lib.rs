//! Lazy concurrent sorted set.
//!
//! A sorted singly linked list where writers take fine-grained per-node locks
//! and validate their window before mutating, while readers walk the chain
//! without locking. Deletion marks a node first and unlinks it second, so the
//! mark is the instant a value stops being present.

pub mod common_tests;
pub mod config;
pub mod data_structures;
pub mod guard;

pub use config::{ListConfig, RetryStrategy};
pub use data_structures::{LazyList, SortedSet};
pub use guard::{DeferredGuard, Guard};
