//! Generic test suites shared by every `SortedSet` instantiation.
//!
//! They are compiled into the library so the crossbeam crate can run the same
//! suites against `EpochGuard`.
