//! Reusable concurrency checks for [`GuardedList`](crate::GuardedList).
//!
//! Integration tests and downstream crates call these with their own sizes.
