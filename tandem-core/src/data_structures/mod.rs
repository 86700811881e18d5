//! Data structures shared by the drain workers.
//!
//! # Organization
//!
//! - [`node_store`] - Arena-backed doubly-linked list (single threaded)
//! - [`guarded_list`] - The node store behind one mutex, the only shared structure
//! - [`direction`] - Which end of the list a consumer takes from

pub mod direction;
pub mod error;
pub mod guarded_list;
pub mod node_store;

pub use direction::Direction;
pub use error::NodeStoreError;
pub use guarded_list::GuardedList;
pub use node_store::{NodeId, NodeStore};
