pub mod bit_count;
pub mod common_tests;
pub mod data_structures;
pub mod preemptive_synchronization;

pub use data_structures::{Direction, GuardedList, NodeId, NodeStore, NodeStoreError};
pub use preemptive_synchronization::{CancellationToken, StartGate};
