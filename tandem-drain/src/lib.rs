//! Two-ended concurrent drain of a guarded list.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 │          Coordinator         │
//!                 │  populate ─► launch ─► join  │
//!                 └──────┬────────────────┬──────┘
//!                        │                │
//!                 ┌──────▼─────┐   ┌──────▼─────┐
//!                 │ head worker│   │ tail worker│
//!                 │ zero bits  │   │ one bits   │
//!                 └──────┬─────┘   └──────┬─────┘
//!                        │  take_from_end │
//!                 ┌──────▼────────────────▼──────┐
//!                 │   GuardedList (one mutex)    │
//!                 │ head ◄──► ... ◄──► tail      │
//!                 └──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use tandem_drain::{Coordinator, DrainConfig};
//!
//! let config = DrainConfig::builder().num_elements(1000).build();
//!
//! let coordinator = Coordinator::initialize(&config)?;
//! let report = coordinator.shutdown();
//!
//! assert_eq!(1000, report.consumed() as usize + report.leftover_freed);
//! # Ok::<(), tandem_drain::DrainError>(())
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod launcher;
pub mod random;
pub mod worker;

pub use config::DrainConfig;
pub use coordinator::{Coordinator, ShutdownReport};
pub use error::DrainError;
pub use launcher::{ThreadLauncher, WorkerLauncher};
pub use random::{RandomSource, ThreadRandom};
pub use tandem_core::Direction;
pub use worker::{TerminalState, WorkerHandle, WorkerReport, WorkerState, drain_loop};
