use std::io;

use tandem_core::{Direction, NodeStoreError};
use thiserror::Error;

/// Errors raised while starting a drain.
///
/// Out of memory is fatal to initialization. A launch failure only leaves
/// that worker's slot empty.
///
#[derive(Debug, Error)]
pub enum DrainError {
    #[error("out of memory after appending {appended} of {requested} nodes")]
    OutOfMemory {
        appended: usize,
        requested: usize,
        #[source]
        source: NodeStoreError,
    },
    #[error("failed to launch {direction} worker")]
    WorkerLaunch {
        direction: Direction,
        #[source]
        source: io::Error,
    },
}
