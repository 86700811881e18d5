use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::utils::CachePadded;

/// Cooperative stop request shared between a worker and whoever may stop it.
///
/// Clones observe the same flag. Cancelling is idempotent and never blocks;
/// the worker decides when to look.
///
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<CachePadded<AtomicBool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken {
            cancelled: Arc::new(CachePadded::new(AtomicBool::new(false))),
        }
    }

    // Requests cancellation. Returns true only for the call that flipped the flag.
    //
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
