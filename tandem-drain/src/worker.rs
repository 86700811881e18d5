//! Drain workers
//!
//! A worker repeatedly claims one node from its end of the shared list and
//! folds the value into counters only it touches.
//!
//! ```text
//!   ┌───────────────────┐  yes
//!   │ cancel requested? ├──────► StoppedByRequest
//!   └─────────┬─────────┘
//!             │ no
//!             ▼
//!   ┌───────────────────┐  empty
//!   │ take_from_end     ├──────► Drained
//!   └─────────┬─────────┘
//!             │ value
//!             ▼
//!   ┌───────────────────┐
//!   │ fold (no lock)    ├──┐
//!   └───────────────────┘  │
//!             ▲            │
//!             └────────────┘
//! ```
//!
//! Both terminal states are absorbing.

use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;

use tandem_core::bit_count::{one_count, significant_zero_count};
use tandem_core::{CancellationToken, Direction, GuardedList, StartGate};

/// How a drain loop ended.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    /// Cancellation was observed before the list ran dry.
    StoppedByRequest,
    /// The list was observed empty.
    Drained,
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalState::StoppedByRequest => f.write_str("stopped by request"),
            TerminalState::Drained => f.write_str("drained"),
        }
    }
}

/// Runs the drain protocol on one end of `list` until it is cancelled or empty.
///
/// Cancellation is checked once per iteration, before a node is claimed, so a
/// claimed value is always passed to `fold`.
///
pub fn drain_loop<T>(
    list: &GuardedList<T>,
    direction: Direction,
    token: &CancellationToken,
    mut fold: impl FnMut(T),
) -> TerminalState {
    loop {
        if token.is_cancelled() {
            return TerminalState::StoppedByRequest;
        }

        // The lock is held inside take_from_end only.
        //
        match list.take_from_end(direction) {
            Some(value) => fold(value),
            None => return TerminalState::Drained,
        }
    }
}

/// Private accumulator of one worker.
///
/// The head worker counts significant zero bits, the tail worker counts one bits.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerState {
    direction: Direction,
    count_bits: u64,
    count_nodes: u64,
}

impl WorkerState {
    pub fn new(direction: Direction) -> Self {
        WorkerState {
            direction,
            count_bits: 0,
            count_nodes: 0,
        }
    }

    #[inline]
    pub fn fold(&mut self, value: i32) {
        let bits = match self.direction {
            Direction::Head => significant_zero_count(value),
            Direction::Tail => one_count(value),
        };

        self.count_nodes += 1;
        self.count_bits += u64::from(bits);
    }

    pub fn count_bits(&self) -> u64 {
        self.count_bits
    }

    pub fn count_nodes(&self) -> u64 {
        self.count_nodes
    }

    pub fn finish(self, terminal_state: TerminalState) -> WorkerReport {
        WorkerReport {
            direction: self.direction,
            count_bits: self.count_bits,
            count_nodes: self.count_nodes,
            terminal_state,
        }
    }
}

/// Final counters of a worker, readable once it terminated.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub direction: Direction,
    pub count_bits: u64,
    pub count_nodes: u64,
    pub terminal_state: TerminalState,
}

impl WorkerReport {
    #[inline]
    pub fn counts(&self) -> (u64, u64) {
        (self.count_bits, self.count_nodes)
    }
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = match self.direction {
            Direction::Head => 0,
            Direction::Tail => 1,
        };

        write!(
            f,
            "{} worker: {} bits={} in {} nodes ({})",
            self.direction, self.count_bits, bit, self.count_nodes, self.terminal_state
        )
    }
}

/// A drain worker bound to one end of the shared list.
///
pub struct Worker {
    direction: Direction,
    list: Arc<GuardedList<i32>>,
    token: CancellationToken,
    start_gate: Arc<StartGate>,
}

impl Worker {
    pub fn new(
        direction: Direction,
        list: Arc<GuardedList<i32>>,
        token: CancellationToken,
        start_gate: Arc<StartGate>,
    ) -> Self {
        Worker {
            direction,
            list,
            token,
            start_gate,
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Waits for the start gate, drains, and returns the final counters.
    ///
    pub fn run(self) -> WorkerReport {
        self.start_gate.wait();
        log::debug!("{} worker started", self.direction);

        let mut state = WorkerState::new(self.direction);
        let terminal_state = drain_loop(&self.list, self.direction, &self.token, |value| {
            state.fold(value)
        });

        let report = state.finish(terminal_state);
        log::debug!("{report}");

        report
    }
}

/// Coordinator-side handle of a launched worker.
///
/// Cancelling and joining are both idempotent: the first join consumes the
/// thread handle and caches the report, later joins return the cached report.
///
pub struct WorkerHandle {
    direction: Direction,
    token: CancellationToken,
    join_handle: Option<JoinHandle<WorkerReport>>,
    report: Option<WorkerReport>,
}

impl WorkerHandle {
    pub fn new(
        direction: Direction,
        token: CancellationToken,
        join_handle: JoinHandle<WorkerReport>,
    ) -> Self {
        WorkerHandle {
            direction,
            token,
            join_handle: Some(join_handle),
            report: None,
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    // Requests cancellation. Returns false when it was already requested.
    //
    pub fn cancel(&self) -> bool {
        self.token.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    // True once the worker thread has returned, joined or not.
    //
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(|join_handle| join_handle.is_finished())
    }

    /// Blocks until the worker reached a terminal state and returns its report.
    ///
    /// Returns `None` if the worker thread panicked.
    ///
    pub fn join(&mut self) -> Option<WorkerReport> {
        if let Some(join_handle) = self.join_handle.take() {
            match join_handle.join() {
                Ok(report) => self.report = Some(report),
                Err(_) => log::error!("{} worker panicked", self.direction),
            }
        }

        self.report
    }

    pub fn report(&self) -> Option<WorkerReport> {
        self.report
    }
}
