use std::fmt;
use std::sync::Arc;

use tandem_core::{CancellationToken, Direction, GuardedList, NodeStore, StartGate};

use crate::config::DrainConfig;
use crate::error::DrainError;
use crate::launcher::{ThreadLauncher, WorkerLauncher};
use crate::random::{RandomSource, ThreadRandom};
use crate::worker::{Worker, WorkerHandle, WorkerReport};

// Defines the drain Coordinator.
//
// Owns the shared list and one optional handle per direction. A slot is None
// when its worker failed to launch.
//
pub struct Coordinator {
    list: Arc<GuardedList<i32>>,
    workers: [Option<WorkerHandle>; 2],
    start_gate: Arc<StartGate>,
}

/// Everything shutdown learned: one report per launched worker and the number
/// of nodes freed without being counted.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub head: Option<WorkerReport>,
    pub tail: Option<WorkerReport>,
    pub leftover_freed: usize,
}

impl ShutdownReport {
    pub fn worker(&self, direction: Direction) -> Option<&WorkerReport> {
        match direction {
            Direction::Head => self.head.as_ref(),
            Direction::Tail => self.tail.as_ref(),
        }
    }

    // Nodes consumed by both workers together.
    //
    pub fn consumed(&self) -> u64 {
        self.head
            .iter()
            .chain(self.tail.iter())
            .map(|report| report.count_nodes)
            .sum()
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for direction in Direction::ALL {
            match self.worker(direction) {
                Some(report) => writeln!(f, "{report}")?,
                None => writeln!(f, "{direction} worker: not running")?,
            }
        }

        write!(f, "leftover nodes freed: {}", self.leftover_freed)
    }
}

impl Coordinator {
    /// Populates the list with random values and launches both workers on OS threads.
    ///
    pub fn initialize(config: &DrainConfig) -> Result<Self, DrainError> {
        Self::initialize_with(config, ThreadRandom, &ThreadLauncher::from_config(config))
    }

    pub fn initialize_with(
        config: &DrainConfig,
        random_source: impl RandomSource,
        launcher: &impl WorkerLauncher,
    ) -> Result<Self, DrainError> {
        let coordinator = Self::initialize_paused(config, random_source, launcher)?;
        coordinator.resume();

        Ok(coordinator)
    }

    /// Like [`initialize_with`](Self::initialize_with), but the workers wait at
    /// a start gate until [`resume`](Self::resume) or shutdown.
    ///
    pub fn initialize_paused(
        config: &DrainConfig,
        random_source: impl RandomSource,
        launcher: &impl WorkerLauncher,
    ) -> Result<Self, DrainError> {
        // Population failure drops the partial list here, before any worker exists.
        //
        let list = Arc::new(Self::populate(config, random_source)?);
        let start_gate = Arc::new(StartGate::new());

        let workers =
            Direction::ALL.map(|direction| Self::launch(direction, &list, &start_gate, launcher));

        log::debug!(
            "coordinator initialized with {} nodes, {} of 2 workers launched",
            config.num_elements,
            workers.iter().flatten().count()
        );

        Ok(Coordinator {
            list,
            workers,
            start_gate,
        })
    }

    fn populate(
        config: &DrainConfig,
        mut random_source: impl RandomSource,
    ) -> Result<GuardedList<i32>, DrainError> {
        let store = match config.node_limit {
            Some(limit) => NodeStore::with_limit(limit),
            None => NodeStore::new(),
        };

        let list = GuardedList::with_store(store);
        list.populate(config.num_elements, || random_source.next_random_i32())
            .map_err(|source| DrainError::OutOfMemory {
                appended: list.len(),
                requested: config.num_elements,
                source,
            })?;

        Ok(list)
    }

    fn launch(
        direction: Direction,
        list: &Arc<GuardedList<i32>>,
        start_gate: &Arc<StartGate>,
        launcher: &impl WorkerLauncher,
    ) -> Option<WorkerHandle> {
        let token = CancellationToken::new();
        let worker = Worker::new(
            direction,
            Arc::clone(list),
            token.clone(),
            Arc::clone(start_gate),
        );

        match launcher.launch(worker) {
            Ok(join_handle) => Some(WorkerHandle::new(direction, token, join_handle)),
            Err(error) => {
                // The surviving worker drains the whole list on its own.
                //
                log::warn!("{error}, {direction} slot left empty: {error:?}");
                None
            }
        }
    }

    // Releases workers held at the start gate. Returns false if already released.
    //
    pub fn resume(&self) -> bool {
        self.start_gate.open()
    }

    #[inline]
    pub fn worker(&self, direction: Direction) -> Option<&WorkerHandle> {
        self.workers[direction.index()].as_ref()
    }

    // Requests cancellation of one worker. No-op for absent or finished workers.
    //
    pub fn cancel(&self, direction: Direction) -> bool {
        self.worker(direction).is_some_and(WorkerHandle::cancel)
    }

    pub fn cancel_all(&self) {
        for worker in self.workers.iter().flatten() {
            worker.cancel();
        }
    }

    /// Blocks until the worker terminates and returns its report.
    /// Joining an already joined worker returns the same report.
    ///
    pub fn join(&mut self, direction: Direction) -> Option<WorkerReport> {
        self.workers[direction.index()]
            .as_mut()
            .and_then(WorkerHandle::join)
    }

    // Number of nodes still in the list.
    //
    pub fn remaining(&self) -> usize {
        self.list.len()
    }

    /// Cancels and joins both workers, then frees whatever they left behind.
    ///
    pub fn shutdown(mut self) -> ShutdownReport {
        // Cancel before opening the gate so paused workers stop at their first check.
        //
        self.cancel_all();
        self.resume();

        let [head, tail] = Direction::ALL.map(|direction| self.join(direction));
        let leftover_freed = self.list.force_drain();

        let report = ShutdownReport {
            head,
            tail,
            leftover_freed,
        };

        log::info!("coordinator shut down\n{report}");

        report
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        // Never leave a worker parked at the gate.
        //
        self.cancel_all();
        self.resume();
    }
}
