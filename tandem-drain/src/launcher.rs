use std::thread::{self, JoinHandle};

use crate::config::DrainConfig;
use crate::error::DrainError;
use crate::worker::{Worker, WorkerReport};

/// Starts a worker on its own thread of execution.
///
pub trait WorkerLauncher {
    fn launch(&self, worker: Worker) -> Result<JoinHandle<WorkerReport>, DrainError>;
}

/// Launches each worker on a named OS thread.
///
#[derive(Debug, Default, Clone)]
pub struct ThreadLauncher {
    stack_size: Option<usize>,
}

impl ThreadLauncher {
    pub fn new() -> Self {
        ThreadLauncher { stack_size: None }
    }

    pub fn from_config(config: &DrainConfig) -> Self {
        ThreadLauncher {
            stack_size: config.stack_size,
        }
    }
}

impl WorkerLauncher for ThreadLauncher {
    fn launch(&self, worker: Worker) -> Result<JoinHandle<WorkerReport>, DrainError> {
        let direction = worker.direction();

        let mut builder = thread::Builder::new().name(format!("drain-{direction}"));
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }

        builder
            .spawn(move || worker.run())
            .map_err(|source| DrainError::WorkerLaunch { direction, source })
    }
}
