use std::sync::{Condvar, Mutex, PoisonError};

/// One-shot gate: threads block in `wait` until someone calls `open`.
///
/// Once open it stays open; later waiters pass straight through.
///
pub struct StartGate {
    open: Mutex<bool>,
    condvar: Condvar,
}

impl Default for StartGate {
    fn default() -> Self {
        Self::new()
    }
}

impl StartGate {
    pub fn new() -> Self {
        StartGate {
            open: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    // Creates a gate that never blocks.
    //
    pub fn opened() -> Self {
        StartGate {
            open: Mutex::new(true),
            condvar: Condvar::new(),
        }
    }

    // Opens the gate, waking all waiters. Returns false if it was already open.
    //
    pub fn open(&self) -> bool {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if *open {
            return false;
        }

        *open = true;
        self.condvar.notify_all();
        true
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Blocks until the gate is open.
    //
    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        while !*open {
            open = self
                .condvar
                .wait(open)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
