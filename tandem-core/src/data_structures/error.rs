use thiserror::Error;

/// Errors reported by [`NodeStore`](super::NodeStore) mutations.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NodeStoreError {
    #[error("out of memory: cannot allocate a node beyond the {len} already held")]
    OutOfMemory { len: usize },
}
