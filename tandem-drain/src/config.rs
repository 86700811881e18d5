//! Drain configuration.

/// Default number of nodes the list is populated with.
///
pub const DEFAULT_NUM_ELEMENTS: usize = 1000;

/// Sizes the list and the worker threads a Coordinator starts with.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainConfig {
    pub num_elements: usize,

    // Hard cap on live nodes. Appending past it reports out of memory.
    //
    pub node_limit: Option<usize>,

    // Worker thread stack size in bytes, platform default when unset.
    //
    pub stack_size: Option<usize>,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            num_elements: DEFAULT_NUM_ELEMENTS,
            node_limit: None,
            stack_size: None,
        }
    }
}

impl DrainConfig {
    pub fn builder() -> DrainConfigBuilder {
        DrainConfigBuilder::new()
    }
}

pub struct DrainConfigBuilder {
    config: DrainConfig,
}

impl DrainConfigBuilder {
    // Starts from the defaults.
    //
    pub fn new() -> Self {
        Self {
            config: DrainConfig::default(),
        }
    }

    pub fn num_elements(mut self, n: usize) -> Self {
        self.config.num_elements = n;
        self
    }

    pub fn node_limit(mut self, limit: usize) -> Self {
        self.config.node_limit = Some(limit);
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.config.stack_size = Some(bytes);
        self
    }

    pub fn build(self) -> DrainConfig {
        self.config
    }
}

impl Default for DrainConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
