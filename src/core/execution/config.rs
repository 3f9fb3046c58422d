//! Configuration for running multiple replications
//!
//! This module provides configuration types for controlling how independent
//! replications are executed, including concurrency settings and seeding.

use serde::{Deserialize, Serialize};

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Replications run one after another on the calling thread
    Sequential,
    /// Replications run in parallel using Rayon; each one is still sequential inside
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Sequential
    }
}

/// Configuration for a replication study
///
/// Replication `i` is seeded with `base_seed + i`, so the same study run
/// twice (or under a different concurrency mode) yields identical outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// The concurrency mode to use for execution
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel execution
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
    /// Number of independent replications
    pub num_replications: usize,
    /// Seed of replication 0
    pub base_seed: u64,
}

impl ReplicationConfig {
    /// Create a new configuration with default values
    ///
    /// Default configuration runs 30 sequential replications from seed 42
    pub fn new() -> Self {
        Self {
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
            num_replications: 30,
            base_seed: 42,
        }
    }

    /// Set the concurrency mode for the study
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel execution
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub fn with_replications(mut self, count: usize) -> Self {
        self.num_replications = count;
        self
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    /// Seed used for one replication
    pub fn seed_for(&self, replication_id: usize) -> u64 {
        self.base_seed.wrapping_add(replication_id as u64)
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self::new()
    }
}
