pub mod config;
pub mod replication_runner;

// Re-export commonly used types
pub use config::{ConcurrencyMode, ReplicationConfig};
pub use replication_runner::{run_replication, ReplicationReport, ReplicationRunner, StudyReport};
