pub mod core;

// Re-export commonly used types
pub use crate::core::config::{HospitalConfig, PatientTypeConfig};
pub use crate::core::errors::SimulationError;
pub use crate::core::execution::{ConcurrencyMode, ReplicationConfig, ReplicationRunner, StudyReport};
pub use crate::core::hospital::{HospitalSimulation, HospitalState, ReplicationOutput, RunCounters};
pub use crate::core::metrics::{PoolMetrics, ReplicationMetrics};
pub use crate::core::patient::{Patient, PatientRecord, ServiceTimes};
pub use crate::core::process::{Process, ProcessContext, Suspend};
pub use crate::core::resource_pool::{PoolSnapshot, ResourcePool};
pub use crate::core::simulation_engine::{SimulationEngine, SimulationObserver};
pub use crate::core::types::{PatientId, PatientKind, PoolKind, ProcessId, SimulationTime};
