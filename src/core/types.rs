use serde::{Deserialize, Serialize};

/// Simulated time in minutes since the start of a replication
pub type SimulationTime = f64;

/// Identifier of a live process inside one simulation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessId(pub(crate) u64);

impl ProcessId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proc-{}", self.0)
    }
}

/// Sequence number of a patient within one replication, starting at 1
pub type PatientId = u64;

/// The three capacity-limited stages of the surgical unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolKind {
    Preparation,
    Theatre,
    Recovery,
}

impl PoolKind {
    pub const ALL: [PoolKind; 3] = [PoolKind::Preparation, PoolKind::Theatre, PoolKind::Recovery];
}

impl std::fmt::Display for PoolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolKind::Preparation => write!(f, "preparation"),
            PoolKind::Theatre => write!(f, "theatre"),
            PoolKind::Recovery => write!(f, "recovery"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientKind {
    Regular,
    Emergency,
}

impl Default for PatientKind {
    fn default() -> Self {
        PatientKind::Regular
    }
}

impl std::fmt::Display for PatientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatientKind::Regular => write!(f, "regular"),
            PatientKind::Emergency => write!(f, "emergency"),
        }
    }
}
