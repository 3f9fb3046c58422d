use super::types::{ProcessId, SimulationTime};

/// A pending resumption of one process at an absolute simulated time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wakeup {
    pub time: SimulationTime,
    pub process_id: ProcessId,
}

impl Wakeup {
    pub fn new(time: SimulationTime, process_id: ProcessId) -> Self {
        Self { time, process_id }
    }
}
