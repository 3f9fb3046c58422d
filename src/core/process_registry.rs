use std::collections::HashMap;
use super::errors::SimulationError;
use super::process::Process;
use super::types::ProcessId;

/// Owns every live process of one engine, keyed by id
pub struct ProcessRegistry<S> {
    processes: HashMap<ProcessId, Box<dyn Process<S>>>,
}

impl<S> ProcessRegistry<S> {
    /// Create a new ProcessRegistry
    pub fn new() -> Self {
        Self {
            processes: HashMap::new(),
        }
    }

    /// Register a process under an id allocated by the engine
    pub fn register(&mut self, process_id: ProcessId, process: Box<dyn Process<S>>) -> Result<(), SimulationError> {
        // Check for duplicate registration
        if self.processes.contains_key(&process_id) {
            return Err(SimulationError::protocol(
                process_id.to_string(),
                "registered",
                "process id is already registered",
            ));
        }

        self.processes.insert(process_id, process);
        Ok(())
    }

    /// Take a process out for the duration of its step
    pub fn checkout(&mut self, process_id: ProcessId) -> Result<Box<dyn Process<S>>, SimulationError> {
        self.processes.remove(&process_id).ok_or_else(|| {
            SimulationError::protocol(
                process_id.to_string(),
                "unknown",
                "wake-up for a process that is not registered (terminated or never spawned)",
            )
        })
    }

    /// Put a suspended process back
    pub fn checkin(&mut self, process_id: ProcessId, process: Box<dyn Process<S>>) {
        self.processes.insert(process_id, process);
    }

    pub fn contains(&self, process_id: ProcessId) -> bool {
        self.processes.contains_key(&process_id)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

impl<S> Default for ProcessRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
