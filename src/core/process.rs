use super::errors::SimulationError;
use super::types::{ProcessId, SimulationTime};

/// How a resumed process gives control back to the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Suspend {
    /// Resume again after the given delay
    Hold(SimulationTime),
    /// Stay parked until another process wakes it (e.g. a pool grant)
    Wait,
    /// The process has terminated and is dropped
    Finish,
}

/// A cooperative task driven by the engine.
///
/// Each call to `resume` runs one step without interruption and ends at the
/// next suspension point.
pub trait Process<S> {
    /// Short label used in logs and protocol errors
    fn label(&self) -> String;

    /// Run until the next suspension point
    fn resume(&mut self, ctx: &mut ProcessContext<'_, S>) -> Result<Suspend, SimulationError>;
}

pub(crate) enum PendingAction<S> {
    Spawn(ProcessId, Box<dyn Process<S>>),
    Wake(ProcessId),
}

/// View of the engine handed to a process while it runs
pub struct ProcessContext<'a, S> {
    now: SimulationTime,
    process_id: ProcessId,
    state: &'a mut S,
    next_process_id: &'a mut u64,
    pending: Vec<PendingAction<S>>,
}

impl<'a, S> ProcessContext<'a, S> {
    pub(crate) fn new(
        now: SimulationTime,
        process_id: ProcessId,
        state: &'a mut S,
        next_process_id: &'a mut u64,
    ) -> Self {
        Self {
            now,
            process_id,
            state,
            next_process_id,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> SimulationTime {
        self.now
    }

    /// Id of the process currently running
    pub fn process_id(&self) -> ProcessId {
        self.process_id
    }

    pub fn state(&self) -> &S {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut *self.state
    }

    /// Start a new process; its first resumption happens at the current time
    pub fn spawn(&mut self, process: Box<dyn Process<S>>) -> ProcessId {
        let id = ProcessId::new(*self.next_process_id);
        *self.next_process_id += 1;
        self.pending.push(PendingAction::Spawn(id, process));
        id
    }

    /// Resume a waiting process at the current time
    pub fn wake(&mut self, process_id: ProcessId) {
        self.pending.push(PendingAction::Wake(process_id));
    }

    pub(crate) fn into_pending(self) -> Vec<PendingAction<S>> {
        self.pending
    }
}
