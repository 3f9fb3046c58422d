use super::errors::SimulationError;
use super::event_scheduler::EventScheduler;
use super::process::{PendingAction, Process, ProcessContext, Suspend};
use super::process_registry::ProcessRegistry;
use super::types::{ProcessId, SimulationTime};
use log::debug;

/// Observer trait for simulation events
pub trait SimulationObserver {
    /// Called when the simulated clock advances
    fn on_time_advance(&mut self, old_time: SimulationTime, new_time: SimulationTime);

    /// Called after a process has run one step
    fn on_step_complete(&mut self, time: SimulationTime, process_id: ProcessId);
}

/// Single-threaded process-interaction engine over a shared state `S`
pub struct SimulationEngine<S> {
    registry: ProcessRegistry<S>,
    scheduler: EventScheduler,
    state: S,
    current_time: SimulationTime,
    next_process_id: u64,
    steps: u64,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl<S> SimulationEngine<S> {
    /// Create a new SimulationEngine at time zero
    pub fn new(state: S) -> Self {
        Self {
            registry: ProcessRegistry::new(),
            scheduler: EventScheduler::new(),
            state,
            current_time: 0.0,
            next_process_id: 0,
            steps: 0,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the simulation
    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    /// Notify all observers of a clock advance
    fn notify_time_advance(&mut self, old_time: SimulationTime, new_time: SimulationTime) {
        for observer in &mut self.observers {
            observer.on_time_advance(old_time, new_time);
        }
    }

    /// Notify all observers of step completion
    fn notify_step_complete(&mut self, time: SimulationTime, process_id: ProcessId) {
        for observer in &mut self.observers {
            observer.on_step_complete(time, process_id);
        }
    }

    /// Register a process whose first resumption happens at `at_time`
    pub fn spawn_at(
        &mut self,
        process: Box<dyn Process<S>>,
        at_time: SimulationTime,
    ) -> Result<ProcessId, SimulationError> {
        if !at_time.is_finite() || at_time < self.current_time {
            return Err(SimulationError::protocol(
                process.label(),
                "unstarted",
                format!("cannot start at time {} (clock is at {})", at_time, self.current_time),
            ));
        }
        let process_id = ProcessId::new(self.next_process_id);
        self.next_process_id += 1;
        self.registry.register(process_id, process)?;
        self.scheduler.schedule(process_id, at_time);
        Ok(process_id)
    }

    /// Register a process that starts at the current time
    pub fn spawn(&mut self, process: Box<dyn Process<S>>) -> Result<ProcessId, SimulationError> {
        let now = self.current_time;
        self.spawn_at(process, now)
    }

    /// Process all wake-ups strictly before `horizon`, then park the clock on it
    pub fn run_until(&mut self, horizon: SimulationTime) -> Result<SimulationTime, SimulationError> {
        while let Some(next_time) = self.scheduler.peek_next_time() {
            if next_time >= horizon {
                break;
            }
            self.step()?;
        }

        if horizon > self.current_time {
            let old_time = self.current_time;
            self.current_time = horizon;
            self.notify_time_advance(old_time, horizon);
        }
        Ok(self.current_time)
    }

    /// Resume the earliest pending process, returns true if wake-ups remain
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        let wakeup = match self.scheduler.pop_next() {
            Some(wakeup) => wakeup,
            None => return Ok(false),
        };

        if wakeup.time < self.current_time {
            return Err(SimulationError::protocol(
                wakeup.process_id.to_string(),
                "scheduled",
                format!("wake-up at {} precedes clock {}", wakeup.time, self.current_time),
            ));
        }

        let old_time = self.current_time;
        self.current_time = wakeup.time;

        // Notify observers of clock advance
        if old_time != self.current_time {
            self.notify_time_advance(old_time, self.current_time);
            debug!("=== Simulation time {:.3} ===", self.current_time);
        }

        let process_id = wakeup.process_id;
        let mut process = self.registry.checkout(process_id)?;

        let mut ctx = ProcessContext::new(
            self.current_time,
            process_id,
            &mut self.state,
            &mut self.next_process_id,
        );
        let outcome = process.resume(&mut ctx);
        let pending = ctx.into_pending();
        let outcome = outcome?;

        // Spawns and wakes keep the order in which the step issued them
        for action in pending {
            match action {
                PendingAction::Spawn(child_id, child) => {
                    self.registry.register(child_id, child)?;
                    self.scheduler.schedule(child_id, self.current_time);
                }
                PendingAction::Wake(target) => {
                    if !self.registry.contains(target) && target != process_id {
                        return Err(SimulationError::protocol(
                            target.to_string(),
                            "unknown",
                            "wake requested for a process that is not registered",
                        ));
                    }
                    self.scheduler.schedule(target, self.current_time);
                }
            }
        }

        match outcome {
            Suspend::Hold(delay) => {
                if !delay.is_finite() || delay < 0.0 {
                    return Err(SimulationError::protocol(
                        process.label(),
                        "holding",
                        format!("invalid hold delay {}", delay),
                    ));
                }
                self.scheduler.schedule(process_id, self.current_time + delay);
                self.registry.checkin(process_id, process);
            }
            Suspend::Wait => {
                self.registry.checkin(process_id, process);
            }
            Suspend::Finish => {
                debug!("[Engine] {} finished at {:.3}", process.label(), self.current_time);
            }
        }

        self.steps += 1;
        self.notify_step_complete(self.current_time, process_id);

        Ok(self.has_pending_events())
    }

    /// Get current simulation time
    pub fn current_time(&self) -> SimulationTime {
        self.current_time
    }

    /// Number of process steps executed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Check if there are pending wake-ups in the scheduler
    pub fn has_pending_events(&self) -> bool {
        self.scheduler.has_events()
    }

    /// Number of live (not finished) processes
    pub fn live_processes(&self) -> usize {
        self.registry.len()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }
}
