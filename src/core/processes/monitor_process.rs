use crate::core::errors::SimulationError;
use crate::core::hospital::HospitalState;
use crate::core::process::{Process, ProcessContext, Suspend};

/// Samples every pool once per monitoring interval
pub struct MonitorProcess {
    started: bool,
}

impl MonitorProcess {
    pub fn new() -> Self {
        Self { started: false }
    }
}

impl Default for MonitorProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Process<HospitalState<R>> for MonitorProcess {
    fn label(&self) -> String {
        "monitor".to_string()
    }

    fn resume(&mut self, ctx: &mut ProcessContext<'_, HospitalState<R>>) -> Result<Suspend, SimulationError> {
        if self.started {
            let now = ctx.now();
            ctx.state_mut().record_snapshots(now);
        }
        self.started = true;
        Ok(Suspend::Hold(ctx.state().config().monitoring_interval))
    }
}
