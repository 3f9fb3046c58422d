use super::patient_process::PatientProcess;
use crate::core::errors::SimulationError;
use crate::core::hospital::HospitalState;
use crate::core::process::{Process, ProcessContext, Suspend};
use log::debug;
use rand::Rng;

/// Poisson arrival stream: waits an exponential gap, admits a patient,
/// starts its process, repeats until the horizon cuts it off
pub struct ArrivalProcess {
    started: bool,
}

impl ArrivalProcess {
    pub fn new() -> Self {
        Self { started: false }
    }
}

impl Default for ArrivalProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Process<HospitalState<R>> for ArrivalProcess {
    fn label(&self) -> String {
        "arrivals".to_string()
    }

    fn resume(&mut self, ctx: &mut ProcessContext<'_, HospitalState<R>>) -> Result<Suspend, SimulationError> {
        if self.started {
            let now = ctx.now();
            let patient = ctx.state_mut().admit_patient(now);
            debug!(
                "[Arrivals] Patient {} ({}) arrived at {:.3}",
                patient.id(),
                patient.kind(),
                now
            );
            ctx.spawn(Box::new(PatientProcess::new(patient)));
        }
        self.started = true;

        let gap = ctx.state_mut().next_interarrival();
        Ok(Suspend::Hold(gap))
    }
}
