use crate::core::errors::SimulationError;
use crate::core::hospital::HospitalState;
use crate::core::patient::Patient;
use crate::core::process::{Process, ProcessContext, Suspend};
use crate::core::resource_pool::{RequestOutcome, Ticket};
use crate::core::types::PoolKind;
use log::debug;

type HospitalContext<'a, 'b, R> = &'a mut ProcessContext<'b, HospitalState<R>>;

/// Where a patient is on its way through the unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientPhase {
    Arrived,
    AwaitingPreparation,
    Preparing,
    AwaitingTheatre,
    Operating,
    /// Holding the theatre until a recovery slot is granted
    AwaitingRecovery,
    Recovering,
    Departed,
}

impl std::fmt::Display for PatientPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Drives one patient through preparation, operation and recovery with
/// block-before-release between theatre and recovery
pub struct PatientProcess {
    patient: Option<Patient>,
    patient_id: u64,
    phase: PatientPhase,
    prep_ticket: Option<Ticket>,
    theatre_ticket: Option<Ticket>,
    recovery_ticket: Option<Ticket>,
}

impl PatientProcess {
    pub fn new(patient: Patient) -> Self {
        Self {
            patient_id: patient.id(),
            patient: Some(patient),
            phase: PatientPhase::Arrived,
            prep_ticket: None,
            theatre_ticket: None,
            recovery_ticket: None,
        }
    }

    pub fn phase(&self) -> PatientPhase {
        self.phase
    }

    fn violation(&self, reason: impl Into<String>) -> SimulationError {
        SimulationError::protocol(format!("patient-{}", self.patient_id), self.phase.to_string(), reason)
    }

    fn patient_mut(&mut self) -> Result<&mut Patient, SimulationError> {
        let (patient_id, phase) = (self.patient_id, self.phase);
        self.patient.as_mut().ok_or_else(|| {
            SimulationError::protocol(
                format!("patient-{}", patient_id),
                phase.to_string(),
                "patient record already handed over",
            )
        })
    }

    fn request<R>(ctx: HospitalContext<'_, '_, R>, kind: PoolKind) -> RequestOutcome {
        let owner = ctx.process_id();
        ctx.state_mut().pool_mut(kind).request(owner)
    }

    /// Release a held slot and resume whoever the pool handed it to
    fn release<R>(ctx: HospitalContext<'_, '_, R>, ticket: Ticket) -> Result<(), SimulationError> {
        if let Some(next_owner) = ctx.state_mut().pool_mut(ticket.pool()).release(ticket)? {
            ctx.wake(next_owner);
        }
        Ok(())
    }

    fn require_granted<R>(&self, ctx: HospitalContext<'_, '_, R>, ticket: Option<Ticket>) -> Result<Ticket, SimulationError> {
        match ticket {
            Some(ticket) if ctx.state().pool(ticket.pool()).is_active(ticket) => Ok(ticket),
            Some(ticket) => Err(self.violation(format!("resumed before {} was granted", ticket))),
            None => Err(self.violation("resumed without a pending request")),
        }
    }

    fn begin_preparation<R>(&mut self, ctx: HospitalContext<'_, '_, R>) -> Result<Suspend, SimulationError> {
        let now = ctx.now();
        let patient = self.patient_mut()?;
        patient.prep_start = Some(now);
        let hold = patient.service().preparation;
        self.phase = PatientPhase::Preparing;
        Ok(Suspend::Hold(hold))
    }

    fn begin_operation<R>(&mut self, ctx: HospitalContext<'_, '_, R>) -> Result<Suspend, SimulationError> {
        let now = ctx.now();
        let patient = self.patient_mut()?;
        patient.operation_start = Some(now);
        let hold = patient.service().operation;
        self.phase = PatientPhase::Operating;
        Ok(Suspend::Hold(hold))
    }

    /// The AwaitingRecovery -> Recovering transition. Taking the recovery slot
    /// and giving up the theatre happen together, and only here.
    fn enter_recovery<R>(&mut self, ctx: HospitalContext<'_, '_, R>) -> Result<Suspend, SimulationError> {
        self.require_granted(ctx, self.recovery_ticket)?;
        let theatre = self
            .theatre_ticket
            .take()
            .ok_or_else(|| self.violation("entering recovery without holding the theatre"))?;

        let now = ctx.now();
        let patient_id = self.patient_id;
        let patient = self.patient_mut()?;
        if patient.is_blocked() {
            patient.blocking_end = Some(now);
            debug!("[Patient {}] Unblocked theatre at {:.3}", patient_id, now);
        }
        patient.recovery_start = Some(now);
        let hold = patient.service().recovery;

        Self::release(ctx, theatre)?;
        self.phase = PatientPhase::Recovering;
        Ok(Suspend::Hold(hold))
    }

    fn depart<R>(&mut self, ctx: HospitalContext<'_, '_, R>) -> Result<Suspend, SimulationError> {
        let now = ctx.now();
        let recovery = self
            .recovery_ticket
            .take()
            .ok_or_else(|| self.violation("departing without a recovery slot"))?;
        self.patient_mut()?.recovery_end = Some(now);

        Self::release(ctx, recovery)?;
        self.phase = PatientPhase::Departed;

        let patient = self
            .patient
            .take()
            .ok_or_else(|| self.violation("patient record already handed over"))?;
        debug!("[Patient {}] Departed at {:.3}", self.patient_id, now);
        ctx.state_mut().record_departure(patient, now)?;
        Ok(Suspend::Finish)
    }
}

impl<R> Process<HospitalState<R>> for PatientProcess {
    fn label(&self) -> String {
        format!("patient-{}", self.patient_id)
    }

    fn resume(&mut self, ctx: &mut ProcessContext<'_, HospitalState<R>>) -> Result<Suspend, SimulationError> {
        match self.phase {
            PatientPhase::Arrived => {
                let outcome = Self::request(ctx, PoolKind::Preparation);
                self.prep_ticket = Some(outcome.ticket());
                if outcome.is_granted() {
                    self.begin_preparation(ctx)
                } else {
                    self.phase = PatientPhase::AwaitingPreparation;
                    Ok(Suspend::Wait)
                }
            }
            PatientPhase::AwaitingPreparation => {
                self.require_granted(ctx, self.prep_ticket)?;
                self.begin_preparation(ctx)
            }
            PatientPhase::Preparing => {
                let now = ctx.now();
                self.patient_mut()?.prep_end = Some(now);
                let prep = self
                    .prep_ticket
                    .take()
                    .ok_or_else(|| self.violation("preparing without a preparation slot"))?;
                Self::release(ctx, prep)?;

                let outcome = Self::request(ctx, PoolKind::Theatre);
                self.theatre_ticket = Some(outcome.ticket());
                if outcome.is_granted() {
                    self.begin_operation(ctx)
                } else {
                    self.phase = PatientPhase::AwaitingTheatre;
                    Ok(Suspend::Wait)
                }
            }
            PatientPhase::AwaitingTheatre => {
                self.require_granted(ctx, self.theatre_ticket)?;
                self.begin_operation(ctx)
            }
            PatientPhase::Operating => {
                let now = ctx.now();
                self.patient_mut()?.operation_end = Some(now);

                let outcome = Self::request(ctx, PoolKind::Recovery);
                self.recovery_ticket = Some(outcome.ticket());
                if outcome.is_granted() {
                    self.enter_recovery(ctx)
                } else {
                    // Recovery is full: keep the theatre and wait for a bed
                    self.patient_mut()?.blocking_start = Some(now);
                    self.phase = PatientPhase::AwaitingRecovery;
                    debug!("[Patient {}] Blocking theatre at {:.3}", self.patient_id, now);
                    Ok(Suspend::Wait)
                }
            }
            PatientPhase::AwaitingRecovery => self.enter_recovery(ctx),
            PatientPhase::Recovering => self.depart(ctx),
            PatientPhase::Departed => Err(self.violation("resumed after departure")),
        }
    }
}
