use super::config::HospitalConfig;
use super::errors::SimulationError;
use super::types::{PatientId, PatientKind, SimulationTime};
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};

/// Service durations drawn once when a patient is created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceTimes {
    pub preparation: SimulationTime,
    pub operation: SimulationTime,
    pub recovery: SimulationTime,
}

impl ServiceTimes {
    pub fn new(preparation: SimulationTime, operation: SimulationTime, recovery: SimulationTime) -> Self {
        Self {
            preparation,
            operation,
            recovery,
        }
    }

    pub fn total(&self) -> SimulationTime {
        self.preparation + self.operation + self.recovery
    }
}

/// A patient in flight. Timestamps are filled in by its own patient process.
#[derive(Debug, Clone)]
pub struct Patient {
    id: PatientId,
    kind: PatientKind,
    service: ServiceTimes,
    arrival: SimulationTime,
    pub(crate) prep_start: Option<SimulationTime>,
    pub(crate) prep_end: Option<SimulationTime>,
    pub(crate) operation_start: Option<SimulationTime>,
    pub(crate) operation_end: Option<SimulationTime>,
    pub(crate) blocking_start: Option<SimulationTime>,
    pub(crate) blocking_end: Option<SimulationTime>,
    pub(crate) recovery_start: Option<SimulationTime>,
    pub(crate) recovery_end: Option<SimulationTime>,
}

impl Patient {
    pub fn new(id: PatientId, kind: PatientKind, arrival: SimulationTime, service: ServiceTimes) -> Self {
        Self {
            id,
            kind,
            service,
            arrival,
            prep_start: None,
            prep_end: None,
            operation_start: None,
            operation_end: None,
            blocking_start: None,
            blocking_end: None,
            recovery_start: None,
            recovery_end: None,
        }
    }

    pub fn id(&self) -> PatientId {
        self.id
    }

    pub fn kind(&self) -> PatientKind {
        self.kind
    }

    pub fn service(&self) -> &ServiceTimes {
        &self.service
    }

    pub fn arrival(&self) -> SimulationTime {
        self.arrival
    }

    /// True once a recovery request found the pool full
    pub fn is_blocked(&self) -> bool {
        self.blocking_start.is_some()
    }

    /// Freeze a departed patient into its output record
    pub fn into_record(self) -> Result<PatientRecord, SimulationError> {
        let id = self.id;
        let missing = |field: &str| {
            SimulationError::protocol(
                format!("patient-{}", id),
                "Departed",
                format!("departed without a {} timestamp", field),
            )
        };

        let blocking = match (self.blocking_start, self.blocking_end) {
            (Some(start), Some(end)) => Some(BlockingInterval { start, end }),
            (None, None) => None,
            (Some(_), None) => return Err(missing("blocking_end")),
            (None, Some(_)) => return Err(missing("blocking_start")),
        };
        let recovery_end = self.recovery_end.ok_or_else(|| missing("recovery_end"))?;

        Ok(PatientRecord {
            id,
            kind: self.kind,
            service: self.service,
            arrival: self.arrival,
            prep_start: self.prep_start.ok_or_else(|| missing("prep_start"))?,
            prep_end: self.prep_end.ok_or_else(|| missing("prep_end"))?,
            operation_start: self.operation_start.ok_or_else(|| missing("operation_start"))?,
            operation_end: self.operation_end.ok_or_else(|| missing("operation_end"))?,
            blocking,
            recovery_start: self.recovery_start.ok_or_else(|| missing("recovery_start"))?,
            recovery_end,
            departure: recovery_end,
        })
    }
}

/// Interval during which a patient kept the theatre waiting for recovery
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockingInterval {
    pub start: SimulationTime,
    pub end: SimulationTime,
}

impl BlockingInterval {
    pub fn duration(&self) -> SimulationTime {
        self.end - self.start
    }
}

/// Immutable journey of a patient who departed after the warmup period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub kind: PatientKind,
    pub service: ServiceTimes,
    pub arrival: SimulationTime,
    pub prep_start: SimulationTime,
    pub prep_end: SimulationTime,
    pub operation_start: SimulationTime,
    pub operation_end: SimulationTime,
    pub blocking: Option<BlockingInterval>,
    pub recovery_start: SimulationTime,
    pub recovery_end: SimulationTime,
    pub departure: SimulationTime,
}

impl PatientRecord {
    pub fn blocked(&self) -> bool {
        self.blocking.is_some()
    }

    /// Zero when the patient never blocked the theatre
    pub fn blocking_duration(&self) -> SimulationTime {
        self.blocking.map_or(0.0, |b| b.duration())
    }

    pub fn total_time(&self) -> SimulationTime {
        self.departure - self.arrival
    }

    pub fn wait_for_preparation(&self) -> SimulationTime {
        self.prep_start - self.arrival
    }

    pub fn wait_for_theatre(&self) -> SimulationTime {
        self.operation_start - self.prep_end
    }

    pub fn wait_for_recovery(&self) -> SimulationTime {
        self.recovery_start - self.operation_end
    }

    /// Time the theatre stayed occupied by this patient
    pub fn theatre_hold_time(&self) -> SimulationTime {
        self.recovery_start - self.operation_start
    }

    /// Timestamps never decrease along the patient's path
    pub fn is_chronological(&self) -> bool {
        let mut chain = vec![
            self.arrival,
            self.prep_start,
            self.prep_end,
            self.operation_start,
            self.operation_end,
        ];
        if let Some(blocking) = self.blocking {
            chain.push(blocking.start);
            chain.push(blocking.end);
        }
        chain.extend([self.recovery_start, self.recovery_end, self.departure]);
        chain.windows(2).all(|pair| pair[0] <= pair[1]) && self.recovery_end == self.departure
    }
}

/// Service-time distributions of one patient type, resolved from config
#[derive(Debug, Clone)]
pub struct ServiceProfile {
    pub kind: PatientKind,
    preparation: Exp<f64>,
    operation: Exp<f64>,
    recovery: Exp<f64>,
}

impl ServiceProfile {
    pub fn new(kind: PatientKind, mean_prep: f64, mean_operation: f64, mean_recovery: f64) -> Result<Self, SimulationError> {
        Ok(Self {
            kind,
            preparation: exponential("mean_prep_time", mean_prep)?,
            operation: exponential("mean_operation_time", mean_operation)?,
            recovery: exponential("mean_recovery_time", mean_recovery)?,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ServiceTimes {
        let preparation = self.preparation.sample(rng);
        let operation = self.operation.sample(rng);
        let recovery = self.recovery.sample(rng);
        ServiceTimes::new(preparation, operation, recovery)
    }
}

/// Draws inter-arrival gaps and new patients for the arrival process
#[derive(Debug, Clone)]
pub struct PatientGenerator {
    interarrival: Exp<f64>,
    profiles: Vec<ServiceProfile>,
    selector: Option<WeightedIndex<f64>>,
}

impl PatientGenerator {
    pub fn from_config(config: &HospitalConfig) -> Result<Self, SimulationError> {
        let interarrival = exponential("mean_interarrival", config.mean_interarrival)?;

        if config.patient_mix.is_empty() {
            let regular = ServiceProfile::new(
                PatientKind::Regular,
                config.mean_prep_time,
                config.mean_operation_time,
                config.mean_recovery_time,
            )?;
            return Ok(Self {
                interarrival,
                profiles: vec![regular],
                selector: None,
            });
        }

        let mut profiles = Vec::with_capacity(config.patient_mix.len());
        for entry in &config.patient_mix {
            profiles.push(ServiceProfile::new(
                entry.kind,
                entry.mean_prep_time.unwrap_or(config.mean_prep_time),
                entry.mean_operation_time.unwrap_or(config.mean_operation_time),
                entry.mean_recovery_time.unwrap_or(config.mean_recovery_time),
            )?);
        }
        let selector = WeightedIndex::new(config.patient_mix.iter().map(|entry| entry.weight))
            .map_err(|e| SimulationError::InvalidConfiguration(format!("invalid patient_mix weights: {}", e)))?;

        Ok(Self {
            interarrival,
            profiles,
            selector: Some(selector),
        })
    }

    pub fn next_interarrival<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulationTime {
        self.interarrival.sample(rng)
    }

    /// Pick the patient type (only when a mix is configured), then draw the
    /// preparation, operation and recovery times in that order
    pub fn create_patient<R: Rng + ?Sized>(&self, id: PatientId, arrival: SimulationTime, rng: &mut R) -> Patient {
        let profile = match &self.selector {
            Some(selector) => &self.profiles[selector.sample(rng)],
            None => &self.profiles[0],
        };
        Patient::new(id, profile.kind, arrival, profile.sample(rng))
    }
}

fn exponential(name: &str, mean: f64) -> Result<Exp<f64>, SimulationError> {
    if !(mean.is_finite() && mean > 0.0) {
        return Err(SimulationError::InvalidConfiguration(format!(
            "{} must be a positive number, got {}",
            name, mean
        )));
    }
    Exp::new(1.0 / mean)
        .map_err(|e| SimulationError::InvalidConfiguration(format!("{}: {}", name, e)))
}
