use super::errors::SimulationError;
use super::types::{PatientKind, SimulationTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Service-time overrides and mixture weight for one patient type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientTypeConfig {
    pub kind: PatientKind,
    pub weight: f64,
    #[serde(default)]
    pub mean_prep_time: Option<f64>,
    #[serde(default)]
    pub mean_operation_time: Option<f64>,
    #[serde(default)]
    pub mean_recovery_time: Option<f64>,
}

impl PatientTypeConfig {
    pub fn new(kind: PatientKind, weight: f64) -> Self {
        Self {
            kind,
            weight,
            mean_prep_time: None,
            mean_operation_time: None,
            mean_recovery_time: None,
        }
    }

    pub fn with_mean_prep_time(mut self, minutes: f64) -> Self {
        self.mean_prep_time = Some(minutes);
        self
    }

    pub fn with_mean_operation_time(mut self, minutes: f64) -> Self {
        self.mean_operation_time = Some(minutes);
        self
    }

    pub fn with_mean_recovery_time(mut self, minutes: f64) -> Self {
        self.mean_recovery_time = Some(minutes);
        self
    }
}

/// Parameters of one surgical-unit replication. All times are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalConfig {
    pub num_prep_rooms: usize,
    pub num_operating_theatres: usize,
    pub num_recovery_rooms: usize,

    pub mean_interarrival: f64,
    pub mean_prep_time: f64,
    pub mean_operation_time: f64,
    pub mean_recovery_time: f64,

    pub sim_duration: SimulationTime,
    pub warmup_period: SimulationTime,
    pub monitoring_interval: SimulationTime,

    /// Empty means every patient is regular with the base means
    pub patient_mix: Vec<PatientTypeConfig>,
}

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            num_prep_rooms: 3,
            num_operating_theatres: 1,
            num_recovery_rooms: 3,
            mean_interarrival: 25.0,
            mean_prep_time: 40.0,
            mean_operation_time: 20.0,
            mean_recovery_time: 40.0,
            sim_duration: 24.0 * 60.0,
            warmup_period: 8.0 * 60.0,
            monitoring_interval: 60.0,
            patient_mix: Vec::new(),
        }
    }
}

impl HospitalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline() -> Self {
        Self::default()
    }

    pub fn high_load() -> Self {
        Self::default().with_mean_interarrival(15.0)
    }

    pub fn low_load() -> Self {
        Self::default().with_mean_interarrival(40.0)
    }

    /// 80% regular, 20% emergency patients with longer operations
    pub fn with_emergency_mix(self) -> Self {
        self.with_patient_mix(vec![
            PatientTypeConfig::new(PatientKind::Regular, 0.8),
            PatientTypeConfig::new(PatientKind::Emergency, 0.2).with_mean_operation_time(35.0),
        ])
    }

    pub fn with_capacities(mut self, prep: usize, theatres: usize, recovery: usize) -> Self {
        self.num_prep_rooms = prep;
        self.num_operating_theatres = theatres;
        self.num_recovery_rooms = recovery;
        self
    }

    pub fn with_recovery_rooms(mut self, rooms: usize) -> Self {
        self.num_recovery_rooms = rooms;
        self
    }

    pub fn with_mean_interarrival(mut self, minutes: f64) -> Self {
        self.mean_interarrival = minutes;
        self
    }

    pub fn with_service_means(mut self, prep: f64, operation: f64, recovery: f64) -> Self {
        self.mean_prep_time = prep;
        self.mean_operation_time = operation;
        self.mean_recovery_time = recovery;
        self
    }

    pub fn with_sim_duration(mut self, minutes: SimulationTime) -> Self {
        self.sim_duration = minutes;
        self
    }

    pub fn with_warmup_period(mut self, minutes: SimulationTime) -> Self {
        self.warmup_period = minutes;
        self
    }

    pub fn with_monitoring_interval(mut self, minutes: SimulationTime) -> Self {
        self.monitoring_interval = minutes;
        self
    }

    pub fn with_patient_mix(mut self, mix: Vec<PatientTypeConfig>) -> Self {
        self.patient_mix = mix;
        self
    }

    /// Short label such as `P3_T1_R3`
    pub fn scenario_name(&self) -> String {
        format!(
            "P{}_T{}_R{}",
            self.num_prep_rooms, self.num_operating_theatres, self.num_recovery_rooms
        )
    }

    /// Length of the post-warmup observation window
    pub fn observation_window(&self) -> SimulationTime {
        self.sim_duration - self.warmup_period
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        for (name, capacity) in [
            ("num_prep_rooms", self.num_prep_rooms),
            ("num_operating_theatres", self.num_operating_theatres),
            ("num_recovery_rooms", self.num_recovery_rooms),
        ] {
            if capacity == 0 {
                return Err(invalid(format!("{} must be at least 1", name)));
            }
        }

        for (name, value) in [
            ("mean_interarrival", self.mean_interarrival),
            ("mean_prep_time", self.mean_prep_time),
            ("mean_operation_time", self.mean_operation_time),
            ("mean_recovery_time", self.mean_recovery_time),
            ("sim_duration", self.sim_duration),
            ("monitoring_interval", self.monitoring_interval),
        ] {
            require_positive(name, value)?;
        }

        if !self.warmup_period.is_finite() || self.warmup_period < 0.0 {
            return Err(invalid(format!(
                "warmup_period must be a non-negative number, got {}",
                self.warmup_period
            )));
        }
        if self.warmup_period >= self.sim_duration {
            return Err(invalid(format!(
                "warmup_period ({}) must be shorter than sim_duration ({})",
                self.warmup_period, self.sim_duration
            )));
        }

        if !self.patient_mix.is_empty() {
            let mut total_weight = 0.0;
            for entry in &self.patient_mix {
                if !entry.weight.is_finite() || entry.weight < 0.0 {
                    return Err(invalid(format!(
                        "weight for {} patients must be a non-negative number, got {}",
                        entry.kind, entry.weight
                    )));
                }
                total_weight += entry.weight;
                for (name, value) in [
                    ("mean_prep_time", entry.mean_prep_time),
                    ("mean_operation_time", entry.mean_operation_time),
                    ("mean_recovery_time", entry.mean_recovery_time),
                ] {
                    if let Some(value) = value {
                        require_positive(&format!("{} override for {} patients", name, entry.kind), value)?;
                    }
                }
            }
            if total_weight <= 0.0 {
                return Err(invalid("patient_mix needs at least one positive weight".to_string()));
            }
        }

        Ok(())
    }

    /// Parse and validate a TOML configuration; absent keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, SimulationError> {
        let config: HospitalConfig = toml::from_str(text)
            .map_err(|e| invalid(format!("cannot parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SimulationError::Execution(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }
}

fn invalid(message: String) -> SimulationError {
    SimulationError::InvalidConfiguration(message)
}

fn require_positive(name: &str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be a positive number, got {}", name, value)))
    }
}
