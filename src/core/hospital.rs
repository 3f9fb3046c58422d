use super::config::HospitalConfig;
use super::errors::SimulationError;
use super::patient::{Patient, PatientGenerator, PatientRecord};
use super::processes::{ArrivalProcess, MonitorProcess};
use super::resource_pool::{PoolSnapshot, ResourcePool};
use super::simulation_engine::{SimulationEngine, SimulationObserver};
use super::types::{PatientId, PoolKind, SimulationTime};
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Arrival and departure totals of one replication
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub arrived: u64,
    pub departed: u64,
}

impl RunCounters {
    /// Patients still in flight
    pub fn in_system(&self) -> u64 {
        self.arrived - self.departed
    }
}

/// Everything one replication hands to the analysis side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationOutput {
    pub completed: Vec<PatientRecord>,
    pub snapshots: Vec<PoolSnapshot>,
    pub counters: RunCounters,
    pub in_system: u64,
    pub final_time: SimulationTime,
}

impl ReplicationOutput {
    /// Snapshots of one pool, in sampling order
    pub fn snapshots_for(&self, pool: PoolKind) -> impl Iterator<Item = &PoolSnapshot> + '_ {
        self.snapshots.iter().filter(move |snapshot| snapshot.pool == pool)
    }

    pub fn is_degenerate(&self) -> bool {
        self.completed.is_empty()
    }
}

/// Mutable state shared by all processes of one replication
pub struct HospitalState<R> {
    config: HospitalConfig,
    preparation: ResourcePool,
    theatre: ResourcePool,
    recovery: ResourcePool,
    generator: PatientGenerator,
    rng: R,
    counters: RunCounters,
    next_patient_id: PatientId,
    completed: Vec<PatientRecord>,
    snapshots: Vec<PoolSnapshot>,
}

impl<R: Rng> HospitalState<R> {
    /// Validate the configuration and build empty pools around an injected RNG
    pub fn new(config: HospitalConfig, rng: R) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            preparation: ResourcePool::new(PoolKind::Preparation, config.num_prep_rooms)?,
            theatre: ResourcePool::new(PoolKind::Theatre, config.num_operating_theatres)?,
            recovery: ResourcePool::new(PoolKind::Recovery, config.num_recovery_rooms)?,
            generator: PatientGenerator::from_config(&config)?,
            config,
            rng,
            counters: RunCounters::default(),
            next_patient_id: 1,
            completed: Vec::new(),
            snapshots: Vec::new(),
        })
    }

    /// Draw the gap until the next arrival
    pub fn next_interarrival(&mut self) -> SimulationTime {
        self.generator.next_interarrival(&mut self.rng)
    }

    /// Create the next patient and count the arrival
    pub fn admit_patient(&mut self, now: SimulationTime) -> Patient {
        let id = self.next_patient_id;
        self.next_patient_id += 1;
        self.counters.arrived += 1;
        self.generator.create_patient(id, now, &mut self.rng)
    }
}

impl<R> HospitalState<R> {
    pub fn config(&self) -> &HospitalConfig {
        &self.config
    }

    pub fn pool(&self, kind: PoolKind) -> &ResourcePool {
        match kind {
            PoolKind::Preparation => &self.preparation,
            PoolKind::Theatre => &self.theatre,
            PoolKind::Recovery => &self.recovery,
        }
    }

    pub fn pool_mut(&mut self, kind: PoolKind) -> &mut ResourcePool {
        match kind {
            PoolKind::Preparation => &mut self.preparation,
            PoolKind::Theatre => &mut self.theatre,
            PoolKind::Recovery => &mut self.recovery,
        }
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    pub fn completed(&self) -> &[PatientRecord] {
        &self.completed
    }

    pub fn snapshots(&self) -> &[PoolSnapshot] {
        &self.snapshots
    }

    /// Count a departure; only departures after warmup enter the records
    pub fn record_departure(&mut self, patient: Patient, now: SimulationTime) -> Result<(), SimulationError> {
        self.counters.departed += 1;
        let record = patient.into_record()?;
        if now > self.config.warmup_period {
            self.completed.push(record);
        }
        Ok(())
    }

    /// Sample every pool, skipping samples taken during warmup
    pub fn record_snapshots(&mut self, now: SimulationTime) {
        if now <= self.config.warmup_period {
            return;
        }
        for kind in PoolKind::ALL {
            let snapshot = self.pool(kind).snapshot(now);
            self.snapshots.push(snapshot);
        }
    }

    fn into_output(self, final_time: SimulationTime) -> ReplicationOutput {
        ReplicationOutput {
            completed: self.completed,
            snapshots: self.snapshots,
            counters: self.counters,
            in_system: self.counters.in_system(),
            final_time,
        }
    }
}

/// One replication: the pools, the arrival and monitor processes, and the
/// output buffers, driven by its own engine
pub struct HospitalSimulation<R: Rng + 'static> {
    engine: SimulationEngine<HospitalState<R>>,
    horizon: SimulationTime,
}

impl<R: Rng + 'static> HospitalSimulation<R> {
    /// Build a replication; configuration errors surface here, before the clock starts
    pub fn new(config: HospitalConfig, rng: R) -> Result<Self, SimulationError> {
        let horizon = config.sim_duration;
        let state = HospitalState::new(config, rng)?;
        let mut engine = SimulationEngine::new(state);
        engine.spawn(Box::new(ArrivalProcess::new()))?;
        engine.spawn(Box::new(MonitorProcess::new()))?;
        Ok(Self { engine, horizon })
    }

    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.engine.add_observer(observer);
    }

    pub fn state(&self) -> &HospitalState<R> {
        self.engine.state()
    }

    /// Run to the horizon and hand over the output streams.
    ///
    /// Patients still in flight at the horizon are abandoned.
    pub fn run(mut self) -> Result<ReplicationOutput, SimulationError> {
        let final_time = self.engine.run_until(self.horizon)?;
        let output = self.engine.into_state().into_output(final_time);

        info!(
            "[Hospital] Replication finished at {:.1}: arrived={}, departed={}, in_system={}, completed_after_warmup={}",
            final_time,
            output.counters.arrived,
            output.counters.departed,
            output.in_system,
            output.completed.len()
        );
        if output.is_degenerate() {
            warn!("[Hospital] No patient departed after the warmup period");
        }
        Ok(output)
    }

    /// Engine handle for driving the replication step by step
    pub fn engine_mut(&mut self) -> &mut SimulationEngine<HospitalState<R>> {
        &mut self.engine
    }

    pub fn live_processes(&self) -> usize {
        self.engine.live_processes()
    }
}
