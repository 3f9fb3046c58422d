use super::config::{ConcurrencyMode, ReplicationConfig};
use crate::core::config::HospitalConfig;
use crate::core::errors::SimulationError;
use crate::core::hospital::{HospitalSimulation, ReplicationOutput};
use crate::core::metrics::ReplicationMetrics;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output of one seeded replication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationReport {
    pub replication_id: usize,
    pub seed: u64,
    pub output: ReplicationOutput,
}

/// All replications of one scenario, ordered by replication id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyReport {
    pub study_id: Uuid,
    pub scenario_name: String,
    pub config: HospitalConfig,
    pub reports: Vec<ReplicationReport>,
}

impl StudyReport {
    /// Metrics of every non-degenerate replication
    pub fn metrics(&self) -> Vec<(usize, ReplicationMetrics)> {
        self.reports
            .iter()
            .filter_map(|report| {
                ReplicationMetrics::from_output(&report.output, &self.config)
                    .map(|metrics| (report.replication_id, metrics))
            })
            .collect()
    }
}

/// Run a single replication with its own freshly seeded generator
pub fn run_replication(
    config: &HospitalConfig,
    replication_id: usize,
    seed: u64,
) -> Result<ReplicationReport, SimulationError> {
    let rng = StdRng::seed_from_u64(seed);
    let output = HospitalSimulation::new(config.clone(), rng)?.run()?;
    Ok(ReplicationReport {
        replication_id,
        seed,
        output,
    })
}

/// Runs independent replications of one scenario
pub struct ReplicationRunner {
    config: HospitalConfig,
    replication: ReplicationConfig,
}

impl ReplicationRunner {
    /// Validates the scenario up front so no replication starts on a bad config
    pub fn new(config: HospitalConfig, replication: ReplicationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self { config, replication })
    }

    pub fn config(&self) -> &HospitalConfig {
        &self.config
    }

    pub fn replication_config(&self) -> &ReplicationConfig {
        &self.replication
    }

    pub fn run(&self) -> Result<StudyReport, SimulationError> {
        let study_id = Uuid::new_v4();
        info!(
            "[Study {}] Running {} replications of {} ({:?})",
            study_id,
            self.replication.num_replications,
            self.config.scenario_name(),
            self.replication.concurrency_mode
        );

        let reports = match self.replication.concurrency_mode {
            ConcurrencyMode::Sequential => self.run_sequential()?,
            ConcurrencyMode::Rayon => match self.replication.thread_pool_size {
                Some(threads) => {
                    let pool = rayon::ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .build()
                        .map_err(|e| SimulationError::Execution(format!("cannot build thread pool: {}", e)))?;
                    pool.install(|| self.run_parallel())?
                }
                None => self.run_parallel()?,
            },
        };

        info!("[Study {}] Completed {} replications", study_id, reports.len());
        Ok(StudyReport {
            study_id,
            scenario_name: self.config.scenario_name(),
            config: self.config.clone(),
            reports,
        })
    }

    fn run_sequential(&self) -> Result<Vec<ReplicationReport>, SimulationError> {
        (0..self.replication.num_replications)
            .map(|id| run_replication(&self.config, id, self.replication.seed_for(id)))
            .collect()
    }

    fn run_parallel(&self) -> Result<Vec<ReplicationReport>, SimulationError> {
        (0..self.replication.num_replications)
            .into_par_iter()
            .map(|id| run_replication(&self.config, id, self.replication.seed_for(id)))
            .collect()
    }
}
