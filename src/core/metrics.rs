use super::config::HospitalConfig;
use super::hospital::ReplicationOutput;
use super::types::{PoolKind, SimulationTime};
use serde::{Deserialize, Serialize};

/// Sampled queue and utilization figures of one pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolMetrics {
    pub pool: PoolKind,
    pub samples: usize,
    pub mean_queue_length: f64,
    pub max_queue_length: usize,
    pub mean_utilization: f64,
}

impl PoolMetrics {
    fn from_output(output: &ReplicationOutput, pool: PoolKind) -> Option<Self> {
        let mut samples = 0usize;
        let mut queue_sum = 0.0;
        let mut max_queue_length = 0usize;
        let mut utilization_sum = 0.0;
        for snapshot in output.snapshots_for(pool) {
            samples += 1;
            queue_sum += snapshot.queue_length as f64;
            max_queue_length = max_queue_length.max(snapshot.queue_length);
            utilization_sum += snapshot.utilization;
        }
        if samples == 0 {
            return None;
        }
        Some(Self {
            pool,
            samples,
            mean_queue_length: queue_sum / samples as f64,
            max_queue_length,
            mean_utilization: utilization_sum / samples as f64,
        })
    }
}

/// Raw per-replication figures. Cross-replication statistics are left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationMetrics {
    pub patients_completed: usize,
    pub patients_arrived: u64,

    pub mean_throughput_time: SimulationTime,
    pub std_throughput_time: SimulationTime,
    pub median_throughput_time: SimulationTime,
    pub min_throughput_time: SimulationTime,
    pub max_throughput_time: SimulationTime,

    /// Share of completed operations that ended with recovery full
    pub blocking_probability: f64,
    pub blocked_patients: usize,
    pub mean_blocking_duration: Option<SimulationTime>,
    pub max_blocking_duration: Option<SimulationTime>,
    /// Blocked theatre time of completed patients over the observation window
    pub theatre_blocked_fraction: f64,

    /// Share of monitor samples in which every recovery room was occupied
    pub all_recovery_busy_probability: f64,

    pub mean_wait_preparation: SimulationTime,
    pub mean_wait_theatre: SimulationTime,
    pub mean_wait_recovery: SimulationTime,

    pub preparation: Option<PoolMetrics>,
    pub theatre: Option<PoolMetrics>,
    pub recovery: Option<PoolMetrics>,
}

impl ReplicationMetrics {
    /// `None` for a degenerate run without completed patients
    pub fn from_output(output: &ReplicationOutput, config: &HospitalConfig) -> Option<Self> {
        let patients = &output.completed;
        if patients.is_empty() {
            return None;
        }
        let n = patients.len() as f64;

        let mut throughput: Vec<f64> = patients.iter().map(|p| p.total_time()).collect();
        throughput.sort_by(|a, b| a.total_cmp(b));
        let mean_throughput_time = throughput.iter().sum::<f64>() / n;
        let variance = throughput
            .iter()
            .map(|t| (t - mean_throughput_time).powi(2))
            .sum::<f64>()
            / n;
        let median_throughput_time = if throughput.len() % 2 == 1 {
            throughput[throughput.len() / 2]
        } else {
            let upper = throughput.len() / 2;
            (throughput[upper - 1] + throughput[upper]) / 2.0
        };

        let blocking: Vec<f64> = patients
            .iter()
            .filter(|p| p.blocked())
            .map(|p| p.blocking_duration())
            .collect();
        let total_blocking: f64 = blocking.iter().sum();
        let window = config.observation_window();

        let recovery_samples: Vec<bool> = output
            .snapshots_for(PoolKind::Recovery)
            .map(|s| s.all_busy)
            .collect();
        let all_recovery_busy_probability = if recovery_samples.is_empty() {
            0.0
        } else {
            recovery_samples.iter().filter(|busy| **busy).count() as f64 / recovery_samples.len() as f64
        };

        Some(Self {
            patients_completed: patients.len(),
            patients_arrived: output.counters.arrived,
            mean_throughput_time,
            std_throughput_time: variance.sqrt(),
            median_throughput_time,
            min_throughput_time: throughput[0],
            max_throughput_time: throughput[throughput.len() - 1],
            blocking_probability: blocking.len() as f64 / n,
            blocked_patients: blocking.len(),
            mean_blocking_duration: if blocking.is_empty() {
                None
            } else {
                Some(total_blocking / blocking.len() as f64)
            },
            max_blocking_duration: blocking.iter().copied().reduce(f64::max),
            theatre_blocked_fraction: if window > 0.0 { total_blocking / window } else { 0.0 },
            all_recovery_busy_probability,
            mean_wait_preparation: patients.iter().map(|p| p.wait_for_preparation()).sum::<f64>() / n,
            mean_wait_theatre: patients.iter().map(|p| p.wait_for_theatre()).sum::<f64>() / n,
            mean_wait_recovery: patients.iter().map(|p| p.wait_for_recovery()).sum::<f64>() / n,
            preparation: PoolMetrics::from_output(output, PoolKind::Preparation),
            theatre: PoolMetrics::from_output(output, PoolKind::Theatre),
            recovery: PoolMetrics::from_output(output, PoolKind::Recovery),
        })
    }
}
