use std::env;
use std::process;

use surgisim::{ConcurrencyMode, HospitalConfig, ReplicationConfig, ReplicationMetrics, ReplicationRunner};

const USAGE: &str = "usage: surgical_unit [baseline|high_load|low_load|emergency|recovery_N] \
[--replications N] [--seed S] [--parallel] [--config FILE]";

/// Command line options of one study
#[derive(Debug, Clone)]
struct CliOptions {
    scenario: String,
    replications: usize,
    seed: u64,
    parallel: bool,
    config_path: Option<String>,
}

impl Default for CliOptions {
    fn default() -> Self {
        let defaults = ReplicationConfig::new();
        Self {
            scenario: "baseline".to_string(),
            replications: defaults.num_replications,
            seed: defaults.base_seed,
            parallel: false,
            config_path: None,
        }
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--replications" | "-n" => {
                let value = args.next().ok_or("--replications needs a value")?;
                options.replications = value
                    .parse()
                    .map_err(|_| format!("invalid replication count '{}'", value))?;
            }
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                options.seed = value.parse().map_err(|_| format!("invalid seed '{}'", value))?;
            }
            "--parallel" => options.parallel = true,
            "--config" => {
                options.config_path = Some(args.next().ok_or("--config needs a file")?);
            }
            "--help" | "-h" => return Err(USAGE.to_string()),
            flag if flag.starts_with('-') => return Err(format!("unknown option '{}'\n{}", flag, USAGE)),
            scenario => options.scenario = scenario.to_string(),
        }
    }
    Ok(options)
}

fn scenario_config(name: &str) -> Result<HospitalConfig, String> {
    match name {
        "baseline" => Ok(HospitalConfig::baseline()),
        "high_load" => Ok(HospitalConfig::high_load()),
        "low_load" => Ok(HospitalConfig::low_load()),
        "emergency" => Ok(HospitalConfig::baseline().with_emergency_mix()),
        other => match other.strip_prefix("recovery_") {
            Some(rooms) => rooms
                .parse()
                .map(|rooms| HospitalConfig::baseline().with_recovery_rooms(rooms))
                .map_err(|_| format!("invalid recovery room count in '{}'", other)),
            None => Err(format!("unknown scenario '{}'\n{}", other, USAGE)),
        },
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn print_averages(metrics: &[(usize, ReplicationMetrics)]) {
    let avg = |f: fn(&ReplicationMetrics) -> f64| mean(metrics.iter().map(|(_, m)| f(m)));

    println!("\n📊 AVERAGES OVER {} REPLICATIONS:", metrics.len());
    println!("======================");
    println!("  Mean throughput time:        {:>8.2} min", avg(|m| m.mean_throughput_time));
    println!("  Blocking probability:        {:>8.4}", avg(|m| m.blocking_probability));
    println!("  All recovery busy (sampled): {:>8.4}", avg(|m| m.all_recovery_busy_probability));
    println!("  Theatre blocked fraction:    {:>8.4}", avg(|m| m.theatre_blocked_fraction));
    println!("  Mean wait for preparation:   {:>8.2} min", avg(|m| m.mean_wait_preparation));
    println!("  Mean wait for theatre:       {:>8.2} min", avg(|m| m.mean_wait_theatre));
    println!("  Mean wait for recovery:      {:>8.2} min", avg(|m| m.mean_wait_recovery));
    println!(
        "  Theatre utilization:         {:>8.4}",
        avg(|m| m.theatre.map_or(0.0, |pool| pool.mean_utilization))
    );
    println!(
        "  Recovery utilization:        {:>8.4}",
        avg(|m| m.recovery.map_or(0.0, |pool| pool.mean_utilization))
    );
    println!(
        "  Preparation queue length:    {:>8.2}",
        avg(|m| m.preparation.map_or(0.0, |pool| pool.mean_queue_length))
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(2);
        }
    };

    let config = match &options.config_path {
        Some(path) => HospitalConfig::from_toml_file(path)?,
        None => scenario_config(&options.scenario)?,
    };
    let mode = if options.parallel {
        ConcurrencyMode::Rayon
    } else {
        ConcurrencyMode::Sequential
    };
    let replication = ReplicationConfig::new()
        .with_replications(options.replications)
        .with_base_seed(options.seed)
        .with_concurrency(mode);

    println!("🏥 Starting Surgical Unit Simulation");
    println!("Configuration:");
    println!(
        "  Scenario: {} (prep={}, theatres={}, recovery={})",
        config.scenario_name(),
        config.num_prep_rooms,
        config.num_operating_theatres,
        config.num_recovery_rooms
    );
    println!(
        "  Means: interarrival={:.1}, prep={:.1}, operation={:.1}, recovery={:.1}",
        config.mean_interarrival, config.mean_prep_time, config.mean_operation_time, config.mean_recovery_time
    );
    println!(
        "  Horizon: {:.0} min, warmup {:.0} min, monitor every {:.0} min",
        config.sim_duration, config.warmup_period, config.monitoring_interval
    );
    println!(
        "  Replications: {} from seed {} ({:?})",
        replication.num_replications, replication.base_seed, replication.concurrency_mode
    );
    println!();

    let study = ReplicationRunner::new(config, replication)?.run()?;

    println!("Study {}", study.study_id);
    println!(
        "{:>4} {:>8} {:>9} {:>10} {:>10} {:>10} {:>10}",
        "rep", "arrived", "completed", "mean_tput", "p_block", "rec_busy", "mean_block"
    );
    let metrics = study.metrics();
    for report in &study.reports {
        match metrics.iter().find(|(id, _)| *id == report.replication_id) {
            Some((_, m)) => println!(
                "{:>4} {:>8} {:>9} {:>10.2} {:>10.4} {:>10.4} {:>10.2}",
                report.replication_id,
                m.patients_arrived,
                m.patients_completed,
                m.mean_throughput_time,
                m.blocking_probability,
                m.all_recovery_busy_probability,
                m.mean_blocking_duration.unwrap_or(0.0)
            ),
            None => println!(
                "{:>4} {:>8} {:>9}   no patient completed after warmup",
                report.replication_id, report.output.counters.arrived, 0
            ),
        }
    }

    if metrics.is_empty() {
        println!("\n⚠️  Every replication was degenerate, nothing to average");
    } else {
        print_averages(&metrics);
    }
    Ok(())
}
