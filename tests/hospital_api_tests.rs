use rand::rngs::StdRng;
use rand::SeedableRng;
use surgisim::core::processes::PatientProcess;
use surgisim::{
    ConcurrencyMode, HospitalConfig, HospitalSimulation, HospitalState, Patient, PatientKind,
    PoolKind, ReplicationConfig, ReplicationMetrics, ReplicationOutput, ReplicationRunner,
    ServiceTimes, SimulationEngine, SimulationError,
};

const EPS: f64 = 1e-9;

fn run(config: HospitalConfig, seed: u64) -> ReplicationOutput {
    HospitalSimulation::new(config, StdRng::seed_from_u64(seed))
        .unwrap()
        .run()
        .unwrap()
}

/// Engine with no arrival stream; patients are placed by hand
fn empty_unit(config: HospitalConfig) -> SimulationEngine<HospitalState<StdRng>> {
    SimulationEngine::new(HospitalState::new(config, StdRng::seed_from_u64(0)).unwrap())
}

fn place(engine: &mut SimulationEngine<HospitalState<StdRng>>, id: u64, arrival: f64, service: ServiceTimes) {
    let patient = Patient::new(id, PatientKind::Regular, arrival, service);
    engine.spawn_at(Box::new(PatientProcess::new(patient)), arrival).unwrap();
}

fn assert_output_invariants(output: &ReplicationOutput, config: &HospitalConfig) {
    // Conservation
    assert_eq!(output.counters.arrived, output.counters.departed + output.in_system);
    assert!(output.completed.len() as u64 <= output.counters.departed);
    assert_eq!(output.final_time, config.sim_duration);

    for record in &output.completed {
        assert!(record.is_chronological(), "out of order timestamps: {:?}", record);
        assert!(record.departure > config.warmup_period);
        assert!(record.departure < config.sim_duration);

        // Block-before-release bookkeeping
        assert_eq!(record.blocked(), record.blocking.is_some());
        if let Some(interval) = record.blocking {
            assert!((interval.start - record.operation_end).abs() < EPS);
            assert!((interval.end - record.recovery_start).abs() < EPS);
            assert!(interval.end >= interval.start);
        } else {
            assert!((record.recovery_start - record.operation_end).abs() < EPS);
        }
        let expected = record.service.operation + record.blocking_duration();
        assert!((record.theatre_hold_time() - expected).abs() < 1e-6);
    }

    for snapshot in &output.snapshots {
        assert!(snapshot.time > config.warmup_period);
        assert!(snapshot.occupancy <= snapshot.capacity);
        assert!((0.0..=1.0).contains(&snapshot.utilization));
        assert_eq!(snapshot.all_busy, snapshot.occupancy == snapshot.capacity);
        // Nobody queues while a slot is free
        if snapshot.queue_length > 0 {
            assert_eq!(snapshot.occupancy, snapshot.capacity);
        }
    }
}

#[test]
fn test_baseline_replications_hold_invariants() {
    let config = HospitalConfig::baseline();
    for seed in 0..5 {
        let output = run(config.clone(), seed);
        assert!(!output.is_degenerate());
        assert_output_invariants(&output, &config);
    }
}

#[test]
fn test_scarce_recovery_holds_invariants_and_blocks() {
    let config = HospitalConfig::high_load().with_recovery_rooms(1);
    let mut blocked = 0;
    for seed in 0..5 {
        let output = run(config.clone(), seed);
        assert_output_invariants(&output, &config);
        blocked += output.completed.iter().filter(|r| r.blocked()).count();
    }
    assert!(blocked > 0);
}

#[test]
fn test_snapshots_cover_every_pool_per_tick() {
    let config = HospitalConfig::baseline();
    let output = run(config.clone(), 7);
    // Ticks at 60, 120, ..., 1380; 480 itself is still warmup
    let ticks = (1..)
        .map(|k| k as f64 * config.monitoring_interval)
        .take_while(|t| *t < config.sim_duration)
        .filter(|t| *t > config.warmup_period)
        .count();
    for kind in PoolKind::ALL {
        assert_eq!(output.snapshots_for(kind).count(), ticks);
    }
}

#[test]
fn test_same_seed_same_output() {
    let config = HospitalConfig::baseline().with_emergency_mix();
    assert_eq!(run(config.clone(), 1234), run(config.clone(), 1234));
    assert_ne!(run(config.clone(), 1234), run(config, 1235));
}

#[test]
fn test_saturated_recovery_blocks_the_theatre() {
    // Second patient finishes surgery at 4 while the only bed is taken until 13
    let config = HospitalConfig::default()
        .with_capacities(2, 2, 1)
        .with_sim_duration(100.0)
        .with_warmup_period(0.0);
    let mut engine = empty_unit(config);
    place(&mut engine, 1, 0.0, ServiceTimes::new(1.0, 2.0, 10.0));
    place(&mut engine, 2, 0.0, ServiceTimes::new(1.0, 3.0, 5.0));

    engine.run_until(100.0).unwrap();

    let completed = engine.state().completed();
    assert_eq!(completed.len(), 2);
    let first = completed.iter().find(|r| r.id == 1).unwrap();
    let second = completed.iter().find(|r| r.id == 2).unwrap();
    assert!(!first.blocked());
    assert_eq!(first.departure, 13.0);

    assert!(second.blocked());
    assert_eq!(second.operation_end, 4.0);
    assert_eq!(second.recovery_start, 13.0);
    assert_eq!(second.blocking_duration(), 9.0);
    assert_eq!(second.theatre_hold_time(), 12.0);
    assert_eq!(second.departure, 18.0);
}

#[test]
fn test_uncontended_unit_never_blocks() {
    let config = HospitalConfig::default()
        .with_capacities(2, 2, 2)
        .with_mean_interarrival(1000.0)
        .with_service_means(1.0, 1.0, 1.0)
        .with_sim_duration(200_000.0)
        .with_warmup_period(1000.0);
    let output = run(config.clone(), 3);
    assert_output_invariants(&output, &config);

    let metrics = ReplicationMetrics::from_output(&output, &config).unwrap();
    assert!(metrics.patients_completed > 100);
    assert!(metrics.blocking_probability < 0.01);
    assert!(metrics.mean_wait_theatre < 0.1);
    assert!(metrics.all_recovery_busy_probability < 0.01);
}

#[test]
fn test_departure_at_warmup_boundary_is_excluded() {
    let base = HospitalConfig::default().with_sim_duration(100.0);
    let service = ServiceTimes::new(10.0, 10.0, 10.0);

    let mut excluded = empty_unit(base.clone().with_warmup_period(30.0));
    place(&mut excluded, 1, 0.0, service);
    excluded.run_until(100.0).unwrap();
    assert!(excluded.state().completed().is_empty());
    assert_eq!(excluded.state().counters().departed, 1);

    let mut included = empty_unit(base.with_warmup_period(29.999));
    place(&mut included, 1, 0.0, service);
    included.run_until(100.0).unwrap();
    assert_eq!(included.state().completed().len(), 1);
    assert_eq!(included.state().completed()[0].departure, 30.0);
}

#[test]
fn test_patients_in_flight_at_horizon_are_abandoned() {
    let config = HospitalConfig::default()
        .with_mean_interarrival(1.0)
        .with_service_means(1.0e6, 1.0e6, 1.0e6)
        .with_sim_duration(50.0)
        .with_warmup_period(0.0);
    let mut simulation = HospitalSimulation::new(config, StdRng::seed_from_u64(11)).unwrap();
    simulation.engine_mut().run_until(50.0).unwrap();
    // Arrival, monitor and every admitted patient are still alive
    let arrived = simulation.state().counters().arrived;
    assert!(arrived > 0);
    assert_eq!(simulation.live_processes() as u64, arrived + 2);

    let output = simulation.run().unwrap();
    assert!(output.is_degenerate());
    assert_eq!(output.counters.departed, 0);
    assert_eq!(output.in_system, output.counters.arrived);
    assert!(ReplicationMetrics::from_output(&output, &HospitalConfig::default()).is_none());
}

#[test]
fn test_event_at_horizon_is_not_processed() {
    let config = HospitalConfig::default().with_sim_duration(30.0).with_warmup_period(0.0);
    let mut engine = empty_unit(config);
    place(&mut engine, 1, 0.0, ServiceTimes::new(10.0, 10.0, 10.0));

    assert_eq!(engine.run_until(30.0).unwrap(), 30.0);
    assert!(engine.state().completed().is_empty());
    assert_eq!(engine.state().pool(PoolKind::Recovery).occupancy(), 1);
}

#[test]
fn test_emergency_mix_produces_both_kinds() {
    let config = HospitalConfig::baseline()
        .with_emergency_mix()
        .with_sim_duration(20_000.0);
    let output = run(config.clone(), 5);
    assert_output_invariants(&output, &config);
    let emergencies = output.completed.iter().filter(|r| r.kind == PatientKind::Emergency).count();
    assert!(emergencies > 0);
    assert!(emergencies < output.completed.len());
}

#[test]
fn test_invalid_configuration_fails_before_running() {
    let zero_recovery = HospitalConfig::default().with_recovery_rooms(0);
    let err = HospitalSimulation::new(zero_recovery.clone(), StdRng::seed_from_u64(0)).err().unwrap();
    assert!(err.is_configuration());

    let runner = ReplicationRunner::new(zero_recovery, ReplicationConfig::new());
    assert!(matches!(runner, Err(SimulationError::InvalidConfiguration(_))));

    let long_warmup = HospitalConfig::default().with_warmup_period(2000.0);
    assert!(HospitalSimulation::new(long_warmup, StdRng::seed_from_u64(0)).is_err());
}

#[test]
fn test_parallel_study_matches_sequential() {
    let config = HospitalConfig::high_load().with_recovery_rooms(2);
    let replication = ReplicationConfig::new().with_replications(6).with_base_seed(100);

    let sequential = ReplicationRunner::new(config.clone(), replication.clone())
        .unwrap()
        .run()
        .unwrap();
    let parallel = ReplicationRunner::new(
        config,
        replication.with_concurrency(ConcurrencyMode::Rayon).with_thread_pool_size(3),
    )
    .unwrap()
    .run()
    .unwrap();

    assert_ne!(sequential.study_id, parallel.study_id);
    assert_eq!(sequential.reports, parallel.reports);
    let seeds: Vec<u64> = sequential.reports.iter().map(|r| r.seed).collect();
    assert_eq!(seeds, vec![100, 101, 102, 103, 104, 105]);
    assert_eq!(sequential.metrics().len(), 6);
    assert_eq!(sequential.scenario_name, "P3_T1_R2");
}

#[test]
fn test_config_file_drives_a_study() {
    let path = std::env::temp_dir().join(format!("surgisim-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        "num_recovery_rooms = 5\nmean_interarrival = 20.0\nsim_duration = 2000.0\n",
    )
    .unwrap();

    let config = HospitalConfig::from_toml_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.num_recovery_rooms, 5);
    assert_eq!(config.warmup_period, 480.0);

    let study = ReplicationRunner::new(config, ReplicationConfig::new().with_replications(2))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(study.reports.len(), 2);

    let missing = HospitalConfig::from_toml_file("/nonexistent/surgisim.toml").unwrap_err();
    assert!(matches!(missing, SimulationError::Execution(_)));
}

#[test]
fn test_late_arrival_never_departs() {
    let config = HospitalConfig::default().with_sim_duration(100.0).with_warmup_period(0.0);
    let mut engine = empty_unit(config);
    place(&mut engine, 1, 99.5, ServiceTimes::new(10.0, 10.0, 10.0));

    engine.run_until(100.0).unwrap();

    assert!(engine.state().completed().is_empty());
    assert_eq!(engine.state().counters().departed, 0);
    assert_eq!(engine.state().pool(PoolKind::Preparation).occupancy(), 1);
    assert_eq!(engine.live_processes(), 1);
}
