pub mod config;
pub mod errors;
pub mod event;
pub mod event_scheduler;
pub mod execution;
pub mod hospital;
pub mod metrics;
pub mod patient;
pub mod process;
pub mod process_registry;
pub mod processes;
pub mod resource_pool;
pub mod simulation_engine;
pub mod types;
