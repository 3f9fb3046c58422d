pub mod arrival_process;
pub mod monitor_process;
pub mod patient_process;

// Re-export commonly used types
pub use arrival_process::ArrivalProcess;
pub use monitor_process::MonitorProcess;
pub use patient_process::{PatientPhase, PatientProcess};
