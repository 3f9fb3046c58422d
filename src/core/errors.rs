/// Errors that abort a replication
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Rejected configuration, reported before the clock starts
    InvalidConfiguration(String),
    /// Broken core invariant; carries the offending entity and its state
    Protocol {
        entity: String,
        state: String,
        reason: String,
    },
    /// Failure of the replication driver (thread pool, config file)
    Execution(String),
}

impl SimulationError {
    pub fn protocol(entity: impl Into<String>, state: impl Into<String>, reason: impl Into<String>) -> Self {
        SimulationError::Protocol {
            entity: entity.into(),
            state: state.into(),
            reason: reason.into(),
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, SimulationError::Protocol { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, SimulationError::InvalidConfiguration(_))
    }
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            SimulationError::Protocol { entity, state, reason } => {
                write!(f, "Protocol violation by {} in state {}: {}", entity, state, reason)
            }
            SimulationError::Execution(msg) => write!(f, "Execution failed: {}", msg),
        }
    }
}

impl std::error::Error for SimulationError {}
