//! Error types for the simulator

use qdyn_core::BuildError;
use qdyn_state::StateError;
use thiserror::Error;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimulatorError>;

/// Errors that can occur during simulation
///
/// Every variant aborts the current run; the kernel state afterwards is
/// not meaningful.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The program could not be lowered
    #[error("Invalid circuit: {0}")]
    Build(#[from] BuildError),

    /// The amplitude kernel rejected an operation
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Both outcomes of a mid-circuit measurement have probability zero
    #[error("Measurement of qubit {qubit} on a path of probability zero")]
    ZeroProbability { qubit: usize },

    /// Preset mode forced an outcome of probability zero
    #[error("Preset outcome {outcome} for clbit {clbit} is impossible on qubit {qubit}")]
    ImpossibleOutcome {
        qubit: usize,
        clbit: usize,
        outcome: bool,
    },

    /// Preset mode ran out of forced outcomes for a mid-circuit measurement
    #[error("No preset value available for clbit {clbit}")]
    PresetExhausted { clbit: usize },

    /// A while loop ran past the configured bound
    #[error("Loop exceeded the maximum of {limit} iterations")]
    LoopBoundExceeded { limit: usize },

    /// Kernel width disagrees with the program
    #[error("Kernel has {kernel} qubits but the program addresses {program}")]
    QubitCountMismatch { kernel: usize, program: usize },

    /// Amplitudes were requested after a run ending on an impossible path
    #[error("Cannot normalize a state reached with path probability {0}")]
    ZeroPathProbability(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_build_error() {
        let err: SimulatorError = BuildError::UnsupportedGate("u3".into()).into();
        assert!(matches!(err, SimulatorError::Build(_)));
        assert!(err.to_string().contains("u3"));
    }

    #[test]
    fn test_from_state_error() {
        let err: SimulatorError = StateError::CombinedStateMissing.into();
        assert!(err.to_string().starts_with("State error"));
    }
}
