//! Error types for building the block IR

use thiserror::Error;

/// Errors that can occur while lowering a program to blocks
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Gate outside the Clifford+T vocabulary
    #[error("Unsupported gate '{0}': only Clifford+T gates are supported")]
    UnsupportedGate(String),

    /// Rotation angle with no exact Clifford+T form
    #[error("Unsupported {gate} angle {angle}")]
    UnsupportedAngle { gate: String, angle: f64 },

    /// Wrong number of qubit operands
    #[error("Gate '{gate}' requires {expected} qubits, but {actual} were provided")]
    ArityMismatch {
        gate: String,
        expected: String,
        actual: usize,
    },

    /// Wrong number of angle parameters
    #[error("Gate '{gate}' takes {expected} parameters, but {actual} were provided")]
    ParameterCount {
        gate: String,
        expected: usize,
        actual: usize,
    },

    /// Same qubit used twice by one gate
    #[error("Duplicate qubit {qubit} in gate '{gate}'")]
    DuplicateQubit { gate: String, qubit: usize },

    /// Register name declared twice
    #[error("Register '{0}' is already declared")]
    DuplicateRegister(String),

    /// Reference to an undeclared register
    #[error("Unknown register '{0}'")]
    UnknownRegister(String),

    /// Register index past the end of its register
    #[error("Index {index} out of range for register '{register}' of size {size}")]
    IndexOutOfRange {
        register: String,
        index: usize,
        size: usize,
    },

    /// Index expression that is not a non-negative integer
    #[error("Index expression evaluated to {0}, expected a non-negative integer")]
    InvalidIndex(f64),

    /// Identifier not bound by an enclosing for-loop
    #[error("Unbound identifier '{0}'")]
    UnboundVariable(String),

    /// Loop trigger qubit touched after its measurement
    #[error("Operation '{op}' on qubit(s) {qubits:?} after the loop trigger measurement; the trigger measurement must be the last operation on its qubit")]
    TriggerOrder { op: String, qubits: Vec<usize> },

    /// While body never writes its condition bits
    #[error("Loop body never measures into its condition bits {0:?}")]
    LoopWithoutTrigger(Vec<usize>),

    /// Condition or switch selector that cannot be evaluated
    #[error("Malformed selector: {0}")]
    MalformedSelector(String),

    /// Switch with the same case value twice
    #[error("Duplicate case value {0}")]
    DuplicateCase(u64),

    /// Break outside a while loop
    #[error("'break' is only allowed inside a while loop")]
    BreakOutsideLoop,
}

impl BuildError {
    /// Create an arity mismatch error
    pub fn arity(gate: impl Into<String>, expected: impl Into<String>, actual: usize) -> Self {
        Self::ArityMismatch {
            gate: gate.into(),
            expected: expected.into(),
            actual,
        }
    }

    /// Create an unsupported angle error
    pub fn angle(gate: impl Into<String>, angle: f64) -> Self {
        Self::UnsupportedAngle {
            gate: gate.into(),
            angle,
        }
    }
}

/// Result type for IR construction
pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_error() {
        let msg = BuildError::arity("cx", "2", 1).to_string();
        assert!(msg.contains("cx"));
        assert!(msg.contains('2'));
        assert!(msg.contains('1'));
    }

    #[test]
    fn test_unsupported_gate_error() {
        let msg = BuildError::UnsupportedGate("rxx".into()).to_string();
        assert!(msg.contains("rxx"));
        assert!(msg.contains("Clifford+T"));
    }
}
