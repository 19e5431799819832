//! Error types for amplitude kernel operations

use thiserror::Error;

/// Errors that can occur while building or updating a kernel state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// Qubit index outside the register
    #[error("Invalid qubit index {index} for {num_qubits}-qubit state")]
    InvalidQubitIndex { index: usize, num_qubits: usize },

    /// Same qubit named twice in one operation
    #[error("Duplicate qubit {0} in gate operation")]
    DuplicateQubit(usize),

    /// Basis index does not fit in the register
    #[error("Basis state {basis} out of range for {num_qubits}-qubit state")]
    BasisOutOfRange { basis: u64, num_qubits: usize },

    /// Bit pattern length differs from the register width
    #[error("Basis pattern has {actual} bits, expected {expected}")]
    BasisWidthMismatch { expected: usize, actual: usize },

    /// Too few digits to represent a signed amplitude coefficient
    #[error("Precision of {digits} digits is too small, need at least 2")]
    InsufficientPrecision { digits: usize },

    /// Outcome list and target list differ in length
    #[error("Outcome length mismatch: expected {expected}, got {actual}")]
    OutcomeLengthMismatch { expected: usize, actual: usize },

    /// Stored register larger than the whole register
    #[error("Cannot store {stored} of {total} qubits")]
    InvalidPartition { total: usize, stored: usize },

    /// Register too large to enumerate every amplitude
    #[error("Cannot enumerate {num_qubits}-qubit state, limit is {limit} qubits")]
    TooManyQubits { num_qubits: usize, limit: usize },

    /// Sequential state used before its combined state was built
    #[error("Combined state has not been initialized")]
    CombinedStateMissing,
}

impl StateError {
    /// Create an invalid qubit error
    pub fn invalid_qubit(index: usize, num_qubits: usize) -> Self {
        Self::InvalidQubitIndex { index, num_qubits }
    }
}

/// Result type for kernel operations
pub type Result<T> = std::result::Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_qubit_message() {
        let msg = StateError::invalid_qubit(5, 3).to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_outcome_mismatch_message() {
        let err = StateError::OutcomeLengthMismatch {
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "Outcome length mismatch: expected 2, got 1");
    }
}
