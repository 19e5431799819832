//! Multi-gate circuits checked against hand-computed amplitudes

use approx::assert_relative_eq;
use qdyn_state::{CombState, Kernel, SeqState, StateError};
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

fn zero(n: usize) -> CombState {
    CombState::zero_state(n, 32).unwrap()
}

/// Drives any kernel through the same GHZ preparation
fn prepare_ghz<K: Kernel>(kernel: &mut K) {
    kernel.h(0).unwrap();
    for target in 1..kernel.num_qubits() {
        kernel.cnot(0, target).unwrap();
    }
}

#[test]
fn test_t_gate_has_order_eight() {
    let mut state = zero(1);
    state.h(0).unwrap();
    for _ in 0..8 {
        state.t(0).unwrap();
    }
    state.h(0).unwrap();
    assert_relative_eq!(state.get_amplitude(0).unwrap().re, 1.0, epsilon = 1e-12);
    assert_eq!(state.get_prob(&[0], &[true]).unwrap(), 0.0);
}

#[test]
fn test_hth_probabilities() {
    let mut state = zero(1);
    state.h(0).unwrap();
    state.t(0).unwrap();
    state.h(0).unwrap();

    let p0 = state.get_prob(&[0], &[false]).unwrap();
    let p1 = state.get_prob(&[0], &[true]).unwrap();
    assert_relative_eq!(p0, (2.0 + SQRT_2) / 4.0, epsilon = 1e-12);
    assert_relative_eq!(p1, (2.0 - SQRT_2) / 4.0, epsilon = 1e-12);
}

#[test]
fn test_ghz_state() {
    let mut state = zero(4);
    prepare_ghz(&mut state);

    let amplitudes = state.amplitudes().unwrap();
    for (basis, amp) in amplitudes.iter().enumerate() {
        let expected = if basis == 0 || basis == 0b1111 {
            FRAC_1_SQRT_2
        } else {
            0.0
        };
        assert_relative_eq!(amp.re, expected, epsilon = 1e-12);
        assert_relative_eq!(amp.im, 0.0, epsilon = 1e-12);
    }
    assert_eq!(state.get_prob(&[1, 3], &[true, false]).unwrap(), 0.0);
    assert_relative_eq!(state.total_probability().unwrap(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_mid_measure_leaves_state_unnormalized() {
    let mut state = zero(3);
    prepare_ghz(&mut state);
    state.mid_measure(&[2], &[true]).unwrap();

    assert_relative_eq!(state.total_probability().unwrap(), 0.5, epsilon = 1e-12);
    assert_relative_eq!(
        state.get_amplitude(0b111).unwrap().re,
        FRAC_1_SQRT_2,
        epsilon = 1e-12
    );
    assert_eq!(state.get_amplitude(0).unwrap().norm(), 0.0);
}

#[test]
fn test_cwalk_increments_and_decrements() {
    // q0 is the coin, q1 q2 the walker position (q1 most significant)
    let mut state = zero(3);
    state.cwalk(0, &[1, 2]).unwrap();
    assert_relative_eq!(state.get_amplitude(0b001).unwrap().re, 1.0, epsilon = 1e-12);

    state.x(0).unwrap();
    state.cwalk(0, &[1, 2]).unwrap();
    assert_relative_eq!(state.get_amplitude(0b100).unwrap().re, 1.0, epsilon = 1e-12);

    // wraps below zero
    state.cwalk(0, &[1, 2]).unwrap();
    assert_relative_eq!(state.get_amplitude(0b111).unwrap().re, 1.0, epsilon = 1e-12);
}

#[test]
fn test_reset_folds_excited_branch() {
    let mut state = zero(1);
    state.x(0).unwrap();
    state.reset(0).unwrap();
    assert_relative_eq!(state.get_amplitude(0).unwrap().norm(), 1.0, epsilon = 1e-12);
    assert_eq!(state.get_prob(&[0], &[true]).unwrap(), 0.0);
}

#[test]
fn test_rejected_gate_leaves_state_untouched() {
    let mut state = zero(2);
    state.h(0).unwrap();
    let before = state.amplitudes().unwrap();

    assert!(matches!(
        state.cnot(0, 2),
        Err(StateError::InvalidQubitIndex { .. })
    ));
    assert!(matches!(
        state.cnot(1, 1),
        Err(StateError::DuplicateQubit(1))
    ));
    assert_eq!(state.amplitudes().unwrap(), before);
}

#[test]
fn test_sequential_iterations() {
    // input q0, stored q1
    let mut seq = SeqState::new(2, 1, 16).unwrap();
    seq.init_stored_state_by_basis(0).unwrap();

    seq.init_input_state_by_basis(0).unwrap();
    seq.init_comb_state().unwrap();
    prepare_ghz(&mut seq);
    seq.measure(&[true]).unwrap();
    assert_relative_eq!(seq.step_prob().unwrap(), 0.5, epsilon = 1e-12);
    assert_relative_eq!(seq.stored_amplitude(1).unwrap().re, 1.0, epsilon = 1e-12);

    // a second iteration that leaves the stored qubit alone
    seq.init_input_state_by_basis(0).unwrap();
    seq.init_comb_state().unwrap();
    seq.measure(&[false]).unwrap();
    assert_eq!(seq.prob_list().len(), 2);
    assert_relative_eq!(seq.step_prob().unwrap(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(seq.stored_amplitude(1).unwrap().re, 1.0, epsilon = 1e-12);
}
