//! Gate-name and angle lowering onto the Clifford+T vocabulary

use crate::error::{BuildError, Result};
use crate::gate::{Arity, GateKind, GateOp};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

/// Absolute tolerance when matching rotation angles
pub const ANGLE_TOLERANCE: f64 = 1e-9;

/// Lower one gate call with resolved qubits and evaluated parameters
///
/// `id` lowers to nothing. `rx`/`ry` accept ±π/2 after normalization to
/// (−π, π]; `rz`/`p` accept multiples of π/4. Anything else outside the
/// kernel vocabulary is rejected.
pub fn lower_gate(name: &str, params: &[f64], qubits: &[usize]) -> Result<Vec<GateOp>> {
    let lowered = name.to_ascii_lowercase();
    match lowered.as_str() {
        "id" => {
            check_params(&lowered, params, 0)?;
            check_qubits(&lowered, Arity::Exactly(1), qubits)?;
            Ok(Vec::new())
        }
        "rx" | "ry" => {
            check_params(&lowered, params, 1)?;
            check_qubits(&lowered, Arity::Exactly(1), qubits)?;
            lower_xy_rotation(&lowered, params[0], qubits[0])
        }
        "rz" | "p" | "phase" => {
            check_params(&lowered, params, 1)?;
            check_qubits(&lowered, Arity::Exactly(1), qubits)?;
            lower_phase(&lowered, params[0], qubits[0])
        }
        _ => {
            let kind = GateKind::from_name(&lowered)
                .filter(|k| !matches!(k, GateKind::Measure | GateKind::Break))
                .ok_or_else(|| BuildError::UnsupportedGate(name.to_string()))?;
            check_params(kind.name(), params, 0)?;
            check_qubits(kind.name(), kind.arity(), qubits)?;
            Ok(vec![GateOp::new(kind, qubits)])
        }
    }
}

fn check_params(gate: &str, params: &[f64], expected: usize) -> Result<()> {
    if params.len() != expected {
        return Err(BuildError::ParameterCount {
            gate: gate.to_string(),
            expected,
            actual: params.len(),
        });
    }
    Ok(())
}

fn check_qubits(gate: &str, arity: Arity, qubits: &[usize]) -> Result<()> {
    if !arity.accepts(qubits.len()) {
        return Err(BuildError::arity(gate, arity.to_string(), qubits.len()));
    }
    for (i, &q) in qubits.iter().enumerate() {
        if qubits[..i].contains(&q) {
            return Err(BuildError::DuplicateQubit {
                gate: gate.to_string(),
                qubit: q,
            });
        }
    }
    Ok(())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ANGLE_TOLERANCE
}

fn lower_xy_rotation(gate: &str, theta: f64, qubit: usize) -> Result<Vec<GateOp>> {
    // (-π, π]
    let mut normalized = (theta + PI).rem_euclid(TAU) - PI;
    if close(normalized, -PI) {
        normalized = PI;
    }

    let (half_turn, conjugate) = if gate == "rx" {
        (GateKind::X2p, GateKind::Z)
    } else {
        (GateKind::Y2p, GateKind::X)
    };

    if close(normalized, FRAC_PI_2) {
        Ok(vec![GateOp::new(half_turn, &[qubit])])
    } else if close(normalized, -FRAC_PI_2) {
        // R(-θ) = P R(θ) P
        Ok(vec![
            GateOp::new(conjugate, &[qubit]),
            GateOp::new(half_turn, &[qubit]),
            GateOp::new(conjugate, &[qubit]),
        ])
    } else {
        Err(BuildError::angle(gate, theta))
    }
}

fn lower_phase(gate: &str, theta: f64, qubit: usize) -> Result<Vec<GateOp>> {
    let turns = theta.rem_euclid(TAU) / FRAC_PI_4;
    let nearest = turns.round();
    if !close(nearest * FRAC_PI_4, turns * FRAC_PI_4) {
        return Err(BuildError::angle(gate, theta));
    }

    let kinds: &[GateKind] = match (nearest as i64).rem_euclid(8) {
        0 => &[],
        1 => &[GateKind::T],
        2 => &[GateKind::S],
        3 => &[GateKind::S, GateKind::T],
        4 => &[GateKind::Z],
        5 => &[GateKind::Z, GateKind::T],
        6 => &[GateKind::Sdg],
        _ => &[GateKind::Tdg],
    };
    Ok(kinds.iter().map(|&k| GateOp::new(k, &[qubit])).collect())
}
