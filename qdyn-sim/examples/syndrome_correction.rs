//! Bit-flip syndrome extraction with classically controlled correction
//!
//! Three data qubits hold the repetition code word for |1⟩ with a flip on
//! q0. Two ancillas measure the parities q0⊕q1 and q0⊕q2; the syndrome
//! register then selects which data qubit to flip back, and each ancilla
//! is returned to |0⟩.

use qdyn_core::{Condition, Operand, Program, RegisterLayout, Statement};
use qdyn_sim::{RunMode, Simulator, SimulatorConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Syndrome Correction ===\n");

    let mut layout = RegisterLayout::new();
    layout.add_qreg("q", 5)?;
    layout.add_creg("c", 2)?;
    let q = |i: usize| Operand::new("q", i);
    let c = |i: usize| Operand::new("c", i);

    let mut program = Program::new(layout);
    program
        // encode |1⟩, then corrupt q0
        .push(Statement::gate("x", [q(0)]))
        .push(Statement::gate("cx", [q(0), q(1)]))
        .push(Statement::gate("cx", [q(1), q(2)]))
        .push(Statement::gate("x", [q(0)]))
        // parities into the ancillas
        .push(Statement::gate("cx", [q(0), q(3)]))
        .push(Statement::gate("cx", [q(1), q(3)]))
        .push(Statement::gate("cx", [q(0), q(4)]))
        .push(Statement::gate("cx", [q(2), q(4)]))
        .push(Statement::measure(q(3), c(0)))
        .push(Statement::measure(q(4), c(1)))
        // clear the ancillas
        .push(Statement::if_then(Condition::bit(c(0)), vec![Statement::gate("x", [q(3)])]))
        .push(Statement::if_then(Condition::bit(c(1)), vec![Statement::gate("x", [q(4)])]))
        // correct the data qubit the syndrome points at
        .push(Statement::if_then(Condition::register("c", 3), vec![Statement::gate("x", [q(0)])]))
        .push(Statement::if_then(Condition::register("c", 1), vec![Statement::gate("x", [q(1)])]))
        .push(Statement::if_then(Condition::register("c", 2), vec![Statement::gate("x", [q(2)])]));

    let mut sim = Simulator::from_program(&program, SimulatorConfig::default())?;
    let result = sim.run(RunMode::Sample, None)?;

    println!("Syndrome:         c = {}", result.bitstring(2));
    println!("Path probability: {}", result.path_probability);
    println!("{}", result.statistics);

    println!("Non-zero amplitudes:");
    for (basis, amp) in sim.normalized_amplitudes()?.iter().enumerate() {
        if amp.norm() > 0.0 {
            println!("  |{basis:05b}⟩  {amp:.6}");
        }
    }

    Ok(())
}
