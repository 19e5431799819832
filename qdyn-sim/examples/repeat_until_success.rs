//! Repeat-until-success with exact path probabilities
//!
//! Each trial applies `H·T·H` to a fresh qubit and measures it. Outcome 0
//! is a success; outcome 1 resets the qubit and retries. The per-trial
//! success probability is `p = (2 + √2)/4`, so succeeding on trial `k`
//! has probability `p·(1-p)^(k-1)`.
//!
//! Preset mode forces the outcome sequence `1, 1, …, 0` and reports the
//! exact probability of that path. Sample mode draws outcomes instead and
//! is used here to estimate the mean number of trials.

use qdyn_core::{Condition, Operand, Program, RegisterLayout, Statement};
use qdyn_sim::{Presets, RunMode, Simulator, SimulatorConfig};
use std::f64::consts::SQRT_2;

fn rus_program() -> Result<Program, Box<dyn std::error::Error>> {
    let mut layout = RegisterLayout::new();
    layout.add_qreg("q", 1)?;
    layout.add_creg("c", 1)?;

    let q = || Operand::new("q", 0);
    let c = || Operand::new("c", 0);
    let trial = || {
        vec![
            Statement::gate("h", [q()]),
            Statement::gate("t", [q()]),
            Statement::gate("h", [q()]),
            Statement::measure(q(), c()),
        ]
    };

    let mut program = Program::new(layout);
    program.statements.extend(trial());
    program.push(Statement::while_loop(
        Condition::bit(c()),
        std::iter::once(Statement::gate("x", [q()]))
            .chain(trial())
            .collect(),
    ));
    Ok(program)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Repeat Until Success ===\n");

    let program = rus_program()?;
    let mut sim = Simulator::from_program(&program, SimulatorConfig::default().with_seed(2024))?;

    println!("Block tree:");
    for block in sim.blocks() {
        println!("  {block}");
    }
    println!();

    let p = (2.0 + SQRT_2) / 4.0;
    println!("Exact path probabilities (preset mode)");
    println!("--------------------------------------");
    println!("{:>6} {:>22} {:>22}", "trial", "simulated", "p(1-p)^(k-1)");
    for k in 1..=8 {
        let presets = Presets::trial_sequence(0, k, true, false);
        let result = sim.run(RunMode::Preset, Some(presets))?;
        let expected = p * (1.0 - p).powi(k as i32 - 1);
        println!("{k:>6} {:>22.15e} {expected:>22.15e}", result.path_probability);
    }
    println!();

    let shots = 2000;
    let mut trials = 0;
    for _ in 0..shots {
        let result = sim.run(RunMode::Sample, None)?;
        trials += result.statistics.mid_measurements;
    }
    println!("Sampled {shots} runs");
    println!("  mean trials:    {:.4}", trials as f64 / shots as f64);
    println!("  expected (1/p): {:.4}", 1.0 / p);

    Ok(())
}
