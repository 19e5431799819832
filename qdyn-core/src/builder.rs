//! Lowering of a [`Program`] to the block tree

use crate::block::{Block, BranchBlock, FlatBlock, LoopBlock, Selector};
use crate::error::{BuildError, Result};
use crate::gate::{GateKind, GateOp};
use crate::lowering::lower_gate;
use crate::program::{ClassicalTarget, Condition, Expr, Operand, Program, RegisterLayout, Scope, Statement};
use ahash::{AHashMap, AHashSet};
use tracing::{debug, warn};

/// Build and validate the block tree for `program`
///
/// Straight-line statements are grouped into flat blocks; every `if`,
/// `switch` and `while` closes the current flat block. `for` loops are
/// unrolled in place. Final measurements are marked once the whole tree
/// exists.
///
/// # Example
///
/// ```
/// use qdyn_core::{build, Condition, Operand, Program, RegisterLayout, Statement};
///
/// let mut layout = RegisterLayout::new();
/// layout.add_qreg("q", 1).unwrap();
/// layout.add_creg("c", 1).unwrap();
///
/// let mut program = Program::new(layout);
/// program
///     .push(Statement::gate("h", [Operand::new("q", 0)]))
///     .push(Statement::measure(Operand::new("q", 0), Operand::new("c", 0)))
///     .push(Statement::while_loop(
///         Condition::bit(Operand::new("c", 0)),
///         vec![
///             Statement::gate("h", [Operand::new("q", 0)]),
///             Statement::measure(Operand::new("q", 0), Operand::new("c", 0)),
///         ],
///     ));
///
/// let blocks = build(&program).unwrap();
/// assert_eq!(blocks.len(), 2);
/// ```
pub fn build(program: &Program) -> Result<Vec<Block>> {
    let mut builder = Builder::new(&program.layout);
    let mut blocks = builder.lower_sequence(&program.statements)?;
    mark_final_measurements(&mut blocks);
    debug!(
        blocks = blocks.len(),
        qubits = builder.num_qubits,
        clbits = program.layout.num_clbits(),
        "built block tree"
    );
    Ok(blocks)
}

/// Flag read-out measurements
///
/// For each qubit, its last op in the flattened tree (all branches and loop
/// bodies, in program order) is inspected. If that op is a measurement whose
/// classical bit no branch or loop selector reads, it becomes final.
pub fn mark_final_measurements(blocks: &mut [Block]) {
    let mut control_bits = AHashSet::new();
    for block in blocks.iter() {
        block.for_each_selector(&mut |sel| control_bits.extend(sel.clbits().iter().copied()));
    }

    let mut last_use: AHashMap<usize, usize> = AHashMap::new();
    let mut id = 0;
    for block in blocks.iter() {
        block.for_each_op(&mut |op| {
            for &q in op.qubits() {
                last_use.insert(q, id);
            }
            id += 1;
        });
    }

    let mut id = 0;
    for block in blocks.iter_mut() {
        block.for_each_op_mut(&mut |op| {
            let is_last = op.qubits().iter().any(|q| last_use.get(q) == Some(&id));
            let is_read = op.clbits().iter().any(|c| control_bits.contains(c));
            op.set_final(op.is_measure() && is_last && !is_read);
            id += 1;
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopKind {
    For,
    While,
}

/// Blocks produced so far plus the pending straight-line run
#[derive(Default)]
struct Sequence {
    blocks: Vec<Block>,
    pending: Vec<GateOp>,
}

impl Sequence {
    fn flush(&mut self, num_qubits: usize) {
        if !self.pending.is_empty() {
            let ops = std::mem::take(&mut self.pending);
            self.blocks.push(FlatBlock::new(ops, num_qubits).into());
        }
    }

    fn finish(mut self, num_qubits: usize) -> Vec<Block> {
        self.flush(num_qubits);
        self.blocks
    }
}

struct Builder<'p> {
    layout: &'p RegisterLayout,
    num_qubits: usize,
    scope: Scope,
    loops: Vec<LoopKind>,
}

impl<'p> Builder<'p> {
    fn new(layout: &'p RegisterLayout) -> Self {
        Self {
            layout,
            num_qubits: layout.num_qubits(),
            scope: Scope::new(),
            loops: Vec::new(),
        }
    }

    fn lower_sequence(&mut self, statements: &[Statement]) -> Result<Vec<Block>> {
        let mut seq = Sequence::default();
        self.lower_into(statements, &mut seq)?;
        Ok(seq.finish(self.num_qubits))
    }

    fn lower_into(&mut self, statements: &[Statement], seq: &mut Sequence) -> Result<()> {
        for stmt in statements {
            match stmt {
                Statement::Gate {
                    name,
                    params,
                    qubits,
                } => {
                    let params = params
                        .iter()
                        .map(|p| p.eval(&self.scope))
                        .collect::<Result<Vec<_>>>()?;
                    let qubits = qubits
                        .iter()
                        .map(|q| self.qubit(q))
                        .collect::<Result<Vec<_>>>()?;
                    seq.pending.extend(lower_gate(name, &params, &qubits)?);
                }
                Statement::Measure { qubit, target } => {
                    let op = GateOp::measure(self.qubit(qubit)?, self.clbit(target)?);
                    seq.pending.push(op);
                }
                Statement::Reset { qubit } => {
                    seq.pending.push(GateOp::new(GateKind::Reset, &[self.qubit(qubit)?]));
                }
                Statement::Break => {
                    if self.loops.last() != Some(&LoopKind::While) {
                        return Err(BuildError::BreakOutsideLoop);
                    }
                    seq.pending.push(GateOp::brk());
                }
                Statement::For {
                    variable,
                    start,
                    stop,
                    step,
                    body,
                } => self.unroll(variable, start, stop, step, body, seq)?,
                Statement::If {
                    condition,
                    then_body,
                    else_body,
                } => {
                    seq.flush(self.num_qubits);
                    let (selector, value) = self.condition(condition)?;
                    let then_blocks = self.lower_sequence(then_body)?;
                    let else_blocks = self.lower_sequence(else_body)?;
                    let branch = BranchBlock::new(
                        selector,
                        vec![(value, then_blocks)],
                        else_blocks,
                        self.num_qubits,
                    )?;
                    seq.blocks.push(branch.into());
                }
                Statement::Switch {
                    target,
                    cases,
                    default,
                } => {
                    seq.flush(self.num_qubits);
                    let selector = self.selector(target)?;
                    let cases = cases
                        .iter()
                        .map(|(value, body)| Ok((*value, self.lower_sequence(body)?)))
                        .collect::<Result<Vec<_>>>()?;
                    let default = self.lower_sequence(default)?;
                    let branch = BranchBlock::new(selector, cases, default, self.num_qubits)?;
                    seq.blocks.push(branch.into());
                }
                Statement::While { condition, body } => {
                    seq.flush(self.num_qubits);
                    let (selector, value) = self.condition(condition)?;
                    self.loops.push(LoopKind::While);
                    let body = self.lower_sequence(body);
                    self.loops.pop();
                    let lp = LoopBlock::new(selector, value, body?, self.num_qubits)?;
                    seq.blocks.push(lp.into());
                }
            }
        }
        Ok(())
    }

    /// Inline `body` once per value of the inclusive range
    fn unroll(
        &mut self,
        variable: &str,
        start: &Expr,
        stop: &Expr,
        step: &Expr,
        body: &[Statement],
        seq: &mut Sequence,
    ) -> Result<()> {
        let start = start.eval_int(&self.scope)?;
        let stop = stop.eval_int(&self.scope)?;
        let step = step.eval_int(&self.scope)?;
        if step == 0 {
            warn!(variable, start, stop, "for loop with zero step has no iterations");
            return Ok(());
        }

        let shadowed = self.scope.get(variable).copied();
        self.loops.push(LoopKind::For);
        let mut value = start;
        let mut result = Ok(());
        while (step > 0 && value <= stop) || (step < 0 && value >= stop) {
            self.scope.insert(variable.to_string(), value);
            result = self.lower_into(body, seq);
            if result.is_err() {
                break;
            }
            // the range ends at the edge of i64
            match value.checked_add(step) {
                Some(next) => value = next,
                None => break,
            }
        }
        self.loops.pop();

        match shadowed {
            Some(previous) => self.scope.insert(variable.to_string(), previous),
            None => self.scope.remove(variable),
        };
        result
    }

    fn qubit(&self, operand: &Operand) -> Result<usize> {
        let index = operand.index.eval_index(&self.scope)?;
        self.layout.resolve_qubit(&operand.register, index)
    }

    fn clbit(&self, operand: &Operand) -> Result<usize> {
        let index = operand.index.eval_index(&self.scope)?;
        self.layout.resolve_clbit(&operand.register, index)
    }

    fn selector(&self, target: &ClassicalTarget) -> Result<Selector> {
        let clbits = match target {
            ClassicalTarget::Bit(operand) => vec![self.clbit(operand)?],
            ClassicalTarget::Register(name) => {
                let reg = self
                    .layout
                    .creg(name)
                    .ok_or_else(|| BuildError::UnknownRegister(name.clone()))?;
                (reg.offset..reg.offset + reg.size).collect()
            }
        };
        Selector::new(clbits)
    }

    fn condition(&self, condition: &Condition) -> Result<(Selector, u64)> {
        Ok((self.selector(&condition.target)?, condition.value))
    }
}
