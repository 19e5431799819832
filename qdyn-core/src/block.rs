//! The block tree the execution engine interprets
//!
//! A program lowers to a sequence of [`Block`]s. Straight-line gate runs
//! become [`FlatBlock`]s, `if`/`switch` become [`BranchBlock`]s and `while`
//! becomes a [`LoopBlock`], whose trigger discipline is checked when it is
//! constructed.

use crate::error::{BuildError, Result};
use crate::gate::GateOp;
use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Classical bits read as an unsigned integer, bit `i` of the list worth `2^i`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Selector {
    clbits: Vec<usize>,
}

impl Selector {
    /// Widest selector that still fits a `u64`
    pub const MAX_WIDTH: usize = 64;

    pub fn new(clbits: Vec<usize>) -> Result<Self> {
        if clbits.is_empty() {
            return Err(BuildError::MalformedSelector(
                "selector reads no classical bits".to_string(),
            ));
        }
        if clbits.len() > Self::MAX_WIDTH {
            return Err(BuildError::MalformedSelector(format!(
                "selector reads {} bits, at most {} are supported",
                clbits.len(),
                Self::MAX_WIDTH
            )));
        }
        Ok(Self { clbits })
    }

    pub fn clbits(&self) -> &[usize] {
        &self.clbits
    }

    /// Whether `value` is representable in this selector's width
    pub fn fits(&self, value: u64) -> bool {
        self.clbits.len() >= Self::MAX_WIDTH || value >> self.clbits.len() == 0
    }

    /// Current selector value, with `bit` reporting each classical bit
    pub fn read(&self, mut bit: impl FnMut(usize) -> bool) -> u64 {
        self.clbits
            .iter()
            .enumerate()
            .filter(|&(_, &c)| bit(c))
            .fold(0, |acc, (i, _)| acc | (1 << i))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{:?}", self.clbits)
    }
}

/// Straight-line gate and measurement run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct FlatBlock {
    ops: Vec<GateOp>,
    num_qubits: usize,
    involved: BTreeSet<usize>,
}

impl FlatBlock {
    pub fn new(ops: Vec<GateOp>, num_qubits: usize) -> Self {
        let involved = ops.iter().flat_map(|op| op.qubits().iter().copied()).collect();
        Self {
            ops,
            num_qubits,
            involved,
        }
    }

    pub fn ops(&self) -> &[GateOp] {
        &self.ops
    }

    pub(crate) fn ops_mut(&mut self) -> &mut [GateOp] {
        &mut self.ops
    }

    pub fn involved_qubits(&self) -> &BTreeSet<usize> {
        &self.involved
    }

    /// Width of the whole register this block belongs to
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }
}

impl fmt::Display for FlatBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[flat] Global: {} | Active: {:?}",
            self.num_qubits, self.involved
        )
    }
}

/// Multi-way branch on a selector
///
/// Cases are tried in program order. `if`/`else` lowers to one case plus
/// the default.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BranchBlock {
    selector: Selector,
    cases: Vec<(u64, Vec<Block>)>,
    default: Vec<Block>,
    num_qubits: usize,
    involved: BTreeSet<usize>,
}

impl BranchBlock {
    pub fn new(
        selector: Selector,
        cases: Vec<(u64, Vec<Block>)>,
        default: Vec<Block>,
        num_qubits: usize,
    ) -> Result<Self> {
        for (i, (value, _)) in cases.iter().enumerate() {
            if !selector.fits(*value) {
                return Err(BuildError::MalformedSelector(format!(
                    "case value {value} does not fit in {} bits",
                    selector.clbits().len()
                )));
            }
            if cases[..i].iter().any(|(v, _)| v == value) {
                return Err(BuildError::DuplicateCase(*value));
            }
        }

        let involved = cases
            .iter()
            .flat_map(|(_, blocks)| blocks.iter())
            .chain(default.iter())
            .flat_map(|b| b.involved_qubits().iter().copied())
            .collect();

        Ok(Self {
            selector,
            cases,
            default,
            num_qubits,
            involved,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn cases(&self) -> &[(u64, Vec<Block>)] {
        &self.cases
    }

    pub fn default_blocks(&self) -> &[Block] {
        &self.default
    }

    /// Blocks to run for `value`
    pub fn dispatch(&self, value: u64) -> &[Block] {
        self.cases
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, blocks)| blocks.as_slice())
            .unwrap_or(&self.default)
    }

    pub fn involved_qubits(&self) -> &BTreeSet<usize> {
        &self.involved
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn children_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.cases
            .iter_mut()
            .flat_map(|(_, blocks)| blocks.iter_mut())
            .chain(self.default.iter_mut())
    }
}

impl fmt::Display for BranchBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[branch] Global: {} | Targets: {} | Cases: {{",
            self.num_qubits, self.selector
        )?;
        for (i, (value, blocks)) in self.cases.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}->{}blks", blocks.len())?;
        }
        write!(f, "}} | Default->{}blks", self.default.len())
    }
}

/// While loop, continuing as long as the selector equals `expected`
///
/// The qubits measured into selector bits are the loop's trigger
/// (external) qubits. Each trigger measurement must be the last operation
/// on its qubit within the body, so construction rejects any later op that
/// touches one. All other qubits are internal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct LoopBlock {
    selector: Selector,
    expected: u64,
    body: Vec<Block>,
    num_qubits: usize,
    external: BTreeSet<usize>,
    internal: BTreeSet<usize>,
    involved: BTreeSet<usize>,
}

impl LoopBlock {
    pub fn new(selector: Selector, expected: u64, body: Vec<Block>, num_qubits: usize) -> Result<Self> {
        if !selector.fits(expected) {
            return Err(BuildError::MalformedSelector(format!(
                "loop value {expected} does not fit in {} bits",
                selector.clbits().len()
            )));
        }

        let flags: BTreeSet<usize> = selector.clbits().iter().copied().collect();
        let mut external = BTreeSet::new();
        scan_trigger_order(&body, &flags, &mut external)?;
        if external.is_empty() {
            return Err(BuildError::LoopWithoutTrigger(selector.clbits().to_vec()));
        }

        let internal = (0..num_qubits).filter(|q| !external.contains(q)).collect();
        let involved = body
            .iter()
            .flat_map(|b| b.involved_qubits().iter().copied())
            .collect();

        Ok(Self {
            selector,
            expected,
            body,
            num_qubits,
            external,
            internal,
            involved,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn expected(&self) -> u64 {
        self.expected
    }

    pub fn body(&self) -> &[Block] {
        &self.body
    }

    /// Trigger qubits
    pub fn external_qubits(&self) -> &BTreeSet<usize> {
        &self.external
    }

    pub fn internal_qubits(&self) -> &BTreeSet<usize> {
        &self.internal
    }

    pub fn involved_qubits(&self) -> &BTreeSet<usize> {
        &self.involved
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }
}

fn overlap(qubits: &BTreeSet<usize>, measured: &BTreeSet<usize>) -> Vec<usize> {
    qubits.intersection(measured).copied().collect()
}

/// Walk `blocks` in program order, recording flag-measured qubits in
/// `measured` and failing on any later use of one.
fn scan_trigger_order(
    blocks: &[Block],
    flags: &BTreeSet<usize>,
    measured: &mut BTreeSet<usize>,
) -> Result<()> {
    for block in blocks {
        let touched = overlap(block.involved_qubits(), measured);
        if !touched.is_empty() {
            return Err(BuildError::TriggerOrder {
                op: block.kind_name().to_string(),
                qubits: touched,
            });
        }

        match block {
            Block::Flat(flat) => {
                for op in flat.ops() {
                    let touched: Vec<usize> = op
                        .qubits()
                        .iter()
                        .copied()
                        .filter(|q| measured.contains(q))
                        .collect();
                    if !touched.is_empty() {
                        return Err(BuildError::TriggerOrder {
                            op: op.kind().name().to_string(),
                            qubits: touched,
                        });
                    }
                    if op.is_measure() && op.clbits().iter().any(|c| flags.contains(c)) {
                        measured.extend(op.qubits().iter().copied());
                    }
                }
            }
            Block::Branch(branch) => {
                for (_, sub) in branch.cases() {
                    scan_trigger_order(sub, flags, measured)?;
                }
                scan_trigger_order(branch.default_blocks(), flags, measured)?;
            }
            Block::Loop(inner) => scan_trigger_order(inner.body(), flags, measured)?,
        }
    }
    Ok(())
}

impl fmt::Display for LoopBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[loop] Global: {} | Flag: {} == {}",
            self.num_qubits, self.selector, self.expected
        )?;
        writeln!(f, "      External (Trigger): {:?}", self.external)?;
        writeln!(f, "      Internal (Rest):    {:?}", self.internal)?;
        write!(f, "      Body: {} sub-blocks", self.body.len())
    }
}

/// One node of the block tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Block {
    Flat(FlatBlock),
    Branch(BranchBlock),
    Loop(LoopBlock),
}

impl Block {
    pub fn involved_qubits(&self) -> &BTreeSet<usize> {
        match self {
            Block::Flat(b) => b.involved_qubits(),
            Block::Branch(b) => b.involved_qubits(),
            Block::Loop(b) => b.involved_qubits(),
        }
    }

    /// Width of the whole register
    pub fn num_qubits(&self) -> usize {
        match self {
            Block::Flat(b) => b.num_qubits(),
            Block::Branch(b) => b.num_qubits(),
            Block::Loop(b) => b.num_qubits(),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Block::Flat(_) => "flat",
            Block::Branch(_) => "branch",
            Block::Loop(_) => "loop",
        }
    }

    /// Every gate op in program order, descending into branches and loop bodies
    pub fn for_each_op<'a>(&'a self, f: &mut dyn FnMut(&'a GateOp)) {
        match self {
            Block::Flat(b) => {
                for op in b.ops() {
                    f(op);
                }
            }
            Block::Branch(b) => {
                for (_, sub) in b.cases() {
                    for blk in sub {
                        blk.for_each_op(f);
                    }
                }
                for blk in b.default_blocks() {
                    blk.for_each_op(f);
                }
            }
            Block::Loop(b) => {
                for blk in b.body() {
                    blk.for_each_op(f);
                }
            }
        }
    }

    pub(crate) fn for_each_op_mut(&mut self, f: &mut dyn FnMut(&mut GateOp)) {
        match self {
            Block::Flat(b) => {
                for op in b.ops_mut() {
                    f(op);
                }
            }
            Block::Branch(b) => {
                for blk in b.children_mut() {
                    blk.for_each_op_mut(f);
                }
            }
            Block::Loop(b) => {
                for blk in b.body.iter_mut() {
                    blk.for_each_op_mut(f);
                }
            }
        }
    }

    /// Every selector in this subtree, outermost first
    pub fn for_each_selector<'a>(&'a self, f: &mut dyn FnMut(&'a Selector)) {
        match self {
            Block::Flat(_) => {}
            Block::Branch(b) => {
                f(b.selector());
                for (_, sub) in b.cases() {
                    for blk in sub {
                        blk.for_each_selector(f);
                    }
                }
                for blk in b.default_blocks() {
                    blk.for_each_selector(f);
                }
            }
            Block::Loop(b) => {
                f(b.selector());
                for blk in b.body() {
                    blk.for_each_selector(f);
                }
            }
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Flat(b) => b.fmt(f),
            Block::Branch(b) => b.fmt(f),
            Block::Loop(b) => b.fmt(f),
        }
    }
}

impl From<FlatBlock> for Block {
    fn from(b: FlatBlock) -> Self {
        Block::Flat(b)
    }
}

impl From<BranchBlock> for Block {
    fn from(b: BranchBlock) -> Self {
        Block::Branch(b)
    }
}

impl From<LoopBlock> for Block {
    fn from(b: LoopBlock) -> Self {
        Block::Loop(b)
    }
}
