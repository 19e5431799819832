//! Gate vocabulary and lowered operations

use smallvec::SmallVec;
use std::fmt;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Operations the amplitude kernel executes directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum GateKind {
    X,
    Y,
    Z,
    H,
    S,
    Sdg,
    T,
    Tdg,
    /// `Rx(π/2)`
    X2p,
    /// `Ry(π/2)`
    Y2p,
    Cx,
    Cz,
    Swap,
    Ccx,
    Cswap,
    /// Controls first, target last
    Mcx,
    /// Coin qubit first, then the position register most significant first
    Cwalk,
    Reset,
    Measure,
    Break,
}

/// Number of qubits an operation takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

impl GateKind {
    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            GateKind::X => "x",
            GateKind::Y => "y",
            GateKind::Z => "z",
            GateKind::H => "h",
            GateKind::S => "s",
            GateKind::Sdg => "sdg",
            GateKind::T => "t",
            GateKind::Tdg => "tdg",
            GateKind::X2p => "x2p",
            GateKind::Y2p => "y2p",
            GateKind::Cx => "cx",
            GateKind::Cz => "cz",
            GateKind::Swap => "swap",
            GateKind::Ccx => "ccx",
            GateKind::Cswap => "cswap",
            GateKind::Mcx => "mcx",
            GateKind::Cwalk => "cwalk",
            GateKind::Reset => "reset",
            GateKind::Measure => "measure",
            GateKind::Break => "break",
        }
    }

    /// Look up a gate by name or alias, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "x" => GateKind::X,
            "y" => GateKind::Y,
            "z" => GateKind::Z,
            "h" => GateKind::H,
            "s" => GateKind::S,
            "sdg" => GateKind::Sdg,
            "t" => GateKind::T,
            "tdg" => GateKind::Tdg,
            "x2p" => GateKind::X2p,
            "y2p" => GateKind::Y2p,
            "cx" | "cnot" => GateKind::Cx,
            "cz" => GateKind::Cz,
            "swap" => GateKind::Swap,
            "ccx" | "toffoli" => GateKind::Ccx,
            "cswap" | "fredkin" => GateKind::Cswap,
            "mcx" => GateKind::Mcx,
            "cwalk" => GateKind::Cwalk,
            "reset" => GateKind::Reset,
            "measure" => GateKind::Measure,
            "break" => GateKind::Break,
            _ => return None,
        };
        Some(kind)
    }

    pub fn arity(self) -> Arity {
        match self {
            GateKind::Break => Arity::Exactly(0),
            GateKind::Cx | GateKind::Cz | GateKind::Swap => Arity::Exactly(2),
            GateKind::Ccx | GateKind::Cswap => Arity::Exactly(3),
            GateKind::Mcx | GateKind::Cwalk => Arity::AtLeast(1),
            _ => Arity::Exactly(1),
        }
    }

    /// Whether the kernel applies this as a unitary
    pub fn is_unitary(self) -> bool {
        !matches!(self, GateKind::Reset | GateKind::Measure | GateKind::Break)
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One lowered operation on global qubit and classical-bit indices
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct GateOp {
    kind: GateKind,
    qubits: SmallVec<[usize; 3]>,
    clbits: SmallVec<[usize; 1]>,
    is_final: bool,
}

impl GateOp {
    /// A gate or reset on `qubits`
    pub fn new(kind: GateKind, qubits: &[usize]) -> Self {
        Self {
            kind,
            qubits: SmallVec::from_slice(qubits),
            clbits: SmallVec::new(),
            is_final: false,
        }
    }

    /// Measure `qubit` into `clbit`
    pub fn measure(qubit: usize, clbit: usize) -> Self {
        Self {
            kind: GateKind::Measure,
            qubits: SmallVec::from_slice(&[qubit]),
            clbits: SmallVec::from_slice(&[clbit]),
            is_final: false,
        }
    }

    /// Leave the innermost enclosing loop
    pub fn brk() -> Self {
        Self::new(GateKind::Break, &[])
    }

    #[inline]
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    #[inline]
    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    /// Classical bits written, paired with [`qubits`](Self::qubits) by position
    #[inline]
    pub fn clbits(&self) -> &[usize] {
        &self.clbits
    }

    #[inline]
    pub fn is_measure(&self) -> bool {
        self.kind == GateKind::Measure
    }

    /// A measurement whose outcome nothing downstream reads
    ///
    /// Final measurements are sampled without collapsing the state.
    #[inline]
    pub fn is_final(&self) -> bool {
        self.is_measure() && self.is_final
    }

    pub(crate) fn set_final(&mut self, is_final: bool) {
        self.is_final = is_final;
    }
}

impl fmt::Display for GateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if self.is_final() {
            write!(f, "[final]")?;
        }
        write!(f, "(")?;
        for (i, q) in self.qubits.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "q{q}")?;
        }
        write!(f, ")")?;
        if !self.clbits.is_empty() {
            write!(f, " -> c{:?}", self.clbits.as_slice())?;
        }
        Ok(())
    }
}
