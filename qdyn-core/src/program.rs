//! Structured source programs
//!
//! A [`Program`] is the parsed form of a dynamic circuit: register
//! declarations plus a tree of [`Statement`]s. It is what the front end
//! hands to [`build`](crate::build); text parsing is out of scope here.

use crate::error::{BuildError, Result};
use ahash::AHashMap;
use std::f64::consts::PI;
use std::fmt;
use std::ops;

/// Arithmetic expression for angles and register indices
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Pi,
    /// For-loop variable
    Var(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Values bound to for-loop variables
pub type Scope = AHashMap<String, i64>;

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    /// Evaluate under the loop bindings in `scope`
    pub fn eval(&self, scope: &Scope) -> Result<f64> {
        Ok(match self {
            Expr::Int(v) => *v as f64,
            Expr::Float(v) => *v,
            Expr::Pi => PI,
            Expr::Var(name) => {
                let value = scope
                    .get(name)
                    .copied()
                    .ok_or_else(|| BuildError::UnboundVariable(name.clone()))?;
                value as f64
            }
            Expr::Neg(inner) => -inner.eval(scope)?,
            Expr::Binary { op, lhs, rhs } => {
                let (l, r) = (lhs.eval(scope)?, rhs.eval(scope)?);
                match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                }
            }
        })
    }

    /// Evaluate to a non-negative integer index
    pub fn eval_index(&self, scope: &Scope) -> Result<usize> {
        let value = self.eval(scope)?;
        if value < 0.0 || value.fract() != 0.0 || !value.is_finite() {
            return Err(BuildError::InvalidIndex(value));
        }
        Ok(value as usize)
    }

    /// Evaluate to an integer, as for-loop bounds require
    pub fn eval_int(&self, scope: &Scope) -> Result<i64> {
        // literals and loop variables stay exact past 2^53
        match self {
            Expr::Int(v) => return Ok(*v),
            Expr::Var(name) => {
                return scope
                    .get(name)
                    .copied()
                    .ok_or_else(|| BuildError::UnboundVariable(name.clone()))
            }
            _ => {}
        }
        let value = self.eval(scope)?;
        if value.fract() != 0.0 || !value.is_finite() {
            return Err(BuildError::InvalidIndex(value));
        }
        Ok(value as i64)
    }

    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Expr::Int(v)
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        Expr::Int(i64::from(v))
    }
}

impl From<usize> for Expr {
    fn from(v: usize) -> Self {
        Expr::Int(v as i64)
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Float(v)
    }
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Add, self, rhs)
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Sub, self, rhs)
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Mul, self, rhs)
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Div, self, rhs)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{v}"),
            Expr::Float(v) => write!(f, "{v}"),
            Expr::Pi => write!(f, "pi"),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Neg(inner) => write!(f, "-({inner})"),
            Expr::Binary { op, lhs, rhs } => {
                let sym = match op {
                    BinOp::Add => "+",
                    BinOp::Sub => "-",
                    BinOp::Mul => "*",
                    BinOp::Div => "/",
                };
                write!(f, "({lhs} {sym} {rhs})")
            }
        }
    }
}

/// Element of a register, `name[index]`
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub register: String,
    pub index: Expr,
}

impl Operand {
    pub fn new(register: impl Into<String>, index: impl Into<Expr>) -> Self {
        Self {
            register: register.into(),
            index: index.into(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

/// Classical bits a condition or switch reads
#[derive(Debug, Clone, PartialEq)]
pub enum ClassicalTarget {
    /// A single bit
    Bit(Operand),
    /// Every bit of a register, bit 0 least significant
    Register(String),
}

/// `target == value`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub target: ClassicalTarget,
    pub value: u64,
}

impl Condition {
    /// `target == value`
    pub fn equals(target: ClassicalTarget, value: u64) -> Self {
        Self { target, value }
    }

    /// A bare bit: true when the bit is set
    pub fn bit(bit: Operand) -> Self {
        Self::equals(ClassicalTarget::Bit(bit), 1)
    }

    /// A negated bit: true when the bit is clear
    pub fn not_bit(bit: Operand) -> Self {
        Self::equals(ClassicalTarget::Bit(bit), 0)
    }

    /// A whole register compared with `value`
    pub fn register(name: impl Into<String>, value: u64) -> Self {
        Self::equals(ClassicalTarget::Register(name.into()), value)
    }
}

/// One source statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Gate {
        name: String,
        params: Vec<Expr>,
        qubits: Vec<Operand>,
    },
    Measure {
        qubit: Operand,
        target: Operand,
    },
    Reset {
        qubit: Operand,
    },
    /// Inclusive range `start..=stop` stepping by `step`, unrolled at build time
    For {
        variable: String,
        start: Expr,
        stop: Expr,
        step: Expr,
        body: Vec<Statement>,
    },
    If {
        condition: Condition,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
    },
    Switch {
        target: ClassicalTarget,
        cases: Vec<(u64, Vec<Statement>)>,
        default: Vec<Statement>,
    },
    While {
        condition: Condition,
        body: Vec<Statement>,
    },
    Break,
}

impl Statement {
    /// A parameterless gate
    pub fn gate(name: impl Into<String>, qubits: impl IntoIterator<Item = Operand>) -> Self {
        Statement::Gate {
            name: name.into(),
            params: Vec::new(),
            qubits: qubits.into_iter().collect(),
        }
    }

    /// A rotation-style gate with angle parameters
    pub fn rotation(
        name: impl Into<String>,
        params: impl IntoIterator<Item = Expr>,
        qubits: impl IntoIterator<Item = Operand>,
    ) -> Self {
        Statement::Gate {
            name: name.into(),
            params: params.into_iter().collect(),
            qubits: qubits.into_iter().collect(),
        }
    }

    pub fn measure(qubit: Operand, target: Operand) -> Self {
        Statement::Measure { qubit, target }
    }

    pub fn if_then(condition: Condition, then_body: Vec<Statement>) -> Self {
        Statement::If {
            condition,
            then_body,
            else_body: Vec::new(),
        }
    }

    pub fn while_loop(condition: Condition, body: Vec<Statement>) -> Self {
        Statement::While { condition, body }
    }

    /// `for variable in [start:stop]` with unit step
    pub fn for_range(
        variable: impl Into<String>,
        start: impl Into<Expr>,
        stop: impl Into<Expr>,
        body: Vec<Statement>,
    ) -> Self {
        Statement::For {
            variable: variable.into(),
            start: start.into(),
            stop: stop.into(),
            step: Expr::Int(1),
            body,
        }
    }
}

/// A declared register and its slice of the global index space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub name: String,
    pub offset: usize,
    pub size: usize,
}

/// Quantum and classical registers, flattened in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterLayout {
    qregs: Vec<Register>,
    cregs: Vec<Register>,
}

impl RegisterLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a quantum register, returning its global offset
    pub fn add_qreg(&mut self, name: impl Into<String>, size: usize) -> Result<usize> {
        let name = name.into();
        if self.qreg(&name).is_some() {
            return Err(BuildError::DuplicateRegister(name));
        }
        let offset = self.num_qubits();
        self.qregs.push(Register { name, offset, size });
        Ok(offset)
    }

    /// Declare a classical register, returning its global offset
    pub fn add_creg(&mut self, name: impl Into<String>, size: usize) -> Result<usize> {
        let name = name.into();
        if self.creg(&name).is_some() {
            return Err(BuildError::DuplicateRegister(name));
        }
        let offset = self.num_clbits();
        self.cregs.push(Register { name, offset, size });
        Ok(offset)
    }

    pub fn num_qubits(&self) -> usize {
        self.qregs.iter().map(|r| r.size).sum()
    }

    pub fn num_clbits(&self) -> usize {
        self.cregs.iter().map(|r| r.size).sum()
    }

    pub fn qreg(&self, name: &str) -> Option<&Register> {
        self.qregs.iter().find(|r| r.name == name)
    }

    pub fn creg(&self, name: &str) -> Option<&Register> {
        self.cregs.iter().find(|r| r.name == name)
    }

    pub fn qregs(&self) -> &[Register] {
        &self.qregs
    }

    pub fn cregs(&self) -> &[Register] {
        &self.cregs
    }

    /// Global index of `register[index]` among qubits
    pub fn resolve_qubit(&self, register: &str, index: usize) -> Result<usize> {
        let reg = self
            .qreg(register)
            .ok_or_else(|| BuildError::UnknownRegister(register.to_string()))?;
        Self::resolve(reg, index)
    }

    /// Global index of `register[index]` among classical bits
    pub fn resolve_clbit(&self, register: &str, index: usize) -> Result<usize> {
        let reg = self
            .creg(register)
            .ok_or_else(|| BuildError::UnknownRegister(register.to_string()))?;
        Self::resolve(reg, index)
    }

    fn resolve(reg: &Register, index: usize) -> Result<usize> {
        if index >= reg.size {
            return Err(BuildError::IndexOutOfRange {
                register: reg.name.clone(),
                index,
                size: reg.size,
            });
        }
        Ok(reg.offset + index)
    }
}

/// Registers plus top-level statements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub layout: RegisterLayout,
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(layout: RegisterLayout) -> Self {
        Self {
            layout,
            statements: Vec::new(),
        }
    }

    /// Append a statement, builder style
    pub fn push(&mut self, statement: Statement) -> &mut Self {
        self.statements.push(statement);
        self
    }
}
