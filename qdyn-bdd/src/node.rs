//! Handle types shared by every manager

use std::fmt;

/// A declared Boolean variable
///
/// Variables are ordered by declaration: the variable declared first is
/// closest to the root of every diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var(u32);

impl Var {
    /// Create a variable handle from its declaration index
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Declaration index of this variable
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn level(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Handle to a Boolean function owned by a [`BddManager`](crate::BddManager)
///
/// Handles are hash-consed: two handles from the same manager are equal
/// exactly when they denote the same function. The two constants have the
/// same handle in every manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Bdd(u32);

impl Bdd {
    /// The constant-false function
    pub const FALSE: Bdd = Bdd(0);

    /// The constant-true function
    pub const TRUE: Bdd = Bdd(1);

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the constant-false function
    #[inline]
    pub const fn is_false(self) -> bool {
        self.0 == 0
    }

    /// Whether this is the constant-true function
    #[inline]
    pub const fn is_true(self) -> bool {
        self.0 == 1
    }

    /// Whether this is one of the two constants
    #[inline]
    pub const fn is_const(self) -> bool {
        self.0 <= 1
    }
}

/// Level stored on the two terminal nodes
pub(crate) const TERMINAL_LEVEL: u32 = u32::MAX;

/// Decision node: `if var { high } else { low }`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Node {
    pub level: u32,
    pub low: Bdd,
    pub high: Bdd,
}

impl Node {
    pub(crate) const fn terminal(value: Bdd) -> Self {
        Self {
            level: TERMINAL_LEVEL,
            low: value,
            high: value,
        }
    }
}
