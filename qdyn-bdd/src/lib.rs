//! Reduced ordered binary decision diagrams for qdyn
//!
//! A small hash-consed BDD package: a [`BddManager`] owns the node arena,
//! functions are referred to by copyable [`Bdd`] handles, and variables by
//! [`Var`] handles ordered by declaration.
//!
//! Satisfying-assignment counts are exact ([`num_bigint::BigUint`]), which the
//! amplitude kernels rely on for their exact-zero tests.
//!
//! # Example
//!
//! ```
//! use qdyn_bdd::{BddManager, Var};
//!
//! let mut m = BddManager::with_vars(2, "q");
//! let a = m.var(Var::new(0));
//! let b = m.var(Var::new(1));
//! let f = m.or(a, b);
//! assert_eq!(m.count(f), 3u32.into());
//! ```

mod manager;
mod node;

pub use manager::BddManager;
pub use node::{Bdd, Var};
