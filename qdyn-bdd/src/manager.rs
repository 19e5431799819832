//! Node arena, unique table and Boolean operations

use crate::node::{Bdd, Node, Var, TERMINAL_LEVEL};
use ahash::{AHashMap, AHashSet};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::collections::BTreeSet;
use std::fmt;

/// Entries kept in the ITE cache before it is flushed
const ITE_CACHE_LIMIT: usize = 1 << 22;

/// Owner of a family of reduced ordered decision diagrams
///
/// Every function built through one manager shares its nodes with every
/// other function of that manager. Operations take `&mut self` because they
/// may allocate nodes. Nodes are never freed while the manager lives.
#[derive(Clone)]
pub struct BddManager {
    nodes: Vec<Node>,
    unique: AHashMap<Node, Bdd>,
    ite_cache: AHashMap<(Bdd, Bdd, Bdd), Bdd>,
    names: Vec<String>,
}

impl Default for BddManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BddManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BddManager")
            .field("num_vars", &self.names.len())
            .field("num_nodes", &self.nodes.len())
            .finish()
    }
}

impl BddManager {
    /// Create a manager with no declared variables
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::terminal(Bdd::FALSE), Node::terminal(Bdd::TRUE)],
            unique: AHashMap::new(),
            ite_cache: AHashMap::new(),
            names: Vec::new(),
        }
    }

    /// Create a manager and declare `count` variables named `{prefix}{i}`
    pub fn with_vars(count: usize, prefix: &str) -> Self {
        let mut manager = Self::new();
        for i in 0..count {
            manager.add_var(format!("{prefix}{i}"));
        }
        manager
    }

    /// Declare a new variable below all previously declared ones
    pub fn add_var(&mut self, name: impl Into<String>) -> Var {
        let var = Var::new(self.names.len());
        self.names.push(name.into());
        var
    }

    /// Number of declared variables
    pub fn num_vars(&self) -> usize {
        self.names.len()
    }

    /// Name given to `var` at declaration
    pub fn var_name(&self, var: Var) -> &str {
        self.check_var(var);
        &self.names[var.index()]
    }

    /// Look up a variable by name
    pub fn find_var(&self, name: &str) -> Option<Var> {
        self.names.iter().position(|n| n == name).map(Var::new)
    }

    #[inline]
    pub fn bdd_true(&self) -> Bdd {
        Bdd::TRUE
    }

    #[inline]
    pub fn bdd_false(&self) -> Bdd {
        Bdd::FALSE
    }

    /// The function that is true exactly when `var` is true
    ///
    /// # Panics
    ///
    /// Panics if `var` was not declared in this manager.
    pub fn var(&mut self, var: Var) -> Bdd {
        self.check_var(var);
        self.mk(var.level(), Bdd::FALSE, Bdd::TRUE)
    }

    /// The function that is true exactly when `var` is false
    ///
    /// # Panics
    ///
    /// Panics if `var` was not declared in this manager.
    pub fn nvar(&mut self, var: Var) -> Bdd {
        self.check_var(var);
        self.mk(var.level(), Bdd::TRUE, Bdd::FALSE)
    }

    /// A single literal
    pub fn literal(&mut self, var: Var, value: bool) -> Bdd {
        if value {
            self.var(var)
        } else {
            self.nvar(var)
        }
    }

    pub fn not(&mut self, f: Bdd) -> Bdd {
        self.ite(f, Bdd::FALSE, Bdd::TRUE)
    }

    pub fn and(&mut self, f: Bdd, g: Bdd) -> Bdd {
        self.ite(f, g, Bdd::FALSE)
    }

    pub fn or(&mut self, f: Bdd, g: Bdd) -> Bdd {
        self.ite(f, Bdd::TRUE, g)
    }

    pub fn xor(&mut self, f: Bdd, g: Bdd) -> Bdd {
        let ng = self.not(g);
        self.ite(f, ng, g)
    }

    /// Conjunction of every function in `fs` (true when empty)
    pub fn and_all(&mut self, fs: impl IntoIterator<Item = Bdd>) -> Bdd {
        let mut acc = Bdd::TRUE;
        for f in fs {
            acc = self.and(acc, f);
            if acc.is_false() {
                break;
            }
        }
        acc
    }

    /// If-then-else: `(f and g) or (not f and h)`
    pub fn ite(&mut self, f: Bdd, g: Bdd, h: Bdd) -> Bdd {
        if f.is_true() || g == h {
            return g;
        }
        if f.is_false() {
            return h;
        }
        if g.is_true() && h.is_false() {
            return f;
        }
        if let Some(&r) = self.ite_cache.get(&(f, g, h)) {
            return r;
        }

        let top = self.level(f).min(self.level(g)).min(self.level(h));
        let (f0, f1) = self.cofactors(f, top);
        let (g0, g1) = self.cofactors(g, top);
        let (h0, h1) = self.cofactors(h, top);
        let low = self.ite(f0, g0, h0);
        let high = self.ite(f1, g1, h1);
        let result = self.mk(top, low, high);

        if self.ite_cache.len() >= ITE_CACHE_LIMIT {
            self.ite_cache.clear();
        }
        self.ite_cache.insert((f, g, h), result);
        result
    }

    /// Conjunction of literals; contradictory literals give false
    pub fn cube(&mut self, literals: &[(Var, bool)]) -> Bdd {
        let mut sorted = literals.to_vec();
        sorted.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        let mut acc = Bdd::TRUE;
        for (var, value) in sorted {
            let lit = self.literal(var, value);
            acc = self.and(acc, lit);
        }
        acc
    }

    /// Substitute constants for the variables in `assignment`
    pub fn restrict(&mut self, f: Bdd, assignment: &[(Var, bool)]) -> Bdd {
        if assignment.is_empty() || f.is_const() {
            return f;
        }
        let values: AHashMap<u32, bool> = assignment
            .iter()
            .map(|&(var, value)| {
                self.check_var(var);
                (var.level(), value)
            })
            .collect();
        let mut memo = AHashMap::new();
        self.restrict_rec(f, &values, &mut memo)
    }

    fn restrict_rec(
        &mut self,
        f: Bdd,
        values: &AHashMap<u32, bool>,
        memo: &mut AHashMap<Bdd, Bdd>,
    ) -> Bdd {
        if f.is_const() {
            return f;
        }
        if let Some(&r) = memo.get(&f) {
            return r;
        }
        let node = self.nodes[f.index()];
        let result = match values.get(&node.level) {
            Some(true) => self.restrict_rec(node.high, values, memo),
            Some(false) => self.restrict_rec(node.low, values, memo),
            None => {
                let low = self.restrict_rec(node.low, values, memo);
                let high = self.restrict_rec(node.high, values, memo);
                self.mk(node.level, low, high)
            }
        };
        memo.insert(f, result);
        result
    }

    /// Rename variables inside this manager
    ///
    /// Variables not mentioned in `pairs` keep their identity. The mapping
    /// does not need to preserve the variable order.
    pub fn rename(&mut self, f: Bdd, pairs: &[(Var, Var)]) -> Bdd {
        if pairs.is_empty() || f.is_const() {
            return f;
        }
        let map: AHashMap<u32, Var> = pairs
            .iter()
            .map(|&(from, to)| {
                self.check_var(from);
                self.check_var(to);
                (from.level(), to)
            })
            .collect();
        let mut memo = AHashMap::new();
        self.rename_rec(f, &map, &mut memo)
    }

    fn rename_rec(
        &mut self,
        f: Bdd,
        map: &AHashMap<u32, Var>,
        memo: &mut AHashMap<Bdd, Bdd>,
    ) -> Bdd {
        if f.is_const() {
            return f;
        }
        if let Some(&r) = memo.get(&f) {
            return r;
        }
        let node = self.nodes[f.index()];
        let low = self.rename_rec(node.low, map, memo);
        let high = self.rename_rec(node.high, map, memo);
        let target = map.get(&node.level).copied().unwrap_or(Var::new(node.level as usize));
        let v = self.var(target);
        let result = self.ite(v, high, low);
        memo.insert(f, result);
        result
    }

    /// Rebuild `f` inside `target`, sending each variable through `map`
    ///
    /// # Panics
    ///
    /// Panics if `map` produces a variable `target` has not declared.
    pub fn copy_into(&self, f: Bdd, target: &mut BddManager, map: impl Fn(Var) -> Var) -> Bdd {
        let mut memo = AHashMap::new();
        self.copy_rec(f, target, &map, &mut memo)
    }

    fn copy_rec(
        &self,
        f: Bdd,
        target: &mut BddManager,
        map: &impl Fn(Var) -> Var,
        memo: &mut AHashMap<Bdd, Bdd>,
    ) -> Bdd {
        if f.is_const() {
            return f;
        }
        if let Some(&r) = memo.get(&f) {
            return r;
        }
        let node = self.nodes[f.index()];
        let low = self.copy_rec(node.low, target, map, memo);
        let high = self.copy_rec(node.high, target, map, memo);
        let v = target.var(map(Var::new(node.level as usize)));
        let result = target.ite(v, high, low);
        memo.insert(f, result);
        result
    }

    /// Variables `f` depends on
    pub fn support(&self, f: Bdd) -> BTreeSet<Var> {
        let mut vars = BTreeSet::new();
        let mut seen = AHashSet::new();
        let mut stack = vec![f];
        while let Some(g) = stack.pop() {
            if g.is_const() || !seen.insert(g) {
                continue;
            }
            let node = self.nodes[g.index()];
            vars.insert(Var::new(node.level as usize));
            stack.push(node.low);
            stack.push(node.high);
        }
        vars
    }

    /// Number of satisfying assignments over the support of `f`
    ///
    /// Constant true counts as one assignment of the empty support.
    pub fn count(&self, f: Bdd) -> BigUint {
        if f.is_false() {
            return BigUint::zero();
        }
        let mut memo = AHashMap::new();
        let below = self.count_rec(f, &mut memo);
        // `below` ranges over every variable from f's level down; scale it
        // to the whole variable set and then back down to the support.
        let total = below << self.level_index(f);
        let free = self.num_vars() - self.support(f).len();
        total >> free
    }

    /// Satisfying assignments over the variables at or below `level(f)`
    fn count_rec(&self, f: Bdd, memo: &mut AHashMap<Bdd, BigUint>) -> BigUint {
        if f.is_false() {
            return BigUint::zero();
        }
        if f.is_true() {
            return BigUint::one();
        }
        if let Some(c) = memo.get(&f) {
            return c.clone();
        }
        let node = self.nodes[f.index()];
        let level = node.level as usize;
        let low = self.count_rec(node.low, memo) << (self.level_index(node.low) - level - 1);
        let high = self.count_rec(node.high, memo) << (self.level_index(node.high) - level - 1);
        let result = low + high;
        memo.insert(f, result.clone());
        result
    }

    /// Evaluate `f` under a full assignment
    pub fn eval(&self, f: Bdd, assignment: impl Fn(Var) -> bool) -> bool {
        let mut g = f;
        while !g.is_const() {
            let node = self.nodes[g.index()];
            g = if assignment(Var::new(node.level as usize)) {
                node.high
            } else {
                node.low
            };
        }
        g.is_true()
    }

    /// Decision nodes reachable from `f`
    pub fn node_count(&self, f: Bdd) -> usize {
        let mut seen = AHashSet::new();
        let mut stack = vec![f];
        while let Some(g) = stack.pop() {
            if g.is_const() || !seen.insert(g) {
                continue;
            }
            let node = self.nodes[g.index()];
            stack.push(node.low);
            stack.push(node.high);
        }
        seen.len()
    }

    /// Decision nodes allocated so far, reachable or not
    pub fn total_nodes(&self) -> usize {
        self.nodes.len() - 2
    }

    /// Drop memoized operation results; nodes are kept
    pub fn clear_cache(&mut self) {
        self.ite_cache.clear();
    }

    fn mk(&mut self, level: u32, low: Bdd, high: Bdd) -> Bdd {
        if low == high {
            return low;
        }
        let node = Node { level, low, high };
        if let Some(&existing) = self.unique.get(&node) {
            return existing;
        }
        let handle = Bdd::from_index(self.nodes.len());
        self.nodes.push(node);
        self.unique.insert(node, handle);
        handle
    }

    #[inline]
    fn level(&self, f: Bdd) -> u32 {
        self.nodes[f.index()].level
    }

    /// Level as a variable position, with terminals below every variable
    #[inline]
    fn level_index(&self, f: Bdd) -> usize {
        if f.is_const() {
            self.num_vars()
        } else {
            self.level(f) as usize
        }
    }

    #[inline]
    fn cofactors(&self, f: Bdd, level: u32) -> (Bdd, Bdd) {
        let node = self.nodes[f.index()];
        if node.level == level && level != TERMINAL_LEVEL {
            (node.low, node.high)
        } else {
            (f, f)
        }
    }

    #[inline]
    fn check_var(&self, var: Var) {
        assert!(
            var.index() < self.names.len(),
            "variable {} is not declared in this manager ({} declared)",
            var,
            self.names.len()
        );
    }
}
