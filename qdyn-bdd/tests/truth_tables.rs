//! Decision diagrams checked against brute-force truth tables

use num_bigint::BigUint;
use qdyn_bdd::{Bdd, BddManager, Var};

const VARS: usize = 4;

fn assignments() -> impl Iterator<Item = [bool; VARS]> {
    (0..1u32 << VARS).map(|bits| std::array::from_fn(|i| bits >> i & 1 == 1))
}

/// `(x0 ∧ x1) ⊕ (x2 ∨ ¬x3)` and its truth table
fn sample(m: &mut BddManager) -> (Bdd, impl Fn(&[bool; VARS]) -> bool) {
    let x: Vec<Bdd> = (0..VARS).map(|i| m.var(Var::new(i))).collect();
    let left = m.and(x[0], x[1]);
    let not3 = m.not(x[3]);
    let right = m.or(x[2], not3);
    let f = m.xor(left, right);
    (f, |a: &[bool; VARS]| (a[0] && a[1]) ^ (a[2] || !a[3]))
}

#[test]
fn test_eval_matches_truth_table() {
    let mut m = BddManager::with_vars(VARS, "x");
    let (f, table) = sample(&mut m);
    for a in assignments() {
        assert_eq!(m.eval(f, |v| a[v.index()]), table(&a), "assignment {a:?}");
    }
}

#[test]
fn test_count_matches_brute_force() {
    let mut m = BddManager::with_vars(VARS, "x");
    let (f, table) = sample(&mut m);
    let brute = assignments().filter(|a| table(a)).count();

    let free = VARS - m.support(f).len();
    assert_eq!(m.count(f) << free, BigUint::from(brute));
}

#[test]
fn test_count_scales_with_unused_variables() {
    let mut m = BddManager::with_vars(VARS, "x");
    let x0 = m.var(Var::new(0));
    let x2 = m.var(Var::new(2));
    let f = m.and(x0, x2);
    assert_eq!(m.count(f), BigUint::from(1u32));
    assert_eq!(m.count(f) << (VARS - 2), BigUint::from(4u32));
}

#[test]
fn test_equivalent_constructions_share_handles() {
    let mut m = BddManager::with_vars(VARS, "x");
    let (f, _) = sample(&mut m);

    // the same function through ite and De Morgan
    let x: Vec<Bdd> = (0..VARS).map(|i| m.var(Var::new(i))).collect();
    let left = m.ite(x[0], x[1], Bdd::FALSE);
    let n2 = m.not(x[2]);
    let both = m.and(n2, x[3]);
    let right = m.not(both);
    let g = m.xor(left, right);
    assert_eq!(f, g);
}

#[test]
fn test_restrict_matches_truth_table() {
    let mut m = BddManager::with_vars(VARS, "x");
    let (f, table) = sample(&mut m);
    let fixed = m.restrict(f, &[(Var::new(1), true), (Var::new(3), false)]);
    for a in assignments() {
        let mut forced = a;
        forced[1] = true;
        forced[3] = false;
        assert_eq!(m.eval(fixed, |v| a[v.index()]), table(&forced));
    }
}

#[test]
fn test_rename_reverses_variable_order() {
    let mut m = BddManager::with_vars(VARS, "x");
    let (f, table) = sample(&mut m);
    let pairs: Vec<(Var, Var)> = (0..VARS)
        .map(|i| (Var::new(i), Var::new(VARS - 1 - i)))
        .collect();
    let reversed = m.rename(f, &pairs);
    for a in assignments() {
        let mut mirrored = a;
        mirrored.reverse();
        assert_eq!(m.eval(reversed, |v| a[v.index()]), table(&mirrored));
    }
}
