//! Exact integer helpers for turning digit vectors into numbers

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};
use qdyn_bdd::Bdd;

/// Fractional bits used when evaluating `(t + √2·s) / 2^k`
pub(crate) const FIXED_POINT_BITS: usize = 512;

/// Two's-complement value of fully restricted digits
///
/// Every digit must be a constant.
pub(crate) fn digits_value(digits: &[Bdd]) -> BigInt {
    let r = digits.len();
    let mut value = BigInt::zero();
    for (i, d) in digits.iter().enumerate() {
        if d.is_true() {
            let weight = BigInt::from(1u8) << i;
            if i + 1 == r {
                value -= weight;
            } else {
                value += weight;
            }
        }
    }
    value
}

/// Weight of digit `i` in an `r`-digit two's-complement number
pub(crate) fn digit_weight(i: usize, r: usize) -> BigInt {
    let weight = BigInt::from(1u8) << i;
    if i + 1 == r {
        -weight
    } else {
        weight
    }
}

/// `value · 2^exp` as a float, without overflowing on huge operands
pub(crate) fn ldexp(value: &BigInt, exp: i64) -> f64 {
    if value.is_zero() {
        return 0.0;
    }
    let bits = value.bits() as i64;
    let excess = (bits - 64).max(0);
    let mantissa = (value >> excess as usize).to_f64().unwrap_or(0.0);
    let exp = (exp + excess).clamp(-4000, 4000) as i32;
    let half = exp / 2;
    mantissa * 2f64.powi(half) * 2f64.powi(exp - half)
}

/// Whether `t + √2·s` is exactly zero
pub(crate) fn is_exact_zero(t: &BigInt, s: &BigInt) -> bool {
    if t.is_zero() && s.is_zero() {
        return true;
    }
    let opposite = matches!(
        (t.sign(), s.sign()),
        (Sign::Plus, Sign::Minus) | (Sign::Minus, Sign::Plus)
    );
    opposite && t * t == s * s * 2u8
}

/// `|t + √2·s| / 2^k`, accurate well below the smallest `f64` step at 1
pub(crate) fn sqrt2_combination(t: &BigInt, s: &BigInt, k: i32) -> f64 {
    let p = FIXED_POINT_BITS;
    // floor(√2·|s|·2^p)
    let s_mag: &BigUint = s.magnitude();
    let root = ((s_mag * s_mag) << (2 * p + 1)).sqrt();
    let scaled_s = BigInt::from_biguint(s.sign(), root);
    let numerator: BigInt = (t << p) + scaled_s;
    let magnitude = BigInt::from(numerator.magnitude().clone());
    ldexp(&magnitude, -(p as i64) - i64::from(k))
}
