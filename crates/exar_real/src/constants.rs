//! Constants defined as limits.
//!
//! Each constant is a [`Real`] whose approximation function sums a series
//! in fixed point: integers scaled by `2^w`, where `w` exceeds the
//! requested precision by enough guard bits to absorb the truncation of
//! every term. The returned ball carries the accumulated truncation error,
//! so it contains the constant itself.

use crate::approx::Approx;
use crate::dyadic::Dyadic;
use crate::real::Real;
use exar_engine::{ErrorBound, Flow, IterationContext, Precision, SiteKey};
use num_bigint::BigInt;
use num_traits::{One, Zero};

/// `pi`, from Machin's formula `pi = 16 atan(1/5) - 4 atan(1/239)`.
pub fn pi() -> Real {
    Real::named_limit(SiteKey::named("pi"), |_: &mut IterationContext, p| pi_approx(p))
}

/// Euler's number, `sum 1/k!`.
pub fn e() -> Real {
    Real::named_limit(SiteKey::named("e"), |_: &mut IterationContext, p| e_approx(p))
}

/// `ln 2 = sum 1/(k 2^k)` over `k >= 1`.
pub fn ln2() -> Real {
    Real::named_limit(SiteKey::named("ln2"), |_: &mut IterationContext, p| ln2_approx(p))
}

/// Fixed-point scale for precision `p`: `-p` plus guard bits that grow with
/// the number of series terms.
fn scale_bits(p: Precision) -> u32 {
    let bits = p.exponent().saturating_neg().max(0).unsigned_abs();
    bits + 12 + (u32::BITS - bits.leading_zeros())
}

fn fixed(mantissa: BigInt, w: u32, ulps: u64) -> Approx {
    let exponent = -i32::try_from(w).unwrap_or(i32::MAX);
    Approx::new(
        Dyadic::new(mantissa, exponent),
        ErrorBound::new(ulps, exponent),
    )
}

fn pi_approx(p: Precision) -> Flow<Approx> {
    let w = scale_bits(p);
    let (a, a_ulps) = atan_inverse(5, w);
    let (b, b_ulps) = atan_inverse(239, w);
    let sum = a * 16u32 - b * 4u32;
    Ok(fixed(sum, w, 16 * a_ulps + 4 * b_ulps))
}

/// `atan(1/n) * 2^w`, with its error in units of `2^-w`.
fn atan_inverse(n: u32, w: u32) -> (BigInt, u64) {
    let n = BigInt::from(n);
    let n2 = &n * &n;
    let mut power = (BigInt::one() << w) / &n;
    let mut sum = power.clone();
    let mut terms: u64 = 0;
    loop {
        power /= &n2;
        if power.is_zero() {
            break;
        }
        terms += 1;
        let term = &power / (2 * terms + 1);
        if terms % 2 == 1 {
            sum -= term;
        } else {
            sum += term;
        }
    }
    // Each term is off by less than 2; the tail is below the vanished power.
    (sum, 2 * terms + 3)
}

fn e_approx(p: Precision) -> Flow<Approx> {
    let w = scale_bits(p);
    let mut term = BigInt::one() << w;
    let mut sum = term.clone();
    let mut k: u64 = 1;
    while !term.is_zero() {
        term /= k;
        sum += &term;
        k += 1;
    }
    // Truncation below 2 per term, plus a tail of at most twice the last
    // true term.
    Ok(fixed(sum, w, 2 * k + 4))
}

fn ln2_approx(p: Precision) -> Flow<Approx> {
    let w = scale_bits(p);
    let one = BigInt::one() << w;
    let mut sum = BigInt::zero();
    for k in 1..=w {
        sum += (&one >> k) / k;
    }
    // One ulp per term and at most one for the tail beyond k = w.
    Ok(fixed(sum, w, u64::from(w) + 1))
}
