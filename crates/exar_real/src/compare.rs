//! Comparisons.
//!
//! The functions here return a [`Decision`] computed at the current working
//! precision. Branching code resolves a decision through the context (see
//! [`is_less`]), which restarts the round when the answer is not yet
//! certain.

use crate::dyadic::Dyadic;
use crate::real::Real;
use exar_engine::{Certified, Decision, Flow, IterationContext};

/// Whether `a < b`.
///
/// Definite once the approximation balls are disjoint; an exact tie is
/// `False`.
pub fn compare_less(ctx: &mut IterationContext, a: &Real, b: &Real) -> Flow<Decision> {
    let approx = Real::approximate_all(ctx, &[a, b])?;
    let (a, b) = (&approx[0], &approx[1]);
    Ok(if a.upper() < b.lower() {
        Decision::True
    } else if a.lower() >= b.upper() {
        Decision::False
    } else {
        Decision::Undecided
    })
}

/// Whether `x > 0`, with tolerance `2^k`.
///
/// May answer either way when `|x| <= 2^k`. Undecided only when the
/// current approximation cannot tell and its radius exceeds `2^k`.
pub fn positive(ctx: &mut IterationContext, x: &Real, k: i32) -> Flow<Decision> {
    let a = x.approximate(ctx)?;
    let radius = Dyadic::from(a.error());
    let center = a.center();
    if Dyadic::power2(k) < radius && center.abs() < radius {
        tracing::debug!(approx = %a, k, "insufficient precision for sign test");
        return Ok(Decision::Undecided);
    }
    Ok(Decision::from(center.is_positive()))
}

/// Whether `|x| < 2^k`, with slack down to `2^(k-1)`.
///
/// `True` guarantees `|x| < 2^k`; `False` guarantees `|x| >= 2^(k-1)`
/// up to the rounding of the approximation's centre.
pub fn bound(ctx: &mut IterationContext, x: &Real, k: i32) -> Flow<Decision> {
    let a = x.approximate(ctx)?;
    let radius = Dyadic::from(a.error());
    let size = a.center().abs();
    let limit = Dyadic::power2(k);
    if size < &radius + &Dyadic::power2(k.saturating_sub(1)) && limit < &size + &radius {
        tracing::debug!(approx = %a, k, "insufficient precision for bound test");
        return Ok(Decision::Undecided);
    }
    Ok(Decision::from(size < limit))
}

/// `a < b` as a boolean, restarting the round while undecided.
///
/// The answer is cached at the caller's site for the rest of the
/// evaluation.
#[track_caller]
pub fn is_less(ctx: &mut IterationContext, a: &Real, b: &Real) -> Flow<bool> {
    ctx.resolve_with(|ctx| compare_less(ctx, a, b))
}
