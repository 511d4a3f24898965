//! Multi-valued queries.
//!
//! The answer to each of these depends on the approximation it happened to
//! see: `size` of a value near a power of two may come out as `k` in one
//! round and `k + 1` in the next. Results are therefore cached per call
//! site, so every round of an evaluation observes the answer the first
//! successful round produced.

use crate::dyadic::{Dyadic, Rounding};
use crate::real::Real;
use exar_engine::errors::underflow;
use exar_engine::{Certified, ErrorBound, Flow, IterationContext, Precision, SiteKey};

/// A dyadic within `2^p` of `x`.
///
/// Restarts toward a working precision that can deliver `p` when the
/// current approximation is too coarse.
#[track_caller]
pub fn approx_to(ctx: &mut IterationContext, x: &Real, p: i32) -> Flow<Dyadic> {
    approx_at(ctx, SiteKey::caller(), x, p)
}

fn approx_at(ctx: &mut IterationContext, site: SiteKey, x: &Real, p: i32) -> Flow<Dyadic> {
    ctx.memo_at(site, Precision::new(p), |ctx| {
        let a = x.approximate(ctx)?;
        let half = p.saturating_sub(1);
        if ErrorBound::power2(half).less(a.error()) {
            tracing::debug!(approx = %a, p, "approximation too coarse for request");
            return Err(ctx.restart_toward(Precision::new(p.saturating_sub(2))));
        }
        Ok(a.center().round(half, Rounding::Nearest))
    })
}

/// `k` with `2^(k-2) <= |x| <= 2^k`.
///
/// Fails with `Underflow` when `x` is exactly zero.
#[track_caller]
pub fn size(ctx: &mut IterationContext, x: &Real) -> Flow<i32> {
    settled(ctx, SiteKey::caller(), |ctx| {
        let a = x.approximate(ctx)?;
        let Some(k) = a.magnitude() else {
            return Err(underflow().into());
        };
        let floor = &Dyadic::from(a.error()) + &Dyadic::power2(k.saturating_sub(2));
        if a.center().abs() < floor {
            tracing::debug!(approx = %a, k, "size not certain");
            return Err(ctx.restart());
        }
        Ok(k)
    })
}

/// `k` with `|x| <= 2^k`; `i32::MIN` when `x` is exactly zero.
///
/// Never restarts. The bound may be far above `|x|` at a coarse working
/// precision.
#[track_caller]
pub fn upper_bound(ctx: &mut IterationContext, x: &Real) -> Flow<i32> {
    settled(ctx, SiteKey::caller(), |ctx| {
        let a = x.approximate(ctx)?;
        Ok(a.magnitude().unwrap_or(i32::MIN))
    })
}

/// `x` rounded to `digits` decimal places.
#[track_caller]
pub fn to_decimal(ctx: &mut IterationContext, x: &Real, digits: usize) -> Flow<String> {
    // ceil(digits * log2(10)) bits, and two more for the final rounding.
    let bits = i32::try_from(digits.saturating_mul(3322).div_ceil(1000)).unwrap_or(i32::MAX - 2);
    let value = approx_at(ctx, SiteKey::caller(), x, -(bits + 2))?;
    Ok(value.to_decimal(digits))
}

/// Cache a discrete answer at `site` for the rest of the evaluation.
fn settled<T, F>(ctx: &mut IterationContext, site: SiteKey, compute: F) -> Flow<T>
where
    T: Clone + 'static,
    F: FnOnce(&mut IterationContext) -> Flow<T>,
{
    let Some(slot) = ctx.slot::<T>(site) else {
        return compute(ctx);
    };
    if let Some(value) = ctx.request(slot, Precision::EXACT) {
        return Ok(value);
    }
    let value = compute(ctx)?;
    ctx.store(slot, value.clone(), Precision::EXACT);
    Ok(value)
}
