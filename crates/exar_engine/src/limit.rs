//! Limit operators.
//!
//! A limit operator computes a value `y` from a family of approximations
//! `f(p)` with `|f(p) - y| <= 2^p`. It runs `f` in a single-valued scope one
//! schedule step finer than the caller and absorbs restarts raised by `f`
//! itself, raising its own local precision instead of restarting the whole
//! round. The result's error bound is widened to cover the distance between
//! `f(p)` and the limit.
//!
//! Three variants cover the usual situations:
//!
//! | operator | arguments of `f` | strategy |
//! |---|---|---|
//! | [`limit`] | exact (discrete) | retry two steps finer until `f` succeeds |
//! | [`limit_continuous`] | approximate | try the caller's precision, fall back to the full precision sequence, keep the best |
//! | [`limit_mv`] | approximate, `f` picks among several answers | as [`limit_continuous`], keeping `f`'s choice across rounds |
//! | [`limit_lipschitz`] | approximate, `f` Lipschitz | evaluate on the exact centre, add the propagated argument error |
//! | [`limit_lipschitz_on`] | as above, on a restricted domain | restart unless the argument is certainly in the domain |

use crate::bound::{Certified, ErrorBound};
use crate::cache::SiteKey;
use crate::context::IterationContext;
use crate::decision::Decision;
use crate::errors::limit_diverged;
use crate::precision::Precision;
use crate::signal::{Flow, Interrupt};

/// Limit of `f(ctx, p)` as `p` goes to minus infinity, for `f` whose
/// inputs are exact.
///
/// `f` is called with `p` equal to the caller's working precision `P`. If
/// it restarts, it is retried two schedule steps finer. The result carries
/// `f`'s own error plus `2^P`.
pub fn limit<R, F>(ctx: &mut IterationContext, mut f: F) -> Flow<R>
where
    R: Certified,
    F: FnMut(&mut IterationContext, Precision) -> Flow<R>,
{
    let target = ctx.working_precision();
    let mut step = ctx.step() + 1;
    let result = ctx.single_valued(|ctx| -> Flow<R> {
        loop {
            match ctx.at_step(step, |ctx| f(ctx, target)) {
                Ok(result) => break Ok(result),
                Err(Interrupt::Restart(_)) => step = raise_local_step(ctx, step, "limit")?,
                Err(failure) => break Err(failure),
            }
        }
    })?;
    let error = result.error().add_power2(target.exponent());
    tracing::trace!(%error, "limit done");
    Ok(result.with_error(error))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    /// Trying `f` at the caller's precision.
    First,
    /// The first attempt failed; starting over from the coarsest precision.
    Fallback,
    /// At least one result is in hand; refining it.
    Refining,
}

/// Limit of `f(ctx, p)` for `f` whose inputs are themselves approximations
/// with combined error `args_error`.
///
/// The first attempt uses the caller's precision `P`. If it fails, or
/// returns something so imprecise that the arguments cannot be to blame,
/// the operator walks the precision sequence from its coarse end up to `P`
/// and keeps the most accurate result. Once a result is in hand, a failing
/// attempt ends the walk. If even the coarsest attempt fails the enclosing
/// round is restarted so the arguments get more precise.
pub fn limit_continuous<R, F>(
    ctx: &mut IterationContext,
    args_error: ErrorBound,
    mut f: F,
) -> Flow<R>
where
    R: Certified,
    F: FnMut(&mut IterationContext, Precision) -> Flow<R>,
{
    let saved = ctx.step();
    let target = ctx.working_precision();
    let previous = if saved > 1 {
        ctx.schedule().precision(saved - 1)
    } else {
        Precision::COARSEST
    };
    let args_exponent = args_error.exponent_bound();
    let last = ctx.schedule().last_step();
    let restart_element = ctx.schedule().precision(1).offset(4);

    let mut element = target;
    let mut element_step = saved;
    let mut phase = Phase::First;
    let mut best: Option<(R, ErrorBound)> = None;

    ctx.single_valued(|ctx| {
        ctx.stiff(1, |ctx| -> Flow<()> {
            loop {
                match f(ctx, element) {
                    Ok(candidate) => {
                        let error = candidate.error().add_power2(element.exponent());
                        let bits = error.exponent_bound();
                        if phase == Phase::First
                            && bits > previous.exponent()
                            && bits > args_exponent.saturating_sub(previous.exponent())
                        {
                            tracing::debug!(%error, "limit not precise enough, walking the precision sequence");
                            element_step = 1;
                            element = restart_element;
                            phase = Phase::Fallback;
                        }
                        let improves = best.as_ref().map_or(true, |(_, e)| error.less(*e));
                        if phase != Phase::Refining || improves {
                            best = Some((candidate, error));
                        } else {
                            tracing::trace!(%error, "limit attempt brought no improvement");
                        }
                        phase = Phase::Refining;
                    }
                    Err(Interrupt::Restart(_)) => {
                        ctx.absorb_restart();
                        match phase {
                            Phase::Refining => {
                                tracing::debug!("limit attempt failed, using best result");
                                return Ok(());
                            }
                            Phase::First => {
                                tracing::debug!("limit attempt failed, walking the precision sequence");
                                element_step = 1;
                                element = restart_element;
                                phase = Phase::Fallback;
                                continue;
                            }
                            Phase::Fallback => {
                                tracing::debug!("limit failed at every precision");
                                return Err(ctx.restart());
                            }
                        }
                    }
                    Err(failure) => return Err(failure),
                }
                if element.satisfies(target) || element_step >= last {
                    return Ok(());
                }
                element_step += 4;
                element = ctx.schedule().precision(element_step);
            }
        })
    })?;

    match best {
        Some((result, error)) => {
            tracing::trace!(%error, "continuous limit done");
            Ok(result.with_error(error))
        }
        None => Err(limit_diverged().into()),
    }
}

/// [`limit_continuous`] for a multi-valued `f`.
///
/// `f` may pick among several valid answers and records which one in
/// `choice`. The choice lives in a cache slot at the caller's site: every
/// later round of the evaluation starts from the choice of the last
/// successful attempt, so all rounds converge to the same answer. Nested
/// inside another limit there is no slot and every call starts from
/// `D::default()`.
#[track_caller]
pub fn limit_mv<D, R, F>(ctx: &mut IterationContext, args_error: ErrorBound, mut f: F) -> Flow<R>
where
    D: Clone + Default + 'static,
    R: Certified,
    F: FnMut(&mut IterationContext, Precision, &mut D) -> Flow<R>,
{
    let slot = ctx.slot::<D>(SiteKey::caller());
    let mut choice = match slot {
        Some(slot) => match ctx.request(slot, Precision::EXACT) {
            Some(choice) => choice,
            None => {
                let choice = D::default();
                ctx.store(slot, choice.clone(), Precision::EXACT);
                choice
            }
        },
        None => D::default(),
    };
    limit_continuous(ctx, args_error, |ctx, p| {
        let result = f(ctx, p, &mut choice)?;
        if let Some(slot) = slot {
            ctx.store(slot, choice.clone(), Precision::EXACT);
        }
        Ok(result)
    })
}

/// Limit of a function with Lipschitz constant `2^lip` around `arg`.
///
/// `f` receives the caller's precision `P` and `arg` with its error
/// dropped. It is retried two steps finer until it succeeds with an error
/// of at most `2^P`. The argument's error enters the result once, as
/// `arg_error * 2^lip`, on top of `2^P`.
pub fn limit_lipschitz<A, R, F>(
    ctx: &mut IterationContext,
    lip: i32,
    arg: &A,
    mut f: F,
) -> Flow<R>
where
    A: Certified + Clone,
    R: Certified,
    F: FnMut(&mut IterationContext, Precision, &A) -> Flow<R>,
{
    let arg_error = arg.error();
    let centre = arg.clone().with_error(ErrorBound::ZERO);
    let target = ctx.working_precision();
    let mut step = ctx.step() + 1;

    let result = ctx.single_valued(|ctx| -> Flow<R> {
        loop {
            match ctx.at_step(step, |ctx| f(ctx, target, &centre)) {
                Ok(result) if result.within(target) => break Ok(result),
                Ok(result) => {
                    tracing::trace!(error = %result.error(), "lipschitz limit too imprecise");
                    step = raise_local_step(ctx, step, "lipschitz limit")?;
                }
                Err(Interrupt::Restart(_)) => step = raise_local_step(ctx, step, "lipschitz limit")?,
                Err(failure) => break Err(failure),
            }
        }
    })?;

    let error = result.error().add_power2(target.exponent()) + (arg_error << lip);
    Ok(result.with_error(error))
}

/// [`limit_lipschitz`] for `f` defined only on part of its argument type.
///
/// The round is restarted unless `on_domain(arg)` is certainly true; an
/// argument too imprecise to place inside the domain needs a finer round,
/// and an argument outside it must not reach `f`.
pub fn limit_lipschitz_on<A, R, D, F>(
    ctx: &mut IterationContext,
    lip: i32,
    on_domain: D,
    arg: &A,
    f: F,
) -> Flow<R>
where
    A: Certified + Clone,
    R: Certified,
    D: FnOnce(&A) -> Decision,
    F: FnMut(&mut IterationContext, Precision, &A) -> Flow<R>,
{
    let domain = on_domain(arg);
    if domain != Decision::True {
        tracing::debug!(?domain, "lipschitz limit argument not known to be in the domain");
        return Err(ctx.restart());
    }
    limit_lipschitz(ctx, lip, arg, f)
}

/// Two steps finer than `step`, or a restart of the enclosing round when the
/// schedule has nothing finer to offer.
fn raise_local_step(ctx: &mut IterationContext, step: usize, operator: &str) -> Flow<usize> {
    if step >= ctx.schedule().last_step() {
        return Err(ctx.restart());
    }
    if ctx.restart_pending() {
        ctx.absorb_restart();
    }
    let next = step + 2;
    tracing::debug!(
        operator,
        step = next,
        precision = %ctx.schedule().precision(next),
        "increasing precision locally"
    );
    Ok(next)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
