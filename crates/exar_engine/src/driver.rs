//! The iteration driver.
//!
//! [`Engine`] runs a computation body in rounds. Each round positions the
//! iteration context on a schedule step and calls the body once:
//!
//! - a normal return that is accurate enough ends the evaluation,
//! - a restart (or a result that is too imprecise) moves to a finer step and
//!   runs the body again, reusing the cache registry,
//! - a numeric failure ends the evaluation with that error.
//!
//! An evaluation also fails once the configured iteration ceiling is reached
//! or the schedule has no finer step left. Restarts never escape: the public
//! API only reports [`NumericError`]s.

use crate::bound::Certified;
use crate::config::EngineConfig;
use crate::context::IterationContext;
use crate::errors::{iteration_ceiling, precision_exhausted, NumericError};
use crate::precision::Precision;
use crate::schedule::PrecisionSchedule;
use crate::signal::{Flow, Interrupt};
use crate::stats::EvalStats;
use std::sync::Arc;

/// Result of a successful evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub stats: EvalStats,
}

/// Runs top-level evaluations.
///
/// Cheap to clone and safe to share between threads; every evaluation gets
/// its own [`IterationContext`].
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
    schedule: Arc<PrecisionSchedule>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let schedule = Arc::new(config.schedule());
        Engine { config, schedule }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn schedule(&self) -> &PrecisionSchedule {
        &self.schedule
    }

    /// Run `body` until it returns without restarting.
    pub fn run<T, F>(&self, body: F) -> Result<Outcome<T>, NumericError>
    where
        F: FnMut(&mut IterationContext) -> Flow<T>,
    {
        self.drive(body, |_, _| None)
    }

    /// Run `body` until it returns a result whose certified error is at most
    /// `2^tolerance`.
    ///
    /// A result that is too imprecise counts as a restart, with the next
    /// round aimed at the working precision the missing bits call for.
    pub fn evaluate<R, F>(&self, tolerance: Precision, body: F) -> Result<Outcome<R>, NumericError>
    where
        R: Certified,
        F: FnMut(&mut IterationContext) -> Flow<R>,
    {
        self.drive(body, |ctx, result: &R| {
            if result.within(tolerance) {
                return None;
            }
            let missing = result
                .error()
                .exponent_bound()
                .saturating_sub(tolerance.exponent());
            tracing::debug!(
                error = %result.error(),
                %tolerance,
                missing,
                "result too imprecise"
            );
            Some(ctx.working_precision().offset(missing.saturating_neg()))
        })
    }

    /// The round loop.
    ///
    /// `refine` inspects a normal return: `None` accepts it, `Some(target)`
    /// discards it and asks for another round at precision `target` or finer.
    #[tracing::instrument(level = "debug", skip_all)]
    fn drive<T, F, A>(&self, mut body: F, mut refine: A) -> Result<Outcome<T>, NumericError>
    where
        F: FnMut(&mut IterationContext) -> Flow<T>,
        A: FnMut(&IterationContext, &T) -> Option<Precision>,
    {
        let mut ctx = IterationContext::with_schedule(
            Arc::clone(&self.schedule),
            self.config.start_step,
            self.config.policy,
        );
        let mut step = ctx.step();
        let mut iteration: u32 = 0;

        let result = loop {
            ctx.begin_round(iteration, step);
            tracing::debug!(
                iteration,
                step,
                precision = %ctx.working_precision(),
                "starting round"
            );

            let target = match body(&mut ctx) {
                Ok(value) => match refine(&ctx, &value) {
                    None => {
                        tracing::debug!(iteration, step, "round succeeded");
                        break Ok(value);
                    }
                    Some(target) => Some(target),
                },
                Err(Interrupt::Restart(_)) => {
                    let target = ctx.precision_target();
                    tracing::debug!(iteration, step, target = ?target, "round restarted");
                    target
                }
                Err(Interrupt::Failure(error)) => {
                    tracing::debug!(iteration, step, %error, "round failed");
                    break Err(error);
                }
            };

            ctx.end_restarted_round();
            iteration += 1;
            if let Some(max) = self.config.max_iterations {
                if iteration >= max {
                    tracing::warn!(iterations = iteration, "iteration ceiling reached");
                    break Err(iteration_ceiling(iteration));
                }
            }
            match self.schedule.advance(step, target, self.config.precision_skip) {
                Some(next) => step = next,
                None => {
                    tracing::warn!(step, "precision schedule exhausted");
                    break Err(precision_exhausted(step));
                }
            }
        };

        let stats = ctx.finish();
        result.map(|value| Outcome { value, stats })
    }
}
