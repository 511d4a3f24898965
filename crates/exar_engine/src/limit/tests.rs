use super::*;
use crate::config::EngineConfig;
use crate::driver::Engine;
use pretty_assertions::assert_eq;
use std::cell::RefCell;

#[derive(Clone, Debug, PartialEq)]
struct Ball {
    /// The precision argument the value was produced for.
    element: Precision,
    error: ErrorBound,
}

impl Ball {
    fn exact(element: Precision) -> Self {
        Ball {
            element,
            error: ErrorBound::ZERO,
        }
    }
}

impl Certified for Ball {
    fn error(&self) -> ErrorBound {
        self.error
    }

    fn with_error(self, error: ErrorBound) -> Self {
        Ball { error, ..self }
    }
}

fn context_at(step: usize) -> IterationContext {
    let mut ctx = IterationContext::new(&EngineConfig::default());
    ctx.begin_round(0, step);
    ctx
}

#[test]
fn limit_runs_single_valued_one_step_finer() {
    let mut ctx = context_at(5);
    let result = limit(&mut ctx, |ctx, p| {
        assert!(ctx.is_single_valued());
        assert_eq!(ctx.step(), 6);
        Ok(Ball::exact(p))
    })
    .unwrap();
    assert_eq!(result.element, Precision(-136));
    assert_eq!(result.error, ErrorBound::power2(-136));
    assert_eq!(ctx.step(), 5);
    assert!(!ctx.is_single_valued());
}

#[test]
fn limit_absorbs_inner_restarts() {
    let mut ctx = context_at(5);
    let steps = RefCell::new(Vec::new());
    let result = limit(&mut ctx, |ctx, p| {
        steps.borrow_mut().push(ctx.step());
        if ctx.step() < 10 {
            return Err(ctx.restart());
        }
        Ok(Ball::exact(p))
    });
    assert!(result.is_ok());
    assert_eq!(*steps.borrow(), vec![6, 8, 10]);
    assert!(!ctx.restart_pending());
    assert_eq!(ctx.stats().local_restarts, 2);
    assert_eq!(ctx.step(), 5);
}

#[test]
fn limit_gives_up_at_the_end_of_the_schedule() {
    let mut ctx = IterationContext::new(&EngineConfig::default());
    let last = ctx.schedule().last_step();
    ctx.begin_round(0, last);
    let result = limit(&mut ctx, |ctx, _| -> Flow<Ball> { Err(ctx.restart()) });
    assert!(matches!(result, Err(Interrupt::Restart(_))));
    assert!(ctx.restart_pending());
}

#[test]
fn limit_keeps_the_enclosing_round_alive() {
    let engine = Engine::default();
    let outcome = engine
        .run(|ctx| {
            limit(ctx, |ctx, p| {
                if ctx.step() < 8 {
                    return Err(ctx.restart());
                }
                Ok(Ball::exact(p))
            })
        })
        .unwrap();
    assert_eq!(outcome.stats.rounds, 1);
    assert_eq!(outcome.stats.local_restarts, 3);
}

#[test]
fn limit_propagates_failures() {
    let mut ctx = context_at(1);
    let result = limit(&mut ctx, |_, _| -> Flow<Ball> {
        Err(crate::errors::division_by_zero().into())
    });
    assert!(matches!(result, Err(Interrupt::Failure(_))));
}

#[test]
fn continuous_limit_accepts_a_precise_first_attempt() {
    let mut ctx = context_at(9);
    let calls = RefCell::new(Vec::new());
    let result = limit_continuous(&mut ctx, ErrorBound::power2(-300), |_, p| {
        calls.borrow_mut().push(p);
        Ok(Ball::exact(p))
    })
    .unwrap();
    assert_eq!(*calls.borrow(), vec![Precision(-242)]);
    assert_eq!(result.error, ErrorBound::power2(-242));
}

#[test]
fn continuous_limit_walks_the_sequence_after_a_failure() {
    let mut ctx = context_at(9);
    let first = ctx.working_precision();
    let calls = RefCell::new(Vec::new());
    let result = limit_continuous(&mut ctx, ErrorBound::ZERO, |ctx, p| {
        calls.borrow_mut().push(p);
        if calls.borrow().len() == 1 {
            return Err(ctx.restart());
        }
        Ok(Ball::exact(p))
    })
    .unwrap();
    assert_eq!(
        *calls.borrow(),
        vec![first, Precision(-46), Precision(-136), Precision(-242)]
    );
    assert_eq!(result.error, ErrorBound::power2(-242));
    assert!(!ctx.restart_pending());
}

#[test]
fn continuous_limit_keeps_the_best_result() {
    let mut ctx = context_at(9);
    let result = limit_continuous(&mut ctx, ErrorBound::ZERO, |ctx, p| {
        if p.satisfies(Precision(-200)) {
            return Err(ctx.restart());
        }
        Ok(Ball::exact(p))
    })
    .unwrap();
    assert_eq!(result.element, Precision(-136));
    assert_eq!(result.error, ErrorBound::power2(-136));
}

#[test]
fn continuous_limit_retries_an_imprecise_first_attempt() {
    let mut ctx = context_at(9);
    let attempts = RefCell::new(Vec::new());
    let result = limit_continuous(&mut ctx, ErrorBound::ZERO, |_, p| {
        let mut attempts = attempts.borrow_mut();
        let error = if attempts.is_empty() {
            ErrorBound::power2(0)
        } else {
            ErrorBound::ZERO
        };
        attempts.push(p);
        Ok(Ball { element: p, error })
    })
    .unwrap();
    let attempts = attempts.into_inner();
    assert_eq!(attempts.first(), Some(&Precision(-242)));
    assert_eq!(attempts.last(), Some(&Precision(-242)));
    assert!(attempts.len() > 2, "{attempts:?}");
    assert_eq!(result.element, Precision(-242));
    assert_eq!(result.error, ErrorBound::power2(-242));
}

#[test]
fn continuous_limit_restarts_when_nothing_works() {
    let mut ctx = context_at(9);
    let result = limit_continuous(&mut ctx, ErrorBound::ZERO, |ctx, _| -> Flow<Ball> {
        Err(ctx.restart())
    });
    assert!(matches!(result, Err(Interrupt::Restart(_))));
    assert!(ctx.restart_pending());
}

#[test]
fn lipschitz_limit_adds_the_propagated_argument_error() {
    let mut ctx = context_at(1);
    let arg = Ball {
        element: Precision(0),
        error: ErrorBound::power2(-60),
    };
    let result = limit_lipschitz(&mut ctx, 3, &arg, |_, p, centre| {
        assert!(centre.error.is_zero());
        Ok(Ball::exact(p))
    })
    .unwrap();
    assert_eq!(result.error, ErrorBound::new(129, -57));
}

#[test]
fn lipschitz_limit_retries_until_precise() {
    let mut ctx = context_at(1);
    let arg = Ball::exact(Precision(0));
    let steps = RefCell::new(Vec::new());
    let result = limit_lipschitz(&mut ctx, 0, &arg, |ctx, p, _| {
        steps.borrow_mut().push(ctx.step());
        let error = if ctx.step() < 4 {
            ErrorBound::power2(-40)
        } else {
            ErrorBound::ZERO
        };
        Ok(Ball { element: p, error })
    })
    .unwrap();
    assert_eq!(*steps.borrow(), vec![2, 4]);
    assert_eq!(result.error, ErrorBound::power2(-50));
}

#[test]
fn multivalued_limit_keeps_its_choice_across_rounds() {
    let mut ctx = context_at(5);
    let seen = RefCell::new(Vec::new());
    let run = |ctx: &mut IterationContext| {
        limit_mv(ctx, ErrorBound::ZERO, |_, p, choice: &mut u32| {
            seen.borrow_mut().push(*choice);
            *choice += 7;
            Ok(Ball::exact(p))
        })
    };
    let first = run(&mut ctx).unwrap();
    assert_eq!(first.element, Precision(-136));
    ctx.begin_round(1, 9);
    let second = run(&mut ctx).unwrap();
    assert_eq!(second.element, Precision(-242));
    assert_eq!(*seen.borrow(), vec![0, 7]);
}

#[test]
fn multivalued_limit_forgets_a_failed_choice() {
    let mut ctx = context_at(5);
    let seen = RefCell::new(Vec::new());
    let run = |ctx: &mut IterationContext, fail: bool| {
        limit_mv(ctx, ErrorBound::ZERO, |ctx, p, choice: &mut u32| {
            seen.borrow_mut().push(*choice);
            *choice = 3;
            if fail {
                return Err(ctx.restart());
            }
            Ok(Ball::exact(p))
        })
    };
    assert!(matches!(run(&mut ctx, true), Err(Interrupt::Restart(_))));
    ctx.begin_round(1, 9);
    run(&mut ctx, false).unwrap();
    // The retry in the first round sees the local choice; the next round
    // starts from the stored default again.
    assert_eq!(*seen.borrow(), vec![0, 3, 0]);
}

#[test]
fn multivalued_limit_inside_a_limit_starts_from_the_default_choice() {
    let mut ctx = context_at(5);
    let seen = RefCell::new(Vec::new());
    for _ in 0..2 {
        ctx.single_valued(|ctx| {
            limit_mv(ctx, ErrorBound::ZERO, |_, p, choice: &mut u32| {
                seen.borrow_mut().push(*choice);
                *choice = 1;
                Ok(Ball::exact(p))
            })
        })
        .unwrap();
    }
    assert_eq!(*seen.borrow(), vec![0, 0]);
}

#[test]
fn lipschitz_limit_restarts_unless_the_argument_is_in_the_domain() {
    let arg = Ball::exact(Precision(0));
    for domain in [Decision::False, Decision::Undecided] {
        let mut ctx = context_at(1);
        let result = limit_lipschitz_on(&mut ctx, 0, |_| domain, &arg, |_, _, _| -> Flow<Ball> {
            panic!("evaluated outside the domain")
        });
        assert!(matches!(result, Err(Interrupt::Restart(_))));
        assert!(ctx.restart_pending());
    }
}

#[test]
fn lipschitz_limit_on_the_domain_evaluates_normally() {
    let mut ctx = context_at(1);
    let arg = Ball {
        element: Precision(0),
        error: ErrorBound::power2(-60),
    };
    let result = limit_lipschitz_on(
        &mut ctx,
        3,
        |arg: &Ball| Decision::from(arg.element == Precision(0)),
        &arg,
        |_, p, _| Ok(Ball::exact(p)),
    )
    .unwrap();
    assert_eq!(result.error, ErrorBound::new(129, -57));
    assert!(!ctx.restart_pending());
}
