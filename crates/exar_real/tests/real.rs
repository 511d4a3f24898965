#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test code, panics provide clear failure messages"
)]

//! End-to-end evaluations of exact reals.
//!
//! ```bash
//! cargo test -p exar_real --test real
//! ```

use exar_engine::{Certified, Engine, EngineConfig, NumericErrorKind, Precision};
use exar_real::{e, is_less, ln2, pi, to_decimal, Approx, Dyadic, Real};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn decimal(engine: &Engine, x: &Real, digits: usize) -> (String, u32) {
    let outcome = engine.run(|ctx| to_decimal(ctx, x, digits)).unwrap();
    (outcome.value, outcome.stats.rounds)
}

/// `|center * den - num| <= error * den`
fn contains_rational(x: &Approx, num: i64, den: i64) -> bool {
    let den = Dyadic::from(den);
    let distance = (x.center() * &den) - Dyadic::from(num);
    distance.abs() <= &Dyadic::from(x.error()) * &den
}

#[test]
fn third_exceeds_its_decimal_truncation() {
    let engine = Engine::new(
        EngineConfig::default()
            .with_initial_precision(-8)
            .with_precision_increment(4),
    );
    let third = Real::rational(1, 3);
    let truncated: Real = "0.333333".parse().unwrap();
    let outcome = engine.run(|ctx| is_less(ctx, &third, &truncated)).unwrap();
    assert!(!outcome.value);
    assert!(outcome.stats.rounds >= 2);
}

#[test]
fn a_tiny_gap_is_found_by_escalating() {
    let third = Real::rational(1, 3);
    let above = Real::rational(1, 3) + Real::from(1).scale(-55);
    let outcome = Engine::default()
        .run(|ctx| is_less(ctx, &third, &above))
        .unwrap();
    assert!(outcome.value);
    assert!(outcome.stats.rounds >= 2);
    assert!(outcome.stats.final_precision.satisfies(Precision(-56)));
}

#[test]
fn comparing_equal_values_hits_the_ceiling() {
    let engine = Engine::new(EngineConfig::default().with_max_iterations(Some(6)));
    let third = Real::rational(1, 3);
    let sum = Real::rational(1, 6) + Real::rational(1, 6);
    let err = engine.run(|ctx| is_less(ctx, &third, &sum)).unwrap_err();
    assert_eq!(err.kind, NumericErrorKind::IterationCeiling { iterations: 6 });
}

#[test]
fn known_constants_to_twenty_digits() {
    let engine = Engine::default();
    assert_eq!(decimal(&engine, &pi(), 20).0, "3.14159265358979323846");
    assert_eq!(decimal(&engine, &e(), 20).0, "2.71828182845904523536");
    assert_eq!(decimal(&engine, &ln2(), 20).0, "0.69314718055994530942");
    assert_eq!(decimal(&engine, &Real::from(2).sqrt(), 20).0, "1.41421356237309504880");
}

#[test]
fn rounds_grow_logarithmically_with_digits() {
    let engine = Engine::default();
    let x = Real::from(2).sqrt() + pi();
    let (short, short_rounds) = decimal(&engine, &x, 10);
    let (long, long_rounds) = decimal(&engine, &x, 1000);
    assert_eq!(short, "4.5558062160");
    assert!(long.starts_with("4.555806215962888287"));
    assert_eq!(long.len(), 1002);
    assert_eq!(short_rounds, 1);
    assert!(long_rounds <= 6, "{long_rounds} rounds for 1000 digits");
}

#[test]
fn exact_zero_divisor_is_an_error() {
    let x = Real::from(1) / (Real::rational(1, 2) - Real::rational(2, 4));
    let err = Engine::default().run(|ctx| x.approximate(ctx)).unwrap_err();
    assert_eq!(err.kind, NumericErrorKind::DivisionByZero);
}

#[test]
fn deep_graphs_do_not_overflow_the_stack() {
    let mut x = Real::zero();
    for _ in 0..5_000 {
        x = x + Real::from(1);
    }
    let outcome = Engine::default().run(|ctx| x.approximate(ctx)).unwrap();
    assert!(outcome.value.is_exact());
    assert_eq!(outcome.value.center(), &Dyadic::from(5_000));
}

proptest! {
    #[test]
    fn evaluate_certifies_rationals(
        num in -1000i64..1000,
        den in 1i64..1000,
        tolerance in -300i32..-10,
    ) {
        let x = Real::rational(num, den);
        let outcome = Engine::default()
            .evaluate(Precision(tolerance), |ctx| x.approximate(ctx))
            .unwrap();
        prop_assert!(outcome.value.within(Precision(tolerance)));
        prop_assert!(contains_rational(&outcome.value, num, den));
    }
}
