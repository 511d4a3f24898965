use super::*;

fn default_schedule() -> PrecisionSchedule {
    PrecisionSchedule::new(-50, 20, 1.25)
}

#[test]
fn first_entries_match_the_reference_table() {
    let s = default_schedule();
    assert_eq!(s.precision(1), Precision(-50));
    assert_eq!(s.precision(2), Precision(-70));
    assert_eq!(s.precision(5), Precision(-136));
    assert_eq!(s.precision(9), Precision(-242));
    assert_eq!(s.precision(25), Precision(-1008));
}

#[test]
fn strictly_decreasing() {
    let s = default_schedule();
    for step in 2..=s.last_step() {
        assert!(
            s.precision(step) < s.precision(step - 1),
            "step {step} does not increase precision"
        );
    }
}

#[test]
fn grows_geometrically_every_four_steps() {
    let s = default_schedule();
    // Ratios of successive 4-step increments approach the factor.
    let gain = |a: usize| {
        f64::from(s.precision(a).exponent() - s.precision(a + 4).exponent())
    };
    let ratio = gain(104) / gain(100);
    assert!((1.2..1.3).contains(&ratio), "ratio {ratio}");
}

#[test]
fn table_stops_before_the_floor() {
    let s = default_schedule();
    assert!(s.len() < SCHEDULE_STEPS);
    assert!(i64::from(s.precision(s.last_step()).exponent()) >= PRECISION_FLOOR);
}

#[test]
fn advance_without_target_takes_one_stride() {
    let s = default_schedule();
    assert_eq!(s.advance(1, None, 5), Some(5));
    assert_eq!(s.advance(5, None, 5), Some(9));
}

#[test]
fn advance_with_target_skips_until_reached() {
    let s = default_schedule();
    // -1000 is reached at step 25, but at most five strides are taken.
    assert_eq!(s.advance(1, Some(Precision(-1000)), 5), Some(21));
    assert_eq!(s.advance(21, Some(Precision(-1000)), 5), Some(25));
    // A target already met only costs one stride.
    assert_eq!(s.advance(1, Some(Precision(-10)), 5), Some(5));
}

#[test]
fn advance_clamps_then_exhausts() {
    let s = default_schedule();
    let last = s.last_step();
    assert_eq!(s.advance(last - 1, None, 5), Some(last));
    assert_eq!(s.advance(last, None, 5), None);
}

#[test]
fn precision_lookup_is_clamped() {
    let s = default_schedule();
    assert_eq!(s.precision(0), s.precision(1));
    assert_eq!(s.precision(10_000), s.precision(s.last_step()));
}

#[test]
fn relaxed_halves_the_step() {
    assert_eq!(PrecisionSchedule::relaxed_step(9), 5);
    assert_eq!(PrecisionSchedule::relaxed_step(1), 1);
}

#[test]
fn huge_factors_end_the_table_early() {
    for factor in [1e300, f64::MAX, f64::INFINITY] {
        let s = PrecisionSchedule::new(-50, 20, factor);
        assert_eq!(s.precision(1), Precision(-50));
        for step in 2..=s.last_step() {
            assert!(s.precision(step).exponent() < s.precision(step - 1).exponent());
        }
    }
}
