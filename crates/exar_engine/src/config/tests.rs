use super::*;
use pretty_assertions::assert_eq;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn defaults() {
    let c = EngineConfig::default();
    assert_eq!(c.initial_precision, -50);
    assert_eq!(c.precision_increment, 20);
    assert_eq!(c.precision_skip, 5);
    assert_eq!(c.start_step, 1);
    assert_eq!(c.max_iterations, Some(64));
}

#[test]
fn recognised_options_are_consumed() {
    let mut a = args(&[
        "sqrt",
        "--prec_init=-30",
        "2",
        "--prec_inc=10",
        "--prec_factor=2.0",
        "--prec_skip=3",
        "--prec_start=2",
        "--max_iter=9",
        "-d",
        "--digits=40",
    ]);
    let c = EngineConfig::from_args(&mut a).unwrap();
    assert_eq!(a, args(&["sqrt", "2", "--digits=40"]));
    assert_eq!(c.initial_precision, -30);
    assert_eq!(c.precision_increment, 10);
    assert!((c.precision_factor - 2.0).abs() < f64::EPSILON);
    assert_eq!(c.precision_skip, 3);
    assert_eq!(c.start_step, 2);
    assert_eq!(c.max_iterations, Some(9));
    assert_eq!(c.debug, 1);
}

#[test]
fn zero_max_iter_is_unbounded() {
    let mut a = args(&["--max_iter=0"]);
    let c = EngineConfig::from_args(&mut a).unwrap();
    assert_eq!(c.max_iterations, None);
}

#[test]
fn out_of_range_values_are_ignored() {
    let mut a = args(&["--prec_inc=-5", "--prec_factor=0.5", "--prec_skip=0"]);
    let c = EngineConfig::from_args(&mut a).unwrap();
    assert!(a.is_empty());
    assert_eq!(c, EngineConfig::default());
}

#[test]
fn malformed_numbers_are_errors() {
    let mut a = args(&["--prec_init=abc"]);
    let err = EngineConfig::from_args(&mut a).unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidNumber {
            option: "--prec_init".into(),
            value: "abc".into()
        }
    );
    assert_eq!(
        err.to_string(),
        "invalid value `abc` for option `--prec_init`"
    );
}

#[test]
fn builder_rejects_degenerate_schedules() {
    let c = EngineConfig::default()
        .with_precision_increment(0)
        .with_precision_factor(1.0);
    assert_eq!(c.precision_increment, 20);
    assert!((c.precision_factor - 1.25).abs() < f64::EPSILON);
}

#[test]
fn usage_lists_every_option() {
    let text = EngineConfig::usage();
    for opt in [
        "--prec_init",
        "--prec_inc",
        "--prec_factor",
        "--prec_skip",
        "--prec_start",
        "--max_iter",
        "--debug",
    ] {
        assert!(text.contains(opt), "missing {opt}");
    }
}

#[test]
fn unusable_factors_keep_the_default() {
    for factor in ["inf", "NaN", "1e300", "17"] {
        let mut a = args(&[&format!("--prec_factor={factor}")]);
        let c = EngineConfig::from_args(&mut a).unwrap();
        assert!((c.precision_factor - 1.25).abs() < f64::EPSILON, "{factor}");
        assert!(a.is_empty());
    }
    for factor in [f64::MAX, f64::INFINITY, f64::NAN] {
        let c = EngineConfig::default().with_precision_factor(factor);
        assert!((c.precision_factor - 1.25).abs() < f64::EPSILON, "{factor}");
    }
    let c = EngineConfig::default().with_precision_factor(MAX_PRECISION_FACTOR);
    assert!((c.precision_factor - MAX_PRECISION_FACTOR).abs() < f64::EPSILON);
}
