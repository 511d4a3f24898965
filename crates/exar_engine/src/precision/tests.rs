use super::*;

#[test]
fn finer_precision_satisfies_coarser_request() {
    assert!(Precision(-60).satisfies(Precision(-50)));
    assert!(Precision(-50).satisfies(Precision(-50)));
    assert!(!Precision(-40).satisfies(Precision(-50)));
}

#[test]
fn exact_satisfies_everything() {
    assert!(Precision::EXACT.satisfies(Precision(i32::MIN + 1)));
    assert!(Precision::EXACT.satisfies(Precision::COARSEST));
}

#[test]
fn offset_saturates_and_keeps_exact() {
    assert_eq!(Precision(-10).offset(-5), Precision(-15));
    assert_eq!(Precision(i32::MAX - 1).offset(10), Precision(i32::MAX));
    assert_eq!(Precision::EXACT.offset(100), Precision::EXACT);
}

#[test]
fn finer_and_coarser() {
    assert_eq!(Precision(-3).finer(Precision(-7)), Precision(-7));
    assert_eq!(Precision(-3).coarser(Precision(-7)), Precision(-3));
}

#[test]
fn display() {
    assert_eq!(Precision(-50).to_string(), "2^(-50)");
    assert_eq!(Precision::EXACT.to_string(), "exact");
}

#[test]
fn default_policy_is_relative() {
    assert_eq!(PrecisionPolicy::default(), PrecisionPolicy::Relative);
}
