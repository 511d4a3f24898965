use super::*;
use pretty_assertions::assert_eq;

fn d(mantissa: i64, exponent: i32) -> Dyadic {
    Dyadic::new(BigInt::from(mantissa), exponent)
}

#[test]
fn normalizes_trailing_zeros() {
    assert_eq!(d(12, 0), d(3, 2));
    assert_eq!(d(12, 0).exponent(), 2);
    assert_eq!(d(0, 17), Dyadic::zero());
}

#[test]
fn exact_arithmetic() {
    let half = d(1, -1);
    let three = Dyadic::from(3);
    assert_eq!(&half + &three, d(7, -1));
    assert_eq!(&half - &three, d(-5, -1));
    assert_eq!(&half * &three, d(3, -1));
    assert_eq!(-half.clone(), d(-1, -1));
    assert_eq!(&half - &half, Dyadic::zero());
}

#[test]
fn ordering() {
    assert!(d(1, -1) < d(3, -2));
    assert!(d(-1, 10) < d(1, -10));
    assert_eq!(d(5, -3).cmp(&d(10, -4)), Ordering::Equal);
}

#[test]
fn floor_log2() {
    assert_eq!(Dyadic::from(1).floor_log2(), Some(0));
    assert_eq!(Dyadic::from(-7).floor_log2(), Some(2));
    assert_eq!(d(3, -10).floor_log2(), Some(-9));
    assert_eq!(Dyadic::zero().floor_log2(), None);
}

#[test]
fn directed_rounding() {
    // 11/8 = 1.375
    let x = d(11, -3);
    assert_eq!(x.round(-1, Rounding::Floor), d(1, 0));
    assert_eq!(x.round(-1, Rounding::Ceil), d(3, -1));
    assert_eq!(x.round(-1, Rounding::Nearest), d(3, -1));
    assert_eq!((-x.clone()).round(-1, Rounding::Floor), d(-3, -1));
    assert_eq!((-x).round(-1, Rounding::Ceil), d(-1, 0));
    // Already coarse enough.
    assert_eq!(d(3, 4).round(0, Rounding::Floor), d(3, 4));
}

#[test]
fn division_brackets_the_quotient() {
    let one = Dyadic::from(1);
    let three = Dyadic::from(3);
    let lo = one.div_rounded(&three, -20, Rounding::Floor);
    let hi = one.div_rounded(&three, -20, Rounding::Ceil);
    assert!(&lo * &three < one);
    assert!(&hi * &three > one);
    assert_eq!(&hi - &lo, Dyadic::power2(-20));

    let neg = (-one).div_rounded(&three, -20, Rounding::Floor);
    assert_eq!(neg, -hi);
}

#[test]
fn division_by_negative_divisor() {
    let q = Dyadic::from(7).div_rounded(&Dyadic::from(-2), 0, Rounding::Floor);
    assert_eq!(q, Dyadic::from(-4));
    let q = Dyadic::from(7).div_rounded(&Dyadic::from(-2), 0, Rounding::Ceil);
    assert_eq!(q, Dyadic::from(-3));
}

#[test]
fn square_root_floor() {
    let two = Dyadic::from(2);
    let r = two.sqrt_floor(-30);
    assert!(&r * &r <= two);
    let next = &r + &Dyadic::power2(-30);
    assert!(&next * &next > two);
    assert_eq!(Dyadic::from(16).sqrt_floor(0), Dyadic::from(4));
}

#[test]
fn magnitude_bound_is_an_upper_bound() {
    let x = d(-5, -3);
    assert_eq!(x.magnitude_bound(), ErrorBound::new(5, -3));
    let big = Dyadic::new((BigInt::one() << 100u32) + 1u32, 0);
    let bound = Dyadic::from(big.magnitude_bound());
    assert!(bound >= big);
}

#[test]
fn decimal_rendering() {
    assert_eq!(d(1, -1).to_decimal(3), "0.500");
    assert_eq!(d(-5, -2).to_decimal(1), "-1.2");
    assert_eq!(Dyadic::from(42).to_decimal(0), "42");
    assert_eq!(d(1, -10).to_decimal(2), "0.00");
    assert_eq!(Dyadic::from(1).div_rounded(&Dyadic::from(3), -40, Rounding::Nearest).to_decimal(6), "0.333333");
}

#[test]
fn display() {
    assert_eq!(d(3, -2).to_string(), "3*2^(-2)");
    assert_eq!(Dyadic::from(5).to_string(), "5");
}

#[test]
fn even_integers_display_without_an_exponent() {
    assert_eq!(Dyadic::from(2).to_string(), "2");
    assert_eq!(Dyadic::from(-12).to_string(), "-12");
    assert_eq!(Dyadic::zero().to_string(), "0");
    assert_eq!(Dyadic::power2(70).to_string(), "1180591620717411303424");
}

#[test]
fn ordering_across_distant_exponents() {
    let tiny = Dyadic::power2(i32::MIN);
    let huge = Dyadic::power2(i32::MAX);
    assert!(tiny < d(1, 0));
    assert!(d(3, 0) < huge);
    assert!(-&huge < -&tiny);
    assert!(d(-3, 0) < -&tiny);
    assert_eq!(tiny.cmp(&Dyadic::power2(i32::MIN)), Ordering::Equal);
}
