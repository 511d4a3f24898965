//! Dyadic numbers: arbitrary-precision binary fractions.
//!
//! A [`Dyadic`] is `mantissa * 2^exponent` with a `BigInt` mantissa. Addition,
//! subtraction and multiplication are exact. Division and square roots are
//! only available rounded to a multiple of a chosen power of two, in a chosen
//! direction, which is all that ball arithmetic needs.

use exar_engine::ErrorBound;
use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Rounding direction for inexact operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// Toward negative infinity.
    Floor,
    /// Toward positive infinity.
    Ceil,
    /// To the nearest representable value, ties upward.
    Nearest,
}

/// `mantissa * 2^exponent`, kept with an odd mantissa (or zero).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dyadic {
    mantissa: BigInt,
    exponent: i32,
}

impl Dyadic {
    pub fn new(mantissa: BigInt, exponent: i32) -> Self {
        match mantissa.trailing_zeros() {
            None => Dyadic {
                mantissa,
                exponent: 0,
            },
            Some(0) => Dyadic { mantissa, exponent },
            Some(zeros) => {
                let zeros = zeros.min(u64::from(u32::MAX)) as u32;
                Dyadic {
                    mantissa: mantissa >> zeros,
                    exponent: exponent.saturating_add_unsigned(zeros),
                }
            }
        }
    }

    /// `2^exponent`.
    pub fn power2(exponent: i32) -> Self {
        Dyadic {
            mantissa: BigInt::one(),
            exponent,
        }
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.mantissa.is_positive()
    }

    #[must_use]
    pub fn abs(&self) -> Dyadic {
        Dyadic {
            mantissa: self.mantissa.abs(),
            exponent: self.exponent,
        }
    }

    /// `self * 2^n`.
    #[must_use]
    pub fn scale(&self, n: i32) -> Dyadic {
        if self.is_zero() {
            return self.clone();
        }
        Dyadic {
            mantissa: self.mantissa.clone(),
            exponent: self.exponent.saturating_add(n),
        }
    }

    /// `k` with `2^k <= |self| < 2^(k+1)`, or `None` for zero.
    pub fn floor_log2(&self) -> Option<i32> {
        if self.is_zero() {
            return None;
        }
        let bits = self.mantissa.bits().min(i32::MAX as u64) as i32;
        Some(self.exponent.saturating_add(bits - 1))
    }

    /// Smallest [`ErrorBound`] not below `|self|`.
    pub fn magnitude_bound(&self) -> ErrorBound {
        let bits = self.mantissa.bits();
        let magnitude = self.mantissa.magnitude();
        if bits <= 62 {
            let m = magnitude.to_u64().unwrap_or(u64::MAX);
            return ErrorBound::new(m, self.exponent);
        }
        let shift = bits - 62;
        let m = (magnitude >> shift).to_u64().unwrap_or(u64::MAX) + 1;
        ErrorBound::new(m, self.exponent.saturating_add(shift as i32))
    }

    /// Nearest multiple of `2^precision` in direction `mode`.
    #[must_use]
    pub fn round(&self, precision: i32, mode: Rounding) -> Dyadic {
        if self.exponent >= precision {
            return self.clone();
        }
        let shift = (i64::from(precision) - i64::from(self.exponent)) as u64;
        let m = &self.mantissa;
        let q = match mode {
            Rounding::Floor => m >> shift,
            Rounding::Ceil => -((-m) >> shift),
            Rounding::Nearest => (m + (BigInt::one() << (shift - 1))) >> shift,
        };
        Dyadic::new(q, precision)
    }

    /// `self / divisor` rounded to a multiple of `2^precision`.
    ///
    /// `divisor` must not be zero.
    #[must_use]
    pub fn div_rounded(&self, divisor: &Dyadic, precision: i32, mode: Rounding) -> Dyadic {
        debug_assert!(!divisor.is_zero(), "division by an exact zero");
        let shift = i64::from(self.exponent) - i64::from(divisor.exponent) - i64::from(precision);
        let (mut num, mut den) = if shift >= 0 {
            (&self.mantissa << shift as u64, divisor.mantissa.clone())
        } else {
            (self.mantissa.clone(), &divisor.mantissa << shift.unsigned_abs())
        };
        if den.is_negative() {
            num = -num;
            den = -den;
        }
        let q = match mode {
            Rounding::Floor => num.div_floor(&den),
            Rounding::Ceil => -(-num).div_floor(&den),
            Rounding::Nearest => (num * 2u32 + &den).div_floor(&(den * 2u32)),
        };
        Dyadic::new(q, precision)
    }

    /// `floor(sqrt(self))` to a multiple of `2^precision`. `self` must not be
    /// negative.
    #[must_use]
    pub fn sqrt_floor(&self, precision: i32) -> Dyadic {
        debug_assert!(!self.is_negative(), "square root of a negative dyadic");
        let shift = i64::from(self.exponent) - 2 * i64::from(precision);
        let n = if shift >= 0 {
            &self.mantissa << shift as u64
        } else {
            &self.mantissa >> shift.unsigned_abs()
        };
        Dyadic::new(Roots::sqrt(&n), precision)
    }

    /// Decimal rendering with `digits` fractional digits, rounded to nearest.
    pub fn to_decimal(&self, digits: usize) -> String {
        let scaled = &self.mantissa * BigInt::from(10).pow(digits.min(u32::MAX as usize) as u32);
        let q = if self.exponent >= 0 {
            scaled << self.exponent.unsigned_abs()
        } else {
            let shift = self.exponent.unsigned_abs();
            (scaled + (BigInt::one() << (shift - 1))) >> shift
        };
        let mut text = q.magnitude().to_string();
        if text.len() <= digits {
            text.insert_str(0, &"0".repeat(digits + 1 - text.len()));
        }
        if digits > 0 {
            text.insert(text.len() - digits, '.');
        }
        if q.is_negative() {
            text.insert(0, '-');
        }
        text
    }
}

impl From<i64> for Dyadic {
    fn from(value: i64) -> Self {
        Dyadic::new(BigInt::from(value), 0)
    }
}

impl From<BigInt> for Dyadic {
    fn from(value: BigInt) -> Self {
        Dyadic::new(value, 0)
    }
}

impl From<ErrorBound> for Dyadic {
    fn from(bound: ErrorBound) -> Self {
        Dyadic::new(BigInt::from(bound.mantissa()), bound.exponent())
    }
}

impl Zero for Dyadic {
    fn zero() -> Self {
        Dyadic {
            mantissa: BigInt::zero(),
            exponent: 0,
        }
    }

    fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }
}

impl One for Dyadic {
    fn one() -> Self {
        Dyadic::power2(0)
    }
}

impl Add for &Dyadic {
    type Output = Dyadic;

    fn add(self, rhs: &Dyadic) -> Dyadic {
        if self.is_zero() {
            return rhs.clone();
        }
        if rhs.is_zero() {
            return self.clone();
        }
        let exponent = self.exponent.min(rhs.exponent);
        let lhs_m = &self.mantissa << self.exponent.abs_diff(exponent);
        let rhs_m = &rhs.mantissa << rhs.exponent.abs_diff(exponent);
        Dyadic::new(lhs_m + rhs_m, exponent)
    }
}

impl Sub for &Dyadic {
    type Output = Dyadic;

    fn sub(self, rhs: &Dyadic) -> Dyadic {
        self + &(-rhs)
    }
}

impl Mul for &Dyadic {
    type Output = Dyadic;

    fn mul(self, rhs: &Dyadic) -> Dyadic {
        if self.is_zero() || rhs.is_zero() {
            return Dyadic::zero();
        }
        Dyadic {
            mantissa: &self.mantissa * &rhs.mantissa,
            exponent: self.exponent.saturating_add(rhs.exponent),
        }
    }
}

impl Neg for &Dyadic {
    type Output = Dyadic;

    fn neg(self) -> Dyadic {
        Dyadic {
            mantissa: -&self.mantissa,
            exponent: self.exponent,
        }
    }
}

macro_rules! forward_owned_binop {
    ($($trait:ident::$method:ident),*) => {$(
        impl $trait for Dyadic {
            type Output = Dyadic;

            #[inline]
            fn $method(self, rhs: Dyadic) -> Dyadic {
                (&self).$method(&rhs)
            }
        }
    )*};
}

forward_owned_binop!(Add::add, Sub::sub, Mul::mul);

impl Neg for Dyadic {
    type Output = Dyadic;

    fn neg(self) -> Dyadic {
        -&self
    }
}

impl Ord for Dyadic {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign = self.mantissa.sign();
        if sign != other.mantissa.sign() {
            return sign.cmp(&other.mantissa.sign());
        }
        if sign == num_bigint::Sign::NoSign {
            return Ordering::Equal;
        }
        // Leading bit positions decide unless they coincide, which bounds
        // the alignment shift of the subtraction by the mantissa lengths.
        let top = |d: &Dyadic| i64::from(d.exponent) + d.mantissa.bits() as i64;
        let magnitude = top(self).cmp(&top(other));
        if magnitude != Ordering::Equal {
            return if sign == num_bigint::Sign::Minus {
                magnitude.reverse()
            } else {
                magnitude
            };
        }
        (self - other).mantissa.sign().cmp(&num_bigint::Sign::NoSign)
    }
}

impl PartialOrd for Dyadic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Dyadic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponent >= 0 {
            write!(f, "{}", &self.mantissa << self.exponent.unsigned_abs())
        } else {
            write!(f, "{}*2^({})", self.mantissa, self.exponent)
        }
    }
}

#[cfg(test)]
mod tests;
