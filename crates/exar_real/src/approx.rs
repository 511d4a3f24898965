//! Approximation balls.
//!
//! An [`Approx`] is a dyadic centre with a certified radius: the real value
//! it approximates lies in `[center - error, center + error]`. Arithmetic on
//! balls is exact on the centre and rounds the radius upward, so the result
//! always contains the exact result of the operation on any points of the
//! operands.

use crate::dyadic::{Dyadic, Rounding};
use exar_engine::{Certified, ErrorBound};
use num_traits::Zero;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Approx {
    center: Dyadic,
    error: ErrorBound,
}

impl Approx {
    pub fn new(center: Dyadic, error: ErrorBound) -> Self {
        Approx { center, error }
    }

    pub fn exact(center: Dyadic) -> Self {
        Approx {
            center,
            error: ErrorBound::ZERO,
        }
    }

    /// Smallest ball containing `[lower, upper]`.
    pub fn from_interval(lower: &Dyadic, upper: &Dyadic) -> Self {
        debug_assert!(lower <= upper);
        let center = (lower + upper).scale(-1);
        let error = (upper - lower).scale(-1).magnitude_bound();
        Approx { center, error }
    }

    pub fn center(&self) -> &Dyadic {
        &self.center
    }

    pub fn is_exact(&self) -> bool {
        self.error.is_zero()
    }

    pub fn is_exact_zero(&self) -> bool {
        self.is_exact() && self.center.is_zero()
    }

    pub fn lower(&self) -> Dyadic {
        &self.center - &Dyadic::from(self.error)
    }

    pub fn upper(&self) -> Dyadic {
        &self.center + &Dyadic::from(self.error)
    }

    pub fn contains(&self, x: &Dyadic) -> bool {
        (x - &self.center).magnitude_bound() <= self.error
    }

    /// The common sign of every point in the ball, if there is one.
    ///
    /// `Some(Equal)` only for the exact zero.
    pub fn sign(&self) -> Option<Ordering> {
        if self.is_exact_zero() {
            return Some(Ordering::Equal);
        }
        if self.lower().is_positive() {
            Some(Ordering::Greater)
        } else if self.upper().is_negative() {
            Some(Ordering::Less)
        } else {
            None
        }
    }

    /// Smallest `k` with `|x| <= 2^k` for every point `x` of the ball, or
    /// `None` for the exact zero.
    pub fn magnitude(&self) -> Option<i32> {
        if self.is_exact_zero() {
            return None;
        }
        Some((self.center.magnitude_bound() + self.error).exponent_bound())
    }

    /// Round the centre to the nearest multiple of `2^precision`, widening
    /// the radius by the distance moved.
    #[must_use]
    pub fn round(self, precision: i32) -> Approx {
        if self.center.exponent() >= precision {
            return self;
        }
        let rounded = self.center.round(precision, Rounding::Nearest);
        let moved = (&rounded - &self.center).magnitude_bound();
        Approx {
            center: rounded,
            error: self.error + moved,
        }
    }

    /// `self * 2^n`.
    #[must_use]
    pub fn scale(&self, n: i32) -> Approx {
        Approx {
            center: self.center.scale(n),
            error: self.error << n,
        }
    }

    #[must_use]
    pub fn abs(&self) -> Approx {
        match self.sign() {
            Some(Ordering::Less) => -self,
            Some(_) => self.clone(),
            None => {
                let reach = self.lower().abs().max(self.upper());
                Approx::from_interval(&Dyadic::zero(), &reach)
            }
        }
    }

    #[must_use]
    pub fn max(&self, other: &Approx) -> Approx {
        let lower = self.lower().max(other.lower());
        let upper = self.upper().max(other.upper());
        Approx::from_interval(&lower, &upper)
    }

    #[must_use]
    pub fn min(&self, other: &Approx) -> Approx {
        let lower = self.lower().min(other.lower());
        let upper = self.upper().min(other.upper());
        Approx::from_interval(&lower, &upper)
    }

    /// `self / divisor` to within `2^precision` beyond the propagated error.
    ///
    /// The divisor ball must not contain zero.
    pub fn div(&self, divisor: &Approx, precision: i32) -> Approx {
        let (a_lo, a_hi) = (self.lower(), self.upper());
        let (b_lo, b_hi) = (divisor.lower(), divisor.upper());
        let corners = [(&a_lo, &b_lo), (&a_lo, &b_hi), (&a_hi, &b_lo), (&a_hi, &b_hi)];
        let mut lower: Option<Dyadic> = None;
        let mut upper: Option<Dyadic> = None;
        for (a, b) in corners {
            let lo = a.div_rounded(b, precision, Rounding::Floor);
            let hi = a.div_rounded(b, precision, Rounding::Ceil);
            lower = Some(lower.map_or(lo.clone(), |l| l.min(lo)));
            upper = Some(upper.map_or(hi.clone(), |u| u.max(hi)));
        }
        match (lower, upper) {
            (Some(lower), Some(upper)) => Approx::from_interval(&lower, &upper),
            _ => Approx::exact(Dyadic::zero()),
        }
    }

    /// Square root to within `2^precision` beyond the propagated error.
    ///
    /// Every point of the ball must be non-negative.
    pub fn sqrt(&self, precision: i32) -> Approx {
        let lower = self.lower().sqrt_floor(precision);
        let upper = &self.upper().sqrt_floor(precision) + &Dyadic::power2(precision);
        Approx::from_interval(&lower, &upper)
    }
}

impl Certified for Approx {
    fn error(&self) -> ErrorBound {
        self.error
    }

    fn with_error(self, error: ErrorBound) -> Self {
        Approx { error, ..self }
    }
}

impl Add for &Approx {
    type Output = Approx;

    fn add(self, rhs: &Approx) -> Approx {
        Approx {
            center: &self.center + &rhs.center,
            error: self.error + rhs.error,
        }
    }
}

impl Sub for &Approx {
    type Output = Approx;

    fn sub(self, rhs: &Approx) -> Approx {
        Approx {
            center: &self.center - &rhs.center,
            error: self.error + rhs.error,
        }
    }
}

impl Mul for &Approx {
    type Output = Approx;

    /// `|ab - a'b'| <= |a| e_b + |b| e_a + e_a e_b` for `a'`, `b'` in the
    /// balls.
    fn mul(self, rhs: &Approx) -> Approx {
        let error = self.center.magnitude_bound() * rhs.error
            + rhs.center.magnitude_bound() * self.error
            + self.error * rhs.error;
        Approx {
            center: &self.center * &rhs.center,
            error,
        }
    }
}

impl Neg for &Approx {
    type Output = Approx;

    fn neg(self) -> Approx {
        Approx {
            center: -&self.center,
            error: self.error,
        }
    }
}

impl fmt::Display for Approx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ± {}", self.center, self.error)
    }
}
