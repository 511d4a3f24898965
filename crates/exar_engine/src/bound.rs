//! Certified error bounds.
//!
//! An [`ErrorBound`] is a small non-negative dyadic `mantissa * 2^exponent`
//! used to track how far an approximation may be from the value it stands
//! for. All arithmetic rounds *upward*, so a bound computed from other bounds
//! is never smaller than the exact result.
//!
//! Bounds are kept canonical (odd mantissa, or the zero bound), which makes
//! the derived equality agree with the numeric order.

use crate::precision::Precision;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Shl};

/// Mantissas stay below this so that aligned sums fit in a `u64`.
const MANTISSA_LIMIT: u64 = 1 << 31;

/// Non-negative dyadic error bound, `mantissa * 2^exponent`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorBound {
    mantissa: u32,
    exponent: i32,
}

impl ErrorBound {
    /// The bound of an exact value.
    pub const ZERO: ErrorBound = ErrorBound {
        mantissa: 0,
        exponent: 0,
    };

    /// Create a bound, rounding the mantissa up if it has to be shortened.
    pub fn new(mantissa: u64, exponent: i32) -> Self {
        Self::round_up(mantissa, i64::from(exponent))
    }

    /// The bound `2^exponent`.
    pub fn power2(exponent: i32) -> Self {
        ErrorBound {
            mantissa: 1,
            exponent,
        }
    }

    pub fn mantissa(self) -> u32 {
        self.mantissa
    }

    pub fn exponent(self) -> i32 {
        self.exponent
    }

    pub fn is_zero(self) -> bool {
        self.mantissa == 0
    }

    /// Smallest `k` with `self <= 2^k`; `i32::MIN` for the zero bound.
    pub fn exponent_bound(self) -> i32 {
        match self.mantissa {
            0 => i32::MIN,
            1 => self.exponent,
            m => self.exponent.saturating_add(bit_length(u64::from(m)) as i32),
        }
    }

    /// `self + 2^exponent`, rounded up.
    #[must_use]
    pub fn add_power2(self, exponent: i32) -> Self {
        self + Self::power2(exponent)
    }

    /// Strict numeric comparison, exact.
    pub fn less(self, other: ErrorBound) -> bool {
        self.cmp(&other) == Ordering::Less
    }

    /// Shorten `mantissa` below [`MANTISSA_LIMIT`] rounding up, then strip
    /// trailing zero bits. Exponents are clamped to the `i32` range.
    fn round_up(mut mantissa: u64, mut exponent: i64) -> Self {
        if mantissa == 0 {
            return Self::ZERO;
        }
        while mantissa >= MANTISSA_LIMIT {
            mantissa = (mantissa >> 1) + (mantissa & 1);
            exponent += 1;
        }
        let zeros = mantissa.trailing_zeros();
        mantissa >>= zeros;
        exponent += i64::from(zeros);
        ErrorBound {
            mantissa: mantissa as u32,
            exponent: exponent.clamp(i64::from(i32::MIN) + 64, i64::from(i32::MAX)) as i32,
        }
    }

    /// Position just above the highest set bit, as a plain integer.
    fn magnitude(self) -> i64 {
        i64::from(self.exponent) + i64::from(bit_length(u64::from(self.mantissa)))
    }
}

fn bit_length(x: u64) -> u32 {
    u64::BITS - x.leading_zeros()
}

impl Ord for ErrorBound {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        match self.magnitude().cmp(&other.magnitude()) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        // Same bit length: exponents differ by less than 32, so the shifted
        // mantissa fits comfortably in 64 bits.
        let shift = i64::from(self.exponent) - i64::from(other.exponent);
        if shift >= 0 {
            (u64::from(self.mantissa) << shift).cmp(&u64::from(other.mantissa))
        } else {
            u64::from(self.mantissa).cmp(&(u64::from(other.mantissa) << -shift))
        }
    }
}

impl PartialOrd for ErrorBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for ErrorBound {
    type Output = ErrorBound;

    fn add(self, other: ErrorBound) -> ErrorBound {
        if self.is_zero() {
            return other;
        }
        if other.is_zero() {
            return self;
        }
        let (hi, lo) = if self.exponent >= other.exponent {
            (self, other)
        } else {
            (other, self)
        };
        let gap = i64::from(hi.exponent) - i64::from(lo.exponent);
        if gap <= 32 {
            let aligned = (u64::from(hi.mantissa) << gap) + u64::from(lo.mantissa);
            Self::round_up(aligned, i64::from(lo.exponent))
        } else {
            // `lo` is below one unit of `hi`'s last place.
            Self::round_up(u64::from(hi.mantissa) + 1, i64::from(hi.exponent))
        }
    }
}

impl Mul for ErrorBound {
    type Output = ErrorBound;

    fn mul(self, other: ErrorBound) -> ErrorBound {
        if self.is_zero() || other.is_zero() {
            return Self::ZERO;
        }
        Self::round_up(
            u64::from(self.mantissa) * u64::from(other.mantissa),
            i64::from(self.exponent) + i64::from(other.exponent),
        )
    }
}

impl Shl<i32> for ErrorBound {
    type Output = ErrorBound;

    /// Scale by `2^n` (negative `n` shrinks the bound).
    fn shl(self, n: i32) -> ErrorBound {
        if self.is_zero() {
            return self;
        }
        Self::round_up(
            u64::from(self.mantissa),
            i64::from(self.exponent) + i64::from(n),
        )
    }
}

impl fmt::Display for ErrorBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            write!(f, "0")
        } else {
            write!(f, "{}*2^({})", self.mantissa, self.exponent)
        }
    }
}

/// A value that carries a certified error bound.
///
/// The driver uses this to decide whether a result is accurate enough, and
/// limit operators use it to widen the bound of what they return.
pub trait Certified {
    fn error(&self) -> ErrorBound;

    /// The same value with its error bound replaced.
    #[must_use]
    fn with_error(self, error: ErrorBound) -> Self;

    /// Whether the error is at most `2^tolerance`.
    fn within(&self, tolerance: Precision) -> bool {
        let error = self.error();
        error.is_zero() || error.exponent_bound() <= tolerance.exponent()
    }
}
