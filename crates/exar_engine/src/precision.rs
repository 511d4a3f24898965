//! Precision tokens.
//!
//! Every approximation request in the engine is parameterized by a binary
//! exponent `p`: a value is "accurate to precision `p`" when it differs from
//! the true value by at most `2^p`. Smaller (more negative) exponents are
//! more accurate, so the working precision of an evaluation only ever
//! *decreases* as the engine escalates.

use std::fmt;

/// A binary error exponent: accurate to `2^p`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Precision(pub i32);

impl Precision {
    /// Exact information. Satisfies every request.
    pub const EXACT: Precision = Precision(i32::MIN);

    /// Coarsest representable request.
    pub const COARSEST: Precision = Precision(i32::MAX);

    #[inline]
    pub const fn new(exponent: i32) -> Self {
        Precision(exponent)
    }

    #[inline]
    pub const fn exponent(self) -> i32 {
        self.0
    }

    /// Whether a value produced at `self` is good enough for a request at
    /// `required`.
    #[inline]
    pub fn satisfies(self, required: Precision) -> bool {
        self.0 <= required.0
    }

    #[inline]
    pub fn is_exact(self) -> bool {
        self == Self::EXACT
    }

    /// Shift the exponent by `delta` bits, saturating at the representable
    /// range. `EXACT` stays exact.
    #[inline]
    #[must_use]
    pub fn offset(self, delta: i32) -> Self {
        if self.is_exact() {
            return self;
        }
        Precision(self.0.saturating_add(delta))
    }

    /// The more accurate of two precisions.
    #[inline]
    #[must_use]
    pub fn finer(self, other: Precision) -> Self {
        std::cmp::min(self, other)
    }

    /// The less accurate of two precisions.
    #[inline]
    #[must_use]
    pub fn coarser(self, other: Precision) -> Self {
        std::cmp::max(self, other)
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            write!(f, "exact")
        } else {
            write!(f, "2^({})", self.0)
        }
    }
}

impl From<i32> for Precision {
    fn from(exponent: i32) -> Self {
        Precision(exponent)
    }
}

/// How the working precision applies to intermediate results.
///
/// `Absolute` rounds every result to the working precision itself.
/// `Relative` scales it by the magnitude of the result, so large values are
/// rounded more coarsely and small values more finely.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrecisionPolicy {
    Absolute,
    #[default]
    Relative,
}

#[cfg(test)]
mod tests;
