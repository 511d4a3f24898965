//! Exact real numbers.
//!
//! A [`Real`] is a shared expression graph whose leaves are exact dyadic
//! numbers or limit-defined values. Nothing is computed when a `Real` is
//! built; [`Real::approximate`] walks the graph at the working precision of
//! an [`IterationContext`] and returns a certified [`Approx`].
//!
//! Cloning a `Real` is cheap and shares the node, so a subexpression used
//! twice is approximated once per walk.

use crate::approx::Approx;
use crate::dyadic::Dyadic;
use crate::stack::ensure_sufficient_stack;
use exar_engine::errors::{division_by_zero, domain_error};
use exar_engine::{limit, Flow, IterationContext, Precision, SiteKey};
use num_bigint::BigInt;
use num_traits::Zero;
use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;
use std::sync::Arc;

/// Approximation function of a limit-defined real: called with a precision
/// `p`, returns a ball within `2^p` of the limit (beyond its own radius).
pub type LimitFn = Arc<dyn Fn(&mut IterationContext, Precision) -> Flow<Approx> + Send + Sync>;

#[derive(Clone)]
pub struct Real(Arc<Node>);

enum Node {
    Exact(Dyadic),
    Add(Real, Real),
    Sub(Real, Real),
    Mul(Real, Real),
    Div(Real, Real),
    Neg(Real),
    Scale(Real, i32),
    Abs(Real),
    Max(Real, Real),
    Min(Real, Real),
    Sqrt(Real),
    Limit { site: SiteKey, f: LimitFn },
}

impl Real {
    fn node(node: Node) -> Real {
        Real(Arc::new(node))
    }

    pub fn zero() -> Real {
        Real::from(Dyadic::zero())
    }

    /// `num / den`. A zero denominator surfaces as a division-by-zero error
    /// when the value is approximated.
    pub fn rational(num: impl Into<BigInt>, den: impl Into<BigInt>) -> Real {
        Real::from(Dyadic::from(num.into())) / Real::from(Dyadic::from(den.into()))
    }

    /// The limit of `f(ctx, p)` as `p` goes to minus infinity.
    ///
    /// `f` must be single-valued: for a fixed `p` it always returns the same
    /// ball.
    #[track_caller]
    pub fn from_limit<F>(f: F) -> Real
    where
        F: Fn(&mut IterationContext, Precision) -> Flow<Approx> + Send + Sync + 'static,
    {
        Real::named_limit(SiteKey::caller(), f)
    }

    pub(crate) fn named_limit<F>(site: SiteKey, f: F) -> Real
    where
        F: Fn(&mut IterationContext, Precision) -> Flow<Approx> + Send + Sync + 'static,
    {
        Real::node(Node::Limit {
            site,
            f: Arc::new(f),
        })
    }

    /// The dyadic value of an exact leaf.
    pub fn as_exact(&self) -> Option<&Dyadic> {
        match &*self.0 {
            Node::Exact(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn sqrt(&self) -> Real {
        Real::node(Node::Sqrt(self.clone()))
    }

    #[must_use]
    pub fn abs(&self) -> Real {
        Real::node(Node::Abs(self.clone()))
    }

    #[must_use]
    pub fn max(&self, other: &Real) -> Real {
        Real::node(Node::Max(self.clone(), other.clone()))
    }

    #[must_use]
    pub fn min(&self, other: &Real) -> Real {
        Real::node(Node::Min(self.clone(), other.clone()))
    }

    /// `self * 2^n`.
    #[must_use]
    pub fn scale(&self, n: i32) -> Real {
        Real::node(Node::Scale(self.clone(), n))
    }

    /// Approximate at the context's working precision.
    pub fn approximate(&self, ctx: &mut IterationContext) -> Flow<Approx> {
        Walk::default().eval(ctx, self)
    }

    /// Approximate several reals in one walk, sharing common subexpressions.
    pub fn approximate_all(ctx: &mut IterationContext, reals: &[&Real]) -> Flow<Vec<Approx>> {
        let mut walk = Walk::default();
        reals.iter().map(|x| walk.eval(ctx, x)).collect()
    }
}

/// One traversal of a graph. Shared nodes are evaluated once.
#[derive(Default)]
struct Walk {
    done: FxHashMap<*const Node, Approx>,
}

impl Walk {
    fn eval(&mut self, ctx: &mut IterationContext, x: &Real) -> Flow<Approx> {
        let key = Arc::as_ptr(&x.0);
        if let Some(value) = self.done.get(&key) {
            return Ok(value.clone());
        }
        let value = ensure_sufficient_stack(|| self.eval_node(ctx, &x.0))?;
        self.done.insert(key, value.clone());
        Ok(value)
    }

    fn eval_node(&mut self, ctx: &mut IterationContext, node: &Node) -> Flow<Approx> {
        let value = match node {
            Node::Exact(d) => return Ok(Approx::exact(d.clone())),
            Node::Add(a, b) => {
                let (a, b) = (self.eval(ctx, a)?, self.eval(ctx, b)?);
                &a + &b
            }
            Node::Sub(a, b) => {
                let (a, b) = (self.eval(ctx, a)?, self.eval(ctx, b)?);
                &a - &b
            }
            Node::Mul(a, b) => {
                let (a, b) = (self.eval(ctx, a)?, self.eval(ctx, b)?);
                &a * &b
            }
            Node::Neg(a) => return Ok(-&self.eval(ctx, a)?),
            Node::Scale(a, n) => return Ok(self.eval(ctx, a)?.scale(*n)),
            Node::Abs(a) => return Ok(self.eval(ctx, a)?.abs()),
            Node::Max(a, b) => {
                let (a, b) = (self.eval(ctx, a)?, self.eval(ctx, b)?);
                return Ok(a.max(&b));
            }
            Node::Min(a, b) => {
                let (a, b) = (self.eval(ctx, a)?, self.eval(ctx, b)?);
                return Ok(a.min(&b));
            }
            Node::Div(a, b) => return self.divide(ctx, a, b),
            Node::Sqrt(a) => return self.sqrt(ctx, a),
            Node::Limit { site, f } => {
                tracing::trace!(%site, precision = %ctx.working_precision(), "evaluating limit");
                return limit(ctx, |ctx, p| f(ctx, p));
            }
        };
        Ok(round_to_working(ctx, value))
    }

    fn divide(&mut self, ctx: &mut IterationContext, a: &Real, b: &Real) -> Flow<Approx> {
        let divisor = self.eval(ctx, b)?;
        if divisor.is_exact_zero() {
            return Err(division_by_zero().into());
        }
        if divisor.sign().is_none() {
            tracing::debug!(divisor = %divisor, "divisor not separated from zero");
            return Err(ctx.restart());
        }
        let dividend = self.eval(ctx, a)?;
        let estimate = match (dividend.magnitude(), divisor.lower().abs().min(divisor.upper().abs()).floor_log2()) {
            (Some(num), Some(den)) => Some(num.saturating_sub(den)),
            _ => None,
        };
        let precision = ctx.rounding_precision(estimate);
        Ok(dividend.div(&divisor, precision.exponent()))
    }

    fn sqrt(&mut self, ctx: &mut IterationContext, a: &Real) -> Flow<Approx> {
        let radicand = self.eval(ctx, a)?;
        if radicand.is_exact_zero() {
            return Ok(radicand);
        }
        if radicand.upper().is_negative() {
            return Err(domain_error("sqrt").into());
        }
        if radicand.lower().is_negative() {
            tracing::debug!(radicand = %radicand, "radicand not separated from zero");
            return Err(ctx.restart());
        }
        let estimate = radicand.magnitude().map(|m| m / 2 + 1);
        let precision = ctx.rounding_precision(estimate);
        Ok(radicand.sqrt(precision.exponent()))
    }
}

/// Keep centres from growing without bound: round to what the working
/// precision asks for at this magnitude.
fn round_to_working(ctx: &IterationContext, value: Approx) -> Approx {
    if value.is_exact() && value.center().exponent() >= ctx.working_precision().exponent() {
        return value;
    }
    let precision = ctx.rounding_precision(value.magnitude());
    value.round(precision.exponent())
}

impl From<Dyadic> for Real {
    fn from(value: Dyadic) -> Self {
        Real::node(Node::Exact(value))
    }
}

impl From<i64> for Real {
    fn from(value: i64) -> Self {
        Real::from(Dyadic::from(value))
    }
}

impl From<BigInt> for Real {
    fn from(value: BigInt) -> Self {
        Real::from(Dyadic::from(value))
    }
}

macro_rules! real_binop {
    ($($trait:ident::$method:ident => $variant:ident),*) => {$(
        impl $trait for &Real {
            type Output = Real;

            fn $method(self, rhs: &Real) -> Real {
                Real::node(Node::$variant(self.clone(), rhs.clone()))
            }
        }

        impl $trait for Real {
            type Output = Real;

            fn $method(self, rhs: Real) -> Real {
                Real::node(Node::$variant(self, rhs))
            }
        }

        impl $trait<&Real> for Real {
            type Output = Real;

            fn $method(self, rhs: &Real) -> Real {
                Real::node(Node::$variant(self, rhs.clone()))
            }
        }

        impl $trait<Real> for &Real {
            type Output = Real;

            fn $method(self, rhs: Real) -> Real {
                Real::node(Node::$variant(self.clone(), rhs))
            }
        }
    )*};
}

real_binop!(Add::add => Add, Sub::sub => Sub, Mul::mul => Mul, Div::div => Div);

impl Neg for &Real {
    type Output = Real;

    fn neg(self) -> Real {
        Real::node(Node::Neg(self.clone()))
    }
}

impl Neg for Real {
    type Output = Real;

    fn neg(self) -> Real {
        Real::node(Node::Neg(self))
    }
}

/// Error parsing a real literal.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseRealError {
    #[error("invalid real literal `{0}`")]
    Invalid(String),
}

impl FromStr for Real {
    type Err = ParseRealError;

    /// Integers (`42`), decimals (`-0.333333`) and fractions (`1/3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseRealError::Invalid(s.to_string());
        let text = s.trim();
        if let Some((num, den)) = text.split_once('/') {
            let num = num.trim().parse::<BigInt>().map_err(|_| invalid())?;
            let den = den.trim().parse::<BigInt>().map_err(|_| invalid())?;
            return Ok(Real::rational(num, den));
        }
        let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
        let unsigned = int_part.trim_start_matches(['-', '+']);
        let well_formed = !(unsigned.is_empty() && frac_part.is_empty())
            && unsigned.bytes().all(|b| b.is_ascii_digit())
            && frac_part.bytes().all(|b| b.is_ascii_digit());
        if !well_formed || int_part.len() > unsigned.len() + 1 {
            return Err(invalid());
        }
        let mut digits = int_part.to_string();
        if unsigned.is_empty() {
            digits.push('0');
        }
        digits.push_str(frac_part);
        let num = digits.parse::<BigInt>().map_err(|_| invalid())?;
        if frac_part.is_empty() {
            return Ok(Real::from(num));
        }
        let exponent = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        Ok(Real::rational(num, BigInt::from(10).pow(exponent)))
    }
}

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Node::Exact(d) => write!(f, "{d}"),
            Node::Add(a, b) => write!(f, "({a:?} + {b:?})"),
            Node::Sub(a, b) => write!(f, "({a:?} - {b:?})"),
            Node::Mul(a, b) => write!(f, "({a:?} * {b:?})"),
            Node::Div(a, b) => write!(f, "({a:?} / {b:?})"),
            Node::Neg(a) => write!(f, "-{a:?}"),
            Node::Scale(a, n) => write!(f, "({a:?} * 2^{n})"),
            Node::Abs(a) => write!(f, "|{a:?}|"),
            Node::Max(a, b) => write!(f, "max({a:?}, {b:?})"),
            Node::Min(a, b) => write!(f, "min({a:?}, {b:?})"),
            Node::Sqrt(a) => write!(f, "sqrt({a:?})"),
            Node::Limit { site, .. } => write!(f, "limit@{site}"),
        }
    }
}
