//! Exact real numbers driven by the exar engine.
//!
//! A [`Real`] describes a value, not an approximation of it. Code that needs
//! numbers runs inside [`Engine::run`](exar_engine::Engine::run): every
//! approximation is taken at the round's working precision, comparisons
//! that cannot be decided yet restart the round, and the engine escalates
//! until the body completes.
//!
//! ```text
//! let x = Real::from(2).sqrt();
//! let outcome = Engine::default().run(|ctx| to_decimal(ctx, &x, 30))?;
//! assert_eq!(outcome.value, "1.414213562373095048801688724210");
//! ```

mod approx;
mod compare;
mod constants;
mod dyadic;
mod query;
mod real;
mod stack;

pub use approx::Approx;
pub use compare::{bound, compare_less, is_less, positive};
pub use constants::{e, ln2, pi};
pub use dyadic::{Dyadic, Rounding};
pub use query::{approx_to, size, to_decimal, upper_bound};
pub use real::{LimitFn, ParseRealError, Real};
