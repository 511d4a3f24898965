//! Exar Engine - precision escalation for exact real computation.
//!
//! A computation over exact reals is run in rounds. Each round works at a
//! fixed working precision; whenever some step cannot be certified at that
//! precision (two values too close to compare, a result too coarse) the
//! round is abandoned and the whole computation runs again at a finer
//! precision. Results of expensive sub-computations are memoized across
//! rounds so a restart does not redo work whose precision need has already
//! been met.
//!
//! # Architecture
//!
//! - [`Engine`]: the iteration driver, one call per top-level evaluation
//! - [`IterationContext`]: per-evaluation state passed `&mut` into the body
//! - [`CacheRegistry`]: per-evaluation memo table keyed by call site
//! - [`Decision`]: three-valued comparison results, resolved through the context
//! - [`Flow`] / [`Interrupt`]: the restart protocol as a result type
//! - [`limit`], [`limit_continuous`], [`limit_mv`], [`limit_lipschitz`]: limit operators
//! - [`PrecisionSchedule`]: the table of working precisions
//!
//! # Example
//!
//! ```text
//! let engine = Engine::new(EngineConfig::default());
//! let outcome = engine.run(|ctx| {
//!     let below = ctx.resolve(compare(ctx, &x, &y))?;
//!     Ok(below)
//! })?;
//! ```

mod bound;
mod cache;
mod config;
mod context;
mod decision;
mod driver;
pub mod errors;
mod limit;
mod precision;
mod schedule;
mod signal;
mod stats;

pub use bound::{Certified, ErrorBound};
pub use cache::{CacheRegistry, CacheStats, SiteKey, SlotId};
pub use config::{ConfigError, EngineConfig, MAX_PRECISION_FACTOR};
pub use context::IterationContext;
pub use decision::Decision;
pub use driver::{Engine, Outcome};
pub use errors::{NumericError, NumericErrorKind};
pub use limit::{limit, limit_continuous, limit_lipschitz, limit_lipschitz_on, limit_mv};
pub use precision::{Precision, PrecisionPolicy};
pub use schedule::{PrecisionSchedule, RESTART_STRIDE, SCHEDULE_STEPS};
pub use signal::{Flow, Interrupt, Restart};
pub use stats::EvalStats;
