//! Command implementations.
//!
//! Each command returns the lines it wants printed so the binary stays a
//! thin shell around them.

use exar_engine::{ConfigError, Engine, EvalStats, NumericError, Outcome};
use exar_real::{is_less, to_decimal, ParseRealError, Real};
use rayon::prelude::*;

/// Default number of decimal places.
pub const DEFAULT_DIGITS: usize = 30;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseRealError),
    #[error("{0}")]
    Numeric(#[from] NumericError),
    #[error("invalid value `{value}` for `{option}`")]
    InvalidOption { option: &'static str, value: String },
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Options of the front end itself (engine options are handled by
/// [`EngineConfig::from_args`](exar_engine::EngineConfig::from_args)).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliOptions {
    pub digits: usize,
    pub stats: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions {
            digits: DEFAULT_DIGITS,
            stats: false,
        }
    }
}

impl CliOptions {
    /// Remove `--digits=n` and `--stats` from `args`.
    pub fn from_args(args: &mut Vec<String>) -> Result<Self, CliError> {
        let mut options = CliOptions::default();
        let mut rest = Vec::with_capacity(args.len());
        for arg in args.drain(..) {
            if arg == "--stats" {
                options.stats = true;
            } else if let Some(v) = arg.strip_prefix("--digits=") {
                options.digits = v.parse().map_err(|_| CliError::InvalidOption {
                    option: "--digits",
                    value: v.to_string(),
                })?;
            } else {
                rest.push(arg);
            }
        }
        *args = rest;
        Ok(options)
    }
}

/// Square roots of every radicand, each its own evaluation, in parallel.
pub fn sqrt(engine: &Engine, options: &CliOptions, radicands: &[String]) -> Result<Vec<String>, CliError> {
    if radicands.is_empty() {
        return Err(CliError::Usage("exar sqrt <n>..."));
    }
    let reals = radicands
        .iter()
        .map(|text| text.parse::<Real>())
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(count = reals.len(), digits = options.digits, "evaluating square roots");
    let results: Vec<Result<Outcome<String>, NumericError>> = reals
        .par_iter()
        .map(|x| {
            let root = x.sqrt();
            engine.run(|ctx| to_decimal(ctx, &root, options.digits))
        })
        .collect();

    let mut lines = Vec::with_capacity(results.len());
    for (text, result) in radicands.iter().zip(results) {
        let outcome = result?;
        lines.push(format!("sqrt({text}) = {}", outcome.value));
        push_stats(&mut lines, options, &outcome.stats);
    }
    Ok(lines)
}

/// Decimal expansion of a constant.
pub fn constant(engine: &Engine, options: &CliOptions, name: &str, x: &Real) -> Result<Vec<String>, CliError> {
    let outcome = engine.run(|ctx| to_decimal(ctx, x, options.digits))?;
    let mut lines = vec![format!("{name} = {}", outcome.value)];
    push_stats(&mut lines, options, &outcome.stats);
    Ok(lines)
}

/// Order of two literals. Equal values that are not both exact cannot be
/// told apart and end at the iteration ceiling.
pub fn compare(engine: &Engine, options: &CliOptions, operands: &[String]) -> Result<Vec<String>, CliError> {
    let [a, b] = operands else {
        return Err(CliError::Usage("exar compare <a> <b>"));
    };
    let (x, y) = (a.parse::<Real>()?, b.parse::<Real>()?);
    let outcome = engine.run(|ctx| is_less(ctx, &x, &y))?;
    let relation = if outcome.value { "<" } else { ">=" };
    let mut lines = vec![format!("{a} {relation} {b}")];
    push_stats(&mut lines, options, &outcome.stats);
    Ok(lines)
}

fn push_stats(lines: &mut Vec<String>, options: &CliOptions, stats: &EvalStats) {
    if options.stats {
        lines.extend(stats.to_string().lines().map(|line| format!("  {line}")));
    }
}
