//! Runtime configuration of the engine.
//!
//! Defaults reproduce the classic precision schedule: start at `2^-50`, add
//! 20 bits per step with the increment growing by a factor of 1.25 every four
//! steps. Hosts usually build a config from their command line with
//! [`EngineConfig::from_args`], which consumes the engine's own options and
//! leaves everything else in place.

use crate::precision::PrecisionPolicy;
use crate::schedule::PrecisionSchedule;
use thiserror::Error;

/// Largest accepted growth factor of the schedule increment.
pub const MAX_PRECISION_FACTOR: f64 = 16.0;

fn valid_factor(factor: f64) -> bool {
    factor > 1.0 && factor <= MAX_PRECISION_FACTOR
}

/// Error raised while reading engine options.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for option `{option}`")]
    InvalidNumber { option: String, value: String },
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Working precision exponent of step 1.
    pub initial_precision: i32,
    /// Base number of bits added per schedule step.
    pub precision_increment: u32,
    /// Growth of the increment per four steps. Must exceed 1 and stay
    /// within [`MAX_PRECISION_FACTOR`].
    pub precision_factor: f64,
    /// Maximum number of strides one restart may skip when a precision
    /// target is known.
    pub precision_skip: u32,
    /// Schedule step of the first round.
    pub start_step: usize,
    /// Rounds after which the driver gives up. `None` is unbounded.
    pub max_iterations: Option<u32>,
    /// Verbosity of engine logging when no explicit filter is installed.
    pub debug: u8,
    /// Precision policy of the first round.
    pub policy: PrecisionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            initial_precision: -50,
            precision_increment: 20,
            precision_factor: 1.25,
            precision_skip: 5,
            start_step: 1,
            max_iterations: Some(64),
            debug: 0,
            policy: PrecisionPolicy::Relative,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_initial_precision(mut self, exponent: i32) -> Self {
        self.initial_precision = exponent;
        self
    }

    #[must_use]
    pub fn with_precision_increment(mut self, bits: u32) -> Self {
        if bits > 0 {
            self.precision_increment = bits;
        }
        self
    }

    #[must_use]
    pub fn with_precision_factor(mut self, factor: f64) -> Self {
        if valid_factor(factor) {
            self.precision_factor = factor;
        } else {
            tracing::warn!(factor, "ignoring precision factor outside (1, {MAX_PRECISION_FACTOR}]");
        }
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max: Option<u32>) -> Self {
        self.max_iterations = max;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PrecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the precision table described by this config.
    pub fn schedule(&self) -> PrecisionSchedule {
        PrecisionSchedule::new(
            self.initial_precision,
            self.precision_increment,
            self.precision_factor,
        )
    }

    /// Read engine options from `args`, removing the ones recognised.
    ///
    /// Recognised: `--prec_init=n`, `--prec_inc=n`, `--prec_factor=x`,
    /// `--prec_skip=n`, `--prec_start=n`, `--max_iter=n` (0 = unbounded),
    /// `--debug=n` and `-d`. Out-of-range values are ignored with a warning.
    pub fn from_args(args: &mut Vec<String>) -> Result<Self, ConfigError> {
        let mut config = EngineConfig::default();
        let mut rest = Vec::with_capacity(args.len());

        for arg in args.drain(..) {
            if arg == "-d" {
                config.debug = 1;
            } else if let Some(v) = arg.strip_prefix("--debug=") {
                config.debug = parse("--debug", v)?;
            } else if let Some(v) = arg.strip_prefix("--prec_init=") {
                config.initial_precision = parse("--prec_init", v)?;
            } else if let Some(v) = arg.strip_prefix("--prec_inc=") {
                let bits: i64 = parse("--prec_inc", v)?;
                match u32::try_from(bits) {
                    Ok(bits) if bits > 0 => config.precision_increment = bits,
                    _ => tracing::warn!(bits, "ignoring non-positive --prec_inc"),
                }
            } else if let Some(v) = arg.strip_prefix("--prec_factor=") {
                let factor: f64 = parse("--prec_factor", v)?;
                if valid_factor(factor) {
                    config.precision_factor = factor;
                } else {
                    tracing::warn!(factor, "ignoring --prec_factor outside (1, {MAX_PRECISION_FACTOR}]");
                }
            } else if let Some(v) = arg.strip_prefix("--prec_skip=") {
                let skip: u32 = parse("--prec_skip", v)?;
                if skip > 0 {
                    config.precision_skip = skip;
                } else {
                    tracing::warn!("ignoring --prec_skip=0");
                }
            } else if let Some(v) = arg.strip_prefix("--prec_start=") {
                let step: usize = parse("--prec_start", v)?;
                if step > 0 {
                    config.start_step = step;
                } else {
                    tracing::warn!("ignoring --prec_start=0");
                }
            } else if let Some(v) = arg.strip_prefix("--max_iter=") {
                let max: u32 = parse("--max_iter", v)?;
                config.max_iterations = (max > 0).then_some(max);
            } else {
                rest.push(arg);
            }
        }

        *args = rest;
        Ok(config)
    }

    /// Help text for the options understood by [`EngineConfig::from_args`].
    pub fn usage() -> String {
        let d = EngineConfig::default();
        format!(
            "Engine options:\n  \
             --prec_init=n    [{}]  starting precision exponent\n  \
             --prec_inc=n     [{}]   basic increment for precision changes\n  \
             --prec_factor=x  [{}] basic factor for precision changes\n  \
             --prec_skip=n    [{}]    bound for schedule strides skipped at once\n  \
             --prec_start=n   [{}]    initial precision step\n  \
             --max_iter=n     [{}]   iteration ceiling (0 = unbounded)\n  \
             --debug=n        [0]    engine log verbosity\n  \
             -d                      same as --debug=1\n",
            d.initial_precision,
            d.precision_increment,
            d.precision_factor,
            d.precision_skip,
            d.start_step,
            d.max_iterations.unwrap_or(0),
        )
    }
}

fn parse<T: std::str::FromStr>(option: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        option: option.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
