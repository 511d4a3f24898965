//! Numeric failures.
//!
//! These are the user-visible error channel of the engine: a computation
//! that is mathematically undefined, or one the driver gave up on. They are
//! terminal for the evaluation that raised them and are never retried.
//!
//! `NumericErrorKind` carries the structured category; the factory functions
//! below (`division_by_zero()`, ...) are the public way to build errors and
//! populate both `kind` and `message`.

use std::fmt;

/// Typed numeric error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumericErrorKind {
    /// The divisor is exactly zero.
    DivisionByZero,
    /// An operation was applied outside its domain (e.g. `sqrt(-1)`).
    Domain { operation: String },
    /// A query needs a non-zero value but the argument is exactly zero.
    Underflow,
    /// The driver performed the maximum number of rounds.
    IterationCeiling { iterations: u32 },
    /// The precision schedule has no finer step left.
    PrecisionExhausted { step: usize },
    /// A limit operator could not produce any approximation.
    LimitDiverged,
    /// Catch-all for failures raised by client code.
    Custom { message: String },
}

impl fmt::Display for NumericErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Domain { operation } => write!(f, "argument outside the domain of {operation}"),
            Self::Underflow => write!(f, "underflow: value is exactly zero"),
            Self::IterationCeiling { iterations } => {
                write!(f, "no certified result after {iterations} iterations")
            }
            Self::PrecisionExhausted { step } => {
                write!(f, "precision schedule exhausted at step {step}")
            }
            Self::LimitDiverged => write!(f, "limit computation failed at every precision"),
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// A numeric failure, terminal for the evaluation that raised it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumericError {
    pub kind: NumericErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory-built
    /// errors.
    pub message: String,
}

impl NumericError {
    /// Create an error with just a message. Uses the `Custom` kind.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        NumericError {
            kind: NumericErrorKind::Custom {
                message: message.clone(),
            },
            message,
        }
    }

    fn from_kind(kind: NumericErrorKind) -> Self {
        let message = kind.to_string();
        NumericError { kind, message }
    }
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for NumericError {}

// Factories

#[cold]
pub fn division_by_zero() -> NumericError {
    NumericError::from_kind(NumericErrorKind::DivisionByZero)
}

#[cold]
pub fn domain_error(operation: &str) -> NumericError {
    NumericError::from_kind(NumericErrorKind::Domain {
        operation: operation.to_string(),
    })
}

#[cold]
pub fn underflow() -> NumericError {
    NumericError::from_kind(NumericErrorKind::Underflow)
}

#[cold]
pub fn iteration_ceiling(iterations: u32) -> NumericError {
    NumericError::from_kind(NumericErrorKind::IterationCeiling { iterations })
}

#[cold]
pub fn precision_exhausted(step: usize) -> NumericError {
    NumericError::from_kind(NumericErrorKind::PrecisionExhausted { step })
}

#[cold]
pub fn limit_diverged() -> NumericError {
    NumericError::from_kind(NumericErrorKind::LimitDiverged)
}
