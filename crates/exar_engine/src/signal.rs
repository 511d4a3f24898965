//! The restart protocol.
//!
//! A computation body never throws. Every engine call that may need more
//! precision returns [`Flow<T>`], whose error side is an [`Interrupt`]:
//! either a [`Restart`] (control flow only, consumed by the nearest driver
//! or limit frame) or a [`NumericError`] (user-visible, terminal). Both
//! propagate with `?`, so client code reads like ordinary fallible code.

use crate::errors::NumericError;
use std::fmt;

/// "Retry at higher precision." Carries no data; any precision target lives
/// in the iteration context that raised it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Restart;

impl fmt::Display for Restart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "restart requested")
    }
}

/// Non-local exit from a computation body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// Unwind the current round and retry with more precision.
    Restart(Restart),
    /// Abort the evaluation.
    Failure(NumericError),
}

impl Interrupt {
    #[inline]
    pub fn is_restart(&self) -> bool {
        matches!(self, Interrupt::Restart(_))
    }
}

impl From<Restart> for Interrupt {
    fn from(signal: Restart) -> Self {
        Interrupt::Restart(signal)
    }
}

impl From<NumericError> for Interrupt {
    fn from(err: NumericError) -> Self {
        Interrupt::Failure(err)
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Restart(r) => write!(f, "{r}"),
            Interrupt::Failure(e) => write!(f, "{e}"),
        }
    }
}

/// Result of any step of a computation body.
pub type Flow<T> = Result<T, Interrupt>;
