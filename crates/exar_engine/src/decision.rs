//! Three-valued decisions.
//!
//! Comparison primitives produce a [`Decision`]. [`Decision::Undecided`] is
//! not a boolean: code that needs to branch on a decision goes through
//! [`IterationContext::resolve`], which turns `Undecided` into a restart of
//! the round instead of guessing.

use crate::cache::SiteKey;
use crate::context::IterationContext;
use crate::precision::Precision;
use crate::signal::Flow;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Kleene truth value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Decision {
    True,
    False,
    /// The certified intervals overlap at the current precision.
    Undecided,
}

impl Decision {
    pub fn is_definite(self) -> bool {
        !matches!(self, Decision::Undecided)
    }

    /// The boolean value of a definite decision.
    pub fn definite(self) -> Option<bool> {
        match self {
            Decision::True => Some(true),
            Decision::False => Some(false),
            Decision::Undecided => None,
        }
    }
}

impl From<bool> for Decision {
    fn from(value: bool) -> Self {
        if value {
            Decision::True
        } else {
            Decision::False
        }
    }
}

impl Not for Decision {
    type Output = Decision;

    fn not(self) -> Decision {
        match self {
            Decision::True => Decision::False,
            Decision::False => Decision::True,
            Decision::Undecided => Decision::Undecided,
        }
    }
}

impl BitAnd for Decision {
    type Output = Decision;

    fn bitand(self, rhs: Decision) -> Decision {
        match (self, rhs) {
            (Decision::False, _) | (_, Decision::False) => Decision::False,
            (Decision::True, Decision::True) => Decision::True,
            _ => Decision::Undecided,
        }
    }
}

impl BitOr for Decision {
    type Output = Decision;

    fn bitor(self, rhs: Decision) -> Decision {
        match (self, rhs) {
            (Decision::True, _) | (_, Decision::True) => Decision::True,
            (Decision::False, Decision::False) => Decision::False,
            _ => Decision::Undecided,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::True => write!(f, "true"),
            Decision::False => write!(f, "false"),
            Decision::Undecided => write!(f, "undecided"),
        }
    }
}

impl IterationContext {
    /// Branch on `decision`, restarting the round if it is undecided.
    ///
    /// The boolean is cached at the caller's site, so later rounds see the
    /// same answer even when their own comparison would come out
    /// differently near the boundary.
    #[track_caller]
    pub fn resolve(&mut self, decision: Decision) -> Flow<bool> {
        self.resolve_at(SiteKey::caller(), decision)
    }

    pub fn resolve_at(&mut self, site: SiteKey, decision: Decision) -> Flow<bool> {
        let request = self.working_precision();
        self.memoize(site, request, Precision::EXACT, |ctx| {
            ctx.settle(site, decision)
        })
    }

    /// Like [`resolve`](Self::resolve), but only runs the comparison when
    /// no earlier round settled this site.
    #[track_caller]
    pub fn resolve_with<F>(&mut self, compare: F) -> Flow<bool>
    where
        F: FnOnce(&mut Self) -> Flow<Decision>,
    {
        let site = SiteKey::caller();
        let request = self.working_precision();
        self.memoize(site, request, Precision::EXACT, |ctx| {
            let decision = compare(ctx)?;
            ctx.settle(site, decision)
        })
    }

    /// Index of the first definitely true alternative.
    ///
    /// Returns `None` when every alternative is definitely false and
    /// restarts when none is true but some are undecided.
    #[track_caller]
    pub fn choose(&mut self, alternatives: &[Decision]) -> Flow<Option<usize>> {
        let site = SiteKey::caller();
        let request = self.working_precision();
        self.memoize(site, request, Precision::EXACT, |ctx| {
            if let Some(index) = alternatives.iter().position(|d| *d == Decision::True) {
                return Ok(Some(index));
            }
            if alternatives.iter().all(|d| *d == Decision::False) {
                return Ok(None);
            }
            ctx.note_undecided();
            tracing::debug!(
                %site,
                alternatives = alternatives.len(),
                precision = %ctx.working_precision(),
                "no alternative decidable"
            );
            Err(ctx.restart())
        })
    }

    fn settle(&mut self, site: SiteKey, decision: Decision) -> Flow<bool> {
        match decision.definite() {
            Some(value) => Ok(value),
            None => {
                self.note_undecided();
                tracing::debug!(
                    %site,
                    iteration = self.iteration(),
                    precision = %self.working_precision(),
                    "undecided comparison"
                );
                Err(self.restart())
            }
        }
    }
}
