//! Per-evaluation counters.

use crate::cache::CacheStats;
use crate::precision::Precision;
use std::fmt;

/// What one top-level evaluation cost.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvalStats {
    /// Rounds started, the successful one included.
    pub rounds: u32,
    /// Rounds that ended in a restart.
    pub restarts: u32,
    /// Undecided comparisons that triggered a restart.
    pub undecided: u32,
    /// Restarts absorbed locally by limit operators.
    pub local_restarts: u32,
    /// Schedule step of the last round.
    pub final_step: usize,
    /// Working precision of the last round.
    pub final_precision: Precision,
    pub cache: CacheStats,
}

impl Default for EvalStats {
    fn default() -> Self {
        EvalStats {
            rounds: 0,
            restarts: 0,
            undecided: 0,
            local_restarts: 0,
            final_step: 0,
            final_precision: Precision::COARSEST,
            cache: CacheStats::default(),
        }
    }
}

impl fmt::Display for EvalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rounds:            {}", self.rounds)?;
        writeln!(f, "restarts:          {}", self.restarts)?;
        writeln!(f, "undecided:         {}", self.undecided)?;
        writeln!(f, "local restarts:    {}", self.local_restarts)?;
        writeln!(
            f,
            "final precision:   {} [step {}]",
            self.final_precision, self.final_step
        )?;
        write!(
            f,
            "cache:             {} slots, {} hits, {} misses, {} stores",
            self.cache.slots, self.cache.hits, self.cache.misses, self.cache.stores
        )
    }
}
