//! The precision schedule.
//!
//! Working precisions are not chosen freely: they come from a fixed table
//! indexed by *step*. Step 1 is the initial precision; later steps add an
//! increment that itself grows by `factor^(1/4)` per step, so precision grows
//! geometrically (by `factor` every four steps) and the number of rounds
//! needed to reach `2^-n` is logarithmic in `n`.
//!
//! Step 0 is a sentinel for "coarser than any table entry" and is never used
//! as a working precision.

use crate::precision::Precision;

/// Maximum number of table entries, sentinel included.
pub const SCHEDULE_STEPS: usize = 512;

/// Steps advanced by one restart.
pub const RESTART_STRIDE: usize = 4;

/// The table ends before crossing this exponent.
const PRECISION_FLOOR: i64 = -(1 << 30);

/// Table of working precisions indexed by step.
#[derive(Clone, Debug)]
pub struct PrecisionSchedule {
    table: Vec<i32>,
}

impl PrecisionSchedule {
    /// Build the table.
    ///
    /// `increment` is the base number of bits added per step and `factor` the
    /// growth of the increment per four steps. Entries are strictly
    /// decreasing; generation stops at the first entry that would not be.
    pub fn new(initial: i32, increment: u32, factor: f64) -> Self {
        let base = i64::from(increment);
        let root = factor.sqrt().sqrt();
        let mut table = Vec::with_capacity(SCHEDULE_STEPS);
        table.push(i32::MAX);
        table.push(initial);

        let mut inc = -base;
        let mut last = i64::from(initial);
        while table.len() < SCHEDULE_STEPS {
            let next = i64::from(initial).saturating_add(inc);
            if next >= last || next < PRECISION_FLOOR {
                break;
            }
            table.push(next as i32);
            last = next;
            inc = ((inc as f64 * root) as i64).saturating_sub(base);
        }
        PrecisionSchedule { table }
    }

    /// Working precision at `step`, clamped to the table.
    pub fn precision(&self, step: usize) -> Precision {
        let step = step.clamp(1, self.last_step());
        Precision(self.table[step])
    }

    /// Index of the finest entry.
    pub fn last_step(&self) -> usize {
        self.table.len() - 1
    }

    /// Number of usable steps.
    pub fn len(&self) -> usize {
        self.table.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Step to use after a restart at `step`.
    ///
    /// Advances by [`RESTART_STRIDE`]. With a `target`, keeps advancing
    /// stride by stride until the target precision is reached or `max_strides`
    /// strides were taken. Past the end of the table the last step is used
    /// once; after that the schedule is exhausted and `None` is returned.
    pub fn advance(
        &self,
        step: usize,
        target: Option<Precision>,
        max_strides: u32,
    ) -> Option<usize> {
        let last = self.last_step();
        if step >= last {
            return None;
        }
        let mut next = step;
        let mut strides = 0;
        loop {
            next += RESTART_STRIDE;
            strides += 1;
            if next >= last {
                return Some(last);
            }
            match target {
                Some(t) if !self.precision(next).satisfies(t) && strides < max_strides => {}
                _ => return Some(next),
            }
        }
    }

    /// Step of a "relaxed" computation: half the current step.
    pub fn relaxed_step(step: usize) -> usize {
        (step + 1) / 2
    }

    /// Clamp an arbitrary step request into the table.
    pub fn clamp_step(&self, step: usize) -> usize {
        step.clamp(1, self.last_step())
    }
}

#[cfg(test)]
mod tests;
