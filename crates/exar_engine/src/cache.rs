//! Cache registry and slots.
//!
//! Re-running a computation body at higher precision would recompute every
//! subexpression from scratch. The registry keeps, per call site, the last
//! value computed there together with the precision it was computed at; when
//! a later round asks the same site for a precision the stored value already
//! meets, the stored value is returned instead.
//!
//! # Slot identity
//!
//! A slot is identified by a [`SiteKey`] (where the request comes from) and
//! the occurrence number of that site within the current round. The
//! iteration context resets occurrence counters at the start of every round,
//! so the n-th execution of a site in round `k + 1` finds the slot created by
//! the n-th execution in round `k`. Slots are allocated once, on first use,
//! and looked up afterwards.
//!
//! # Lifetime
//!
//! One registry belongs to one top-level evaluation. Restarts never clear it
//! (that is the reuse opportunity); [`CacheRegistry::reset`] drops every slot
//! when the evaluation ends and bumps the generation so that a [`SlotId`]
//! handed out earlier can never observe a later evaluation's values.

use crate::precision::Precision;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::Location;

/// Where a cache request comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SiteKey {
    /// A source location, captured with `#[track_caller]`.
    Location(&'static Location<'static>),
    /// An explicit, caller-chosen name.
    Named(&'static str),
}

impl SiteKey {
    /// The location of the caller (through any `#[track_caller]` frames).
    #[track_caller]
    #[inline]
    pub fn caller() -> Self {
        SiteKey::Location(Location::caller())
    }

    #[inline]
    pub const fn named(name: &'static str) -> Self {
        SiteKey::Named(name)
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteKey::Location(loc) => write!(f, "{}:{}:{}", loc.file(), loc.line(), loc.column()),
            SiteKey::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Typed handle to a slot of a [`CacheRegistry`].
pub struct SlotId<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for SlotId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SlotId<T> {}

impl<T> fmt::Debug for SlotId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({}@{})", self.index, self.generation)
    }
}

impl<T> PartialEq for SlotId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for SlotId<T> {}

/// Cache counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub slots: u32,
    pub hits: u32,
    pub misses: u32,
    pub stores: u32,
}

struct SlotEntry {
    value: Option<Box<dyn Any>>,
    precision: Precision,
    iteration: u32,
}

/// All slots of one top-level evaluation.
pub struct CacheRegistry {
    entries: Vec<SlotEntry>,
    index: FxHashMap<(SiteKey, u32), u32>,
    generation: u32,
    stats: CacheStats,
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheRegistry {
    pub fn new() -> Self {
        CacheRegistry {
            entries: Vec::new(),
            index: FxHashMap::default(),
            generation: 0,
            stats: CacheStats::default(),
        }
    }

    /// Look up the slot of `(site, occurrence)`, allocating it on first use.
    pub fn slot<T: 'static>(&mut self, site: SiteKey, occurrence: u32) -> SlotId<T> {
        let next = self.entries.len() as u32;
        let index = *self.index.entry((site, occurrence)).or_insert(next);
        if index == next {
            self.entries.push(SlotEntry {
                value: None,
                precision: Precision::COARSEST,
                iteration: 0,
            });
            self.stats.slots += 1;
        }
        SlotId {
            index,
            generation: self.generation,
            _marker: PhantomData,
        }
    }

    /// The stored value, if it is at least as accurate as `precision`.
    ///
    /// `None` means the caller must compute at `precision` and [`store`] the
    /// result.
    ///
    /// [`store`]: CacheRegistry::store
    pub fn request<T: Clone + 'static>(&mut self, slot: SlotId<T>, precision: Precision) -> Option<T> {
        let hit = self.entry(slot).and_then(|entry| {
            if !entry.precision.satisfies(precision) {
                return None;
            }
            entry.value.as_ref()?.downcast_ref::<T>().cloned()
        });
        if hit.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        hit
    }

    /// Overwrite the slot with `value`, computed at `precision` during
    /// `iteration`. Stale handles are ignored.
    pub fn store<T: 'static>(&mut self, slot: SlotId<T>, value: T, precision: Precision, iteration: u32) {
        if slot.generation != self.generation {
            return;
        }
        if let Some(entry) = self.entries.get_mut(slot.index as usize) {
            entry.value = Some(Box::new(value));
            entry.precision = precision;
            entry.iteration = iteration;
            self.stats.stores += 1;
        }
    }

    /// Precision of the stored value, if any.
    pub fn stored_precision<T>(&self, slot: SlotId<T>) -> Option<Precision> {
        self.entry(slot)
            .filter(|e| e.value.is_some())
            .map(|e| e.precision)
    }

    /// Round in which the stored value was produced, if any.
    pub fn stored_iteration<T>(&self, slot: SlotId<T>) -> Option<u32> {
        self.entry(slot)
            .filter(|e| e.value.is_some())
            .map(|e| e.iteration)
    }

    /// Drop every slot and invalidate all outstanding handles.
    pub fn reset(&mut self) {
        if !self.entries.is_empty() {
            tracing::trace!(slots = self.entries.len(), "dropping cache registry");
        }
        self.entries.clear();
        self.index.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn entry<T>(&self, slot: SlotId<T>) -> Option<&SlotEntry> {
        if slot.generation != self.generation {
            return None;
        }
        self.entries.get(slot.index as usize)
    }
}

impl fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("slots", &self.entries.len())
            .field("generation", &self.generation)
            .field("stats", &self.stats)
            .finish()
    }
}
