//! # Block - /24 Score Storage
//!
//! A [`Block`] holds the [`Score`]s of the 256 hosts of one /24 network.
//!
//! ## Concurrency
//!
//! ```text
//!   readers ──► AtomicI16 load (Acquire) ──────────────► never block
//!
//!   writers ──► guard.lock() ─► load ─► compute ─► store (Release)
//!                               └─► live-count ± 1 ─► unlock
//! ```
//!
//! All 256 slots share one guard, so two writers to the same /24 serialize
//! while writers to different blocks never touch each other. The live count
//! is only modified while the guard is held, which keeps it exact.
//!
//! ## Example
//!
//! ```rust
//! use block::{Block, Score};
//!
//! let b = Block::new();
//! let t = b.write(7, Score::new(100).unwrap());
//! assert_eq!(t.old, Score::ZERO);
//! assert_eq!(b.read(7).get(), 100);
//! assert_eq!(b.live(), 1);
//! ```

mod score;

pub use score::{Score, ScoreError};

use parking_lot::Mutex;
use std::collections::TryReserveError;
use std::mem::size_of;
use std::sync::atomic::{AtomicI16, AtomicU32, Ordering};

/// Number of host slots in a block (one /24).
pub const SLOTS: usize = 256;

/// Before/after values of a single slot mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub old: Score,
    pub new: Score,
}

impl Transition {
    /// Change in the number of non-zero slots caused by this mutation:
    /// `+1` when a zero slot became non-zero, `-1` for the reverse, else `0`.
    #[must_use]
    pub fn live_delta(&self) -> i64 {
        match (self.old.is_zero(), self.new.is_zero()) {
            (true, false) => 1,
            (false, true) => -1,
            _ => 0,
        }
    }
}

/// Result of decaying one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayOutcome {
    /// Slots whose stored value changed (deletions included).
    pub modified: u32,
    /// Slots that became zero.
    pub zeroed: u32,
}

/// Fixed array of 256 scores with one write guard and a live-entry counter.
pub struct Block {
    guard: Mutex<()>,
    live: AtomicU32,
    scores: Box<[AtomicI16]>,
}

impl Block {
    /// Allocates a zeroed block, reporting allocation failure instead of
    /// aborting.
    pub fn try_new() -> Result<Self, TryReserveError> {
        let mut scores = Vec::new();
        scores.try_reserve_exact(SLOTS)?;
        scores.extend((0..SLOTS).map(|_| AtomicI16::new(0)));
        Ok(Self {
            guard: Mutex::new(()),
            live: AtomicU32::new(0),
            scores: scores.into_boxed_slice(),
        })
    }

    pub fn new() -> Self {
        Self {
            guard: Mutex::new(()),
            live: AtomicU32::new(0),
            scores: (0..SLOTS).map(|_| AtomicI16::new(0)).collect(),
        }
    }

    /// Heap plus inline bytes owned by one block.
    #[must_use]
    pub const fn footprint() -> usize {
        size_of::<Block>() + SLOTS * size_of::<AtomicI16>()
    }

    /// Lock-free read of a slot, including zero.
    #[inline]
    pub fn read(&self, slot: u8) -> Score {
        Score::from_raw(self.scores[slot as usize].load(Ordering::Acquire))
    }

    /// Overwrites a slot. `Transition::old` is the previous value.
    pub fn write(&self, slot: u8, value: Score) -> Transition {
        self.update(slot, |_| value)
    }

    /// Adds `delta` to a slot with saturation. `Transition::new` is the
    /// resulting value.
    pub fn increment(&self, slot: u8, delta: Score) -> Transition {
        self.update(slot, |old| old.saturating_add(delta))
    }

    /// Number of non-zero slots.
    #[inline]
    pub fn live(&self) -> u32 {
        self.live.load(Ordering::Relaxed)
    }

    /// Decays every non-zero slot under a single guard acquisition.
    ///
    /// See [`Score::decayed`] for the per-slot rule.
    pub fn decay(&self, factor: f64, deadzone: u16) -> DecayOutcome {
        let _guard = self.guard.lock();
        let mut outcome = DecayOutcome::default();

        for cell in self.scores.iter() {
            let old = Score::from_raw(cell.load(Ordering::Relaxed));
            if old.is_zero() {
                continue;
            }
            let new = old.decayed(factor, deadzone);
            if new == old {
                continue;
            }
            cell.store(new.get(), Ordering::Release);
            outcome.modified += 1;
            if new.is_zero() {
                outcome.zeroed += 1;
            }
        }

        if outcome.zeroed > 0 {
            self.live.fetch_sub(outcome.zeroed, Ordering::Relaxed);
        }
        outcome
    }

    /// Lock-free iterator over `(slot, score)` for every non-zero slot, in
    /// slot order. Concurrent writes may or may not be observed.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Score)> + '_ {
        self.scores.iter().enumerate().filter_map(|(slot, cell)| {
            let score = Score::from_raw(cell.load(Ordering::Acquire));
            (!score.is_zero()).then_some((slot as u8, score))
        })
    }

    fn update<F>(&self, slot: u8, f: F) -> Transition
    where
        F: FnOnce(Score) -> Score,
    {
        let _guard = self.guard.lock();
        let cell = &self.scores[slot as usize];

        let old = Score::from_raw(cell.load(Ordering::Relaxed));
        let new = f(old);
        if new != old {
            cell.store(new.get(), Ordering::Release);
        }

        let t = Transition { old, new };
        match t.live_delta() {
            1 => {
                self.live.fetch_add(1, Ordering::Relaxed);
            }
            -1 => {
                self.live.fetch_sub(1, Ordering::Relaxed);
            }
            _ => {}
        }
        t
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block").field("live", &self.live()).finish()
    }
}
