//! # Engine - IPScore Reputation Store
//!
//! Ties the [`block`], [`archive`] and [`bulk`] crates together into a
//! concurrent in-memory map from every IPv4 address to a bounded score.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌──────────────────────────────────────────────────────┐
//! │                       ENGINE                         │
//! │                                                      │
//! │ read.rs  → Directory::get ─────────► Block::read     │
//! │            (lock-free)                (atomic load)  │
//! │                                                      │
//! │ write.rs → Directory::get_or_create ► Block::write   │
//! │            (stripe lock on miss)      (block guard)  │
//! │                 |                                    │
//! │                 └──► count ± live_delta              │
//! │                                                      │
//! │ decay.rs   → sweep every block under its own guard   │
//! │ persist.rs → archive save/load, bulk change feeds    │
//! │ handle.rs  → destroyable handle, text addresses      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module          | Purpose                                              |
//! |-----------------|------------------------------------------------------|
//! | `lib.rs`        | `Engine` struct, constructors, accessors, `Debug`    |
//! | `directory`     | two-level block map with striped creation locks      |
//! | `read`          | `get()`, `get_ex()`, `scores()`, `for_each()`         |
//! | `write`         | `set()`, `increment()`, `decrement()`, `delete()`, `clear()` |
//! | `decay`         | `decay()`                                            |
//! | `persist`       | `save()`, `load()`, `bulk_load_file()`, `bulk_load_buffer()` |
//! | [`handle`]      | [`EngineHandle`]: lifecycle and argument validation  |
//!
//! ## Memory
//!
//! Blocks are allocated on the first write into their /24 and kept until
//! [`Engine::clear`], even when every slot has returned to zero. Memory is
//! therefore proportional to the number of /24 networks ever written, not to
//! the size of the address space.
//!
//! ## Example
//!
//! ```rust
//! use block::Score;
//! use engine::Engine;
//!
//! let engine = Engine::new().unwrap();
//! let addr = addr::ip_to_u32("203.0.113.9");
//! engine.increment(addr, Score::new(10).unwrap()).unwrap();
//! assert_eq!(engine.get(addr).get(), 10);
//! assert_eq!(engine.get_ex(addr + 1), Some(Score::ZERO));
//! assert_eq!(engine.get_ex(0x0808_0808), None);
//! ```
mod decay;
mod directory;
mod error;
pub mod handle;
mod persist;
mod read;
mod write;

pub use block::Score;
pub use bulk::BulkStats;
pub use error::{Error, ErrorKind, Result};
pub use handle::EngineHandle;

use config::Config;
use directory::Directory;
use std::sync::atomic::{AtomicI64, Ordering};

/// Default number of stripes guarding block creation.
pub const DEFAULT_LOCK_STRIPES: usize = config::DEFAULT_LOCK_STRIPES;

/// Semantic version of this build.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Concurrent score store over the whole IPv4 space.
///
/// All score operations take `&self` and may be called from any number of
/// threads. [`clear`](Engine::clear) and [`load`](Engine::load) need
/// `&mut self`; share an [`EngineHandle`] when those must run alongside
/// other callers.
pub struct Engine {
    pub(crate) dir: Directory,
    /// Sum of block live counts. Updated after each block mutation, so it may
    /// dip below zero for an instant under contention; readers clamp.
    pub(crate) count: AtomicI64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("count", &self.count())
            .field("block_count", &self.block_count())
            .field("memory_usage", &self.memory_usage())
            .field("lock_stripes", &self.dir.stripe_count())
            .finish()
    }
}

impl Engine {
    /// Creates an empty engine with [`DEFAULT_LOCK_STRIPES`] stripes.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the directory table cannot be allocated.
    pub fn new() -> Result<Self> {
        Self::with_stripes(DEFAULT_LOCK_STRIPES)
    }

    /// Creates an empty engine with `stripes` block-creation locks
    /// (at least one).
    pub fn with_stripes(stripes: usize) -> Result<Self> {
        let dir = Directory::try_new(stripes).map_err(|_| Error::OutOfMemory("block directory"))?;
        Ok(Self {
            dir,
            count: AtomicI64::new(0),
        })
    }

    pub fn with_config(config: &Config) -> Result<Self> {
        Self::with_stripes(config.lock_stripes)
    }

    /// Number of addresses holding a non-zero score.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed).max(0) as u64
    }

    /// Number of allocated /24 blocks. Only [`clear`](Engine::clear) and
    /// [`load`](Engine::load) ever lower it.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.dir.block_count()
    }

    /// Approximate bytes owned by the engine.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.dir.memory_usage()
    }

    #[must_use]
    pub fn lock_stripes(&self) -> usize {
        self.dir.stripe_count()
    }

    pub(crate) fn adjust_count(&self, delta: i64) {
        if delta != 0 {
            self.count.fetch_add(delta, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests;
