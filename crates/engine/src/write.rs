use block::{Block, Score, Transition};
use tracing::info;

use crate::{Engine, Error, Result};

impl Engine {
    /// Overwrites the score of `addr` and returns the previous value.
    ///
    /// Allocates the address's block on first use.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the block cannot be allocated.
    pub fn set(&self, addr: u32, value: Score) -> Result<Score> {
        let t = self.block_for_write(addr)?.write(addr::slot(addr), value);
        Ok(self.record(t).old)
    }

    /// Adds `delta` to the score of `addr`, saturating at the bounds, and
    /// returns the new value.
    pub fn increment(&self, addr: u32, delta: Score) -> Result<Score> {
        let t = self.block_for_write(addr)?.increment(addr::slot(addr), delta);
        Ok(self.record(t).new)
    }

    /// `increment(addr, -delta)`.
    pub fn decrement(&self, addr: u32, delta: Score) -> Result<Score> {
        self.increment(addr, -delta)
    }

    /// Zeroes the score of `addr`.
    ///
    /// Does not allocate: deleting inside an unwritten /24 is a no-op and
    /// [`get_ex`](Engine::get_ex) keeps reporting `None` for it. Always
    /// returns `true`.
    pub fn delete(&self, addr: u32) -> bool {
        if let Some(b) = self.dir.get(addr::block_id(addr)) {
            self.record(b.write(addr::slot(addr), Score::ZERO));
        }
        true
    }

    /// Applies each `(address, delta)` increment in order and returns how
    /// many were applied.
    ///
    /// Stops at the first allocation failure; increments before it stay
    /// applied.
    pub fn increment_batch(&self, batch: &[(u32, Score)]) -> Result<usize> {
        for &(addr, delta) in batch {
            self.increment(addr, delta)?;
        }
        Ok(batch.len())
    }

    /// Drops every block and resets all counters.
    pub fn clear(&mut self) {
        let blocks = self.block_count();
        self.dir.clear();
        *self.count.get_mut() = 0;
        info!(blocks, "engine cleared");
    }

    fn block_for_write(&self, addr: u32) -> Result<&Block> {
        self.dir
            .get_or_create(addr::block_id(addr))
            .map_err(|e| Error::OutOfMemory(e.what()))
    }

    fn record(&self, t: Transition) -> Transition {
        self.adjust_count(t.live_delta());
        t
    }
}
