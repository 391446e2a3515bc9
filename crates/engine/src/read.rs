use block::Score;
use std::ops::ControlFlow;

use crate::Engine;

impl Engine {
    /// Returns the score of `addr`, or `0` when nothing is known about it.
    ///
    /// Lock-free and never allocates.
    #[inline]
    pub fn get(&self, addr: u32) -> Score {
        self.dir
            .get(addr::block_id(addr))
            .map_or(Score::ZERO, |b| b.read(addr::slot(addr)))
    }

    /// Like [`get`](Engine::get), but tells absence apart from zero.
    ///
    /// Returns `None` when no block exists for the address's /24. Once any
    /// address in that /24 has been written, every address in it reports
    /// `Some`, including `Some(Score::ZERO)`.
    #[inline]
    pub fn get_ex(&self, addr: u32) -> Option<Score> {
        self.dir
            .get(addr::block_id(addr))
            .map(|b| b.read(addr::slot(addr)))
    }

    /// Iterates every non-zero `(address, score)` in ascending address order.
    ///
    /// Reads are lock-free; writes that race with the iteration may or may
    /// not be observed.
    pub fn scores(&self) -> impl Iterator<Item = (u32, Score)> + '_ {
        self.dir.blocks().flat_map(|(block_id, b)| {
            b.iter()
                .map(move |(slot, score)| (addr::join(block_id, slot), score))
        })
    }

    /// Calls `f` for every non-zero `(address, score)` in ascending address
    /// order until it returns [`ControlFlow::Break`].
    ///
    /// Returns how many entries were visited.
    pub fn for_each<F>(&self, mut f: F) -> u64
    where
        F: FnMut(u32, Score) -> ControlFlow<()>,
    {
        let mut visited = 0u64;
        for (addr, score) in self.scores() {
            visited += 1;
            if f(addr, score).is_break() {
                break;
            }
        }
        visited
    }
}
