//! Sparse two-level map from 24-bit block ids to [`Block`]s.
//!
//! ```text
//!   block_id (24 bits)
//!  ┌────────────────┬────────┐
//!  │ page (16 bits) │ 8 bits │
//!  └───────┬────────┴───┬────┘
//!          │            │
//!          ▼            ▼
//!   pages[65536] ──► Page[256] ──► Box<Block>
//! ```
//!
//! Every entry is a `OnceLock`: once published it never changes until the
//! directory is cleared through `&mut self`, so lookups are plain atomic
//! loads with no locking. Creation goes through a striped mutex array so
//! that two threads racing for the same id allocate exactly once, while
//! creations on other stripes proceed in parallel.

use block::Block;
use parking_lot::Mutex;
use std::collections::TryReserveError;
use std::mem::size_of;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

const PAGE_BITS: u32 = 8;
const PAGE_SLOTS: usize = 1 << PAGE_BITS;
const PAGE_COUNT: usize = 1 << (24 - PAGE_BITS);

type Page = Box<[OnceLock<Box<Block>>]>;

/// What [`Directory::get_or_create`] had to allocate.
#[derive(Debug)]
pub(crate) enum AllocFailure {
    Page,
    Block,
}

impl AllocFailure {
    pub(crate) fn what(&self) -> &'static str {
        match self {
            AllocFailure::Page => "directory page",
            AllocFailure::Block => "score block",
        }
    }
}

pub(crate) struct Directory {
    pages: Box<[OnceLock<Page>]>,
    stripes: Box<[Mutex<()>]>,
    page_count: AtomicUsize,
    block_count: AtomicUsize,
}

impl Directory {
    /// Allocates the top-level page table and `stripes` creation locks.
    pub(crate) fn try_new(stripes: usize) -> Result<Self, TryReserveError> {
        let stripes = stripes.max(1);

        let mut pages = Vec::new();
        pages.try_reserve_exact(PAGE_COUNT)?;
        pages.extend((0..PAGE_COUNT).map(|_| OnceLock::new()));

        let mut locks = Vec::new();
        locks.try_reserve_exact(stripes)?;
        locks.extend((0..stripes).map(|_| Mutex::new(())));

        Ok(Self {
            pages: pages.into_boxed_slice(),
            stripes: locks.into_boxed_slice(),
            page_count: AtomicUsize::new(0),
            block_count: AtomicUsize::new(0),
        })
    }

    /// Lock-free lookup. Never allocates.
    #[inline]
    pub(crate) fn get(&self, block_id: u32) -> Option<&Block> {
        let (page, idx) = split(block_id);
        self.pages[page].get()?[idx].get().map(|b| &**b)
    }

    /// Returns the block for `block_id`, allocating it (and its page) on
    /// first use.
    pub(crate) fn get_or_create(&self, block_id: u32) -> Result<&Block, AllocFailure> {
        if let Some(b) = self.get(block_id) {
            return Ok(b);
        }

        let (page, idx) = split(block_id);
        let cell = &self.page_or_create(page)?[idx];

        let _guard = self.stripe(block_id as usize).lock();
        if let Some(b) = cell.get() {
            return Ok(&**b);
        }
        let block = Block::try_new().map_err(|_| AllocFailure::Block)?;
        let block = cell.get_or_init(|| Box::new(block));
        self.block_count.fetch_add(1, Ordering::Relaxed);
        Ok(&**block)
    }

    fn page_or_create(&self, page: usize) -> Result<&Page, AllocFailure> {
        let cell = &self.pages[page];
        if let Some(p) = cell.get() {
            return Ok(p);
        }

        let _guard = self.stripe(page).lock();
        if let Some(p) = cell.get() {
            return Ok(p);
        }
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(PAGE_SLOTS)
            .map_err(|_| AllocFailure::Page)?;
        slots.extend((0..PAGE_SLOTS).map(|_| OnceLock::new()));
        let p = cell.get_or_init(|| slots.into_boxed_slice());
        self.page_count.fetch_add(1, Ordering::Relaxed);
        Ok(p)
    }

    #[inline]
    fn stripe(&self, key: usize) -> &Mutex<()> {
        &self.stripes[key % self.stripes.len()]
    }

    /// Iterates allocated blocks in ascending id order.
    ///
    /// The walk is lazy: blocks published behind the cursor while it runs
    /// are missed, blocks published ahead of it are seen.
    pub(crate) fn blocks(&self) -> impl Iterator<Item = (u32, &Block)> + '_ {
        self.pages
            .iter()
            .enumerate()
            .filter_map(|(p, cell)| cell.get().map(|page| (p, page)))
            .flat_map(|(p, page)| {
                page.iter().enumerate().filter_map(move |(i, cell)| {
                    cell.get().map(|b| (((p as u32) << PAGE_BITS) | i as u32, &**b))
                })
            })
    }

    /// Drops every block and page.
    pub(crate) fn clear(&mut self) {
        for cell in self.pages.iter_mut() {
            cell.take();
        }
        *self.page_count.get_mut() = 0;
        *self.block_count.get_mut() = 0;
    }

    pub(crate) fn block_count(&self) -> usize {
        self.block_count.load(Ordering::Relaxed)
    }

    pub(crate) fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Bytes held by the directory and every block it owns.
    pub(crate) fn memory_usage(&self) -> usize {
        let table = PAGE_COUNT * size_of::<OnceLock<Page>>()
            + self.stripes.len() * size_of::<Mutex<()>>();
        let pages = self.page_count.load(Ordering::Relaxed)
            * PAGE_SLOTS
            * size_of::<OnceLock<Box<Block>>>();
        let blocks = self.block_count() * Block::footprint();
        size_of::<Self>() + table + pages + blocks
    }
}

#[inline]
fn split(block_id: u32) -> (usize, usize) {
    (
        (block_id >> PAGE_BITS) as usize & (PAGE_COUNT - 1),
        block_id as usize & (PAGE_SLOTS - 1),
    )
}
