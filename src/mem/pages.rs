//! Fixed-size page allocation for blob storage.
//!
//! Blobs store their content as chains of pages handed out by a
//! [`PageProvider`]. Pages return themselves to the provider's accounting
//! when dropped, so teardown of a partially built chain is just dropping it.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("out of pages: {live} live, budget is {budget}")]
    OutOfPages { live: usize, budget: usize },
}

/// One fixed-size, zero-initialized page of blob storage.
///
/// Exclusively owned by the blob it belongs to. Dropping the page decrements
/// the provider's live count.
#[derive(Debug)]
pub struct Page {
    buf: Box<[u8]>,
    live: Arc<AtomicUsize>,
}

impl Deref for Page {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for Page {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Supplies fixed-size pages to the store.
///
/// Implementations decide where page memory comes from and how much of it
/// exists. The store only ever allocates; release happens when a [`Page`]
/// is dropped.
pub trait PageProvider: Send + Sync {
    /// Size of every page in bytes.
    fn page_size(&self) -> usize;

    /// Hand out one zeroed page, or fail when the budget is exhausted.
    fn allocate(&self) -> Result<Page, PageError>;

    /// Number of pages currently held by live blobs.
    fn live_pages(&self) -> usize;
}

/// Heap-backed page provider with an optional page budget.
///
/// A budget of 0 means unbounded. The budget models a finite physical
/// allocator, not a per-blob quota: once `max_pages` pages are live,
/// allocation fails until blobs are dropped.
#[derive(Debug)]
pub struct HeapPages {
    page_size: usize,
    max_pages: usize,
    live: Arc<AtomicUsize>,
}

impl HeapPages {
    /// Create an unbounded provider.
    pub fn new(page_size: usize) -> Self {
        Self::with_budget(page_size, 0)
    }

    /// Create a provider limited to `max_pages` live pages (0 = unbounded).
    pub fn with_budget(page_size: usize, max_pages: usize) -> Self {
        Self {
            page_size,
            max_pages,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The configured budget (0 = unbounded).
    pub fn budget(&self) -> usize {
        self.max_pages
    }
}

impl PageProvider for HeapPages {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn allocate(&self) -> Result<Page, PageError> {
        // Reserve the slot before allocating so concurrent callers cannot
        // overshoot the budget.
        let prev = self.live.fetch_add(1, Ordering::Relaxed);
        if self.max_pages > 0 && prev >= self.max_pages {
            self.live.fetch_sub(1, Ordering::Relaxed);
            return Err(PageError::OutOfPages {
                live: prev,
                budget: self.max_pages,
            });
        }

        trace!(live = prev + 1, "allocated page");

        Ok(Page {
            buf: vec![0u8; self.page_size].into_boxed_slice(),
            live: Arc::clone(&self.live),
        })
    }

    fn live_pages(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}
