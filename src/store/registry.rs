//! The weight registry and the put/get store API.
//!
//! One mutex guards the whole registry, and it is held for the full
//! duration of a put or get, including every page copy across the caller
//! boundary. That gives single-flight semantics: no two puts can race on a
//! name, and a get never observes a partially built blob. The cost is that
//! a slow copy blocks all unrelated store traffic.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::debug;

use crate::boundary::copy::{CopyBoundary, CopyFault, UserRange};
use crate::mem::pages::{PageError, PageProvider};
use crate::store::blob::{Blob, BuildError};
use crate::store::name::{NameError, WeightName};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid weight name: {0}")]
    InvalidName(#[from] NameError),

    #[error("weight '{0}' is already stored")]
    AlreadyExists(String),

    #[error("weight '{0}' not found")]
    NotFound(String),

    #[error("destination holds {have} bytes, stored weight is {need}")]
    BufferTooSmall { need: usize, have: usize },

    #[error("page allocation failed: {0}")]
    Allocation(#[from] PageError),

    #[error("boundary copy failed: {0}")]
    Copy(#[from] CopyFault),
}

impl From<BuildError> for StoreError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Allocation(e) => StoreError::Allocation(e),
            BuildError::Copy(e) => StoreError::Copy(e),
        }
    }
}

/// Point-in-time store statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    /// Number of stored weights.
    pub blobs: usize,
    /// Sum of declared blob lengths.
    pub bytes_stored: usize,
    /// Pages currently held by stored blobs.
    pub pages_live: usize,
    /// Page size in bytes.
    pub page_size: usize,
}

/// The name-keyed blob collection. Callers must hold the store lock; the
/// registry itself does no locking.
#[derive(Debug, Default)]
struct Registry {
    blobs: Vec<Blob>,
}

impl Registry {
    /// Linear scan by exact name. O(n) in stored blobs — fine while
    /// insertions are rare and the working set is small.
    fn find(&self, name: &WeightName) -> Option<&Blob> {
        self.blobs.iter().find(|b| b.name() == name)
    }

    /// Link a fully built blob. The caller has already verified the name is
    /// absent under the same lock acquisition.
    fn insert(&mut self, blob: Blob) {
        self.blobs.push(blob);
    }

    fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    fn bytes_stored(&self) -> usize {
        self.blobs.iter().map(|b| b.len()).sum()
    }
}

/// The process-wide weight store: append-only, name-unique, in-memory for
/// the lifetime of the process.
///
/// There is no update, delete, or eviction. A name moves from absent to
/// present exactly once; a failed put leaves it absent.
pub struct WeightStore {
    registry: Mutex<Registry>,
    pages: Arc<dyn PageProvider>,
}

impl WeightStore {
    pub fn new<P: PageProvider + 'static>(pages: Arc<P>) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            pages,
        }
    }

    /// Store `src.len` bytes from the caller under `name`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the name is taken, and
    /// propagates allocation and copy failures. Any failure fully rolls
    /// back: the partial page chain drops before the lock is released and
    /// the name remains absent.
    pub fn put<B: CopyBoundary + ?Sized>(
        &self,
        name: &str,
        src: UserRange,
        boundary: &B,
    ) -> Result<(), StoreError> {
        let name = WeightName::new(name)?;

        let mut registry = self.lock_registry();
        if registry.find(&name).is_some() {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        let blob = Blob::build(name, src.len, src.addr, &*self.pages, boundary)?;

        debug!(
            name = %blob.name(),
            size = blob.len(),
            chunks = blob.chunk_count(),
            "stored weight"
        );
        registry.insert(blob);
        Ok(())
    }

    /// Fetch the weight stored under `name` into the caller's buffer and
    /// return its stored length.
    ///
    /// A null or zero-length destination requests query mode: the stored
    /// length is returned and no data moves. A destination smaller than the
    /// stored length fails with [`StoreError::BufferTooSmall`] before any
    /// copy. A fault mid-copy leaves the destination partially written.
    pub fn get<B: CopyBoundary + ?Sized>(
        &self,
        name: &str,
        dst: UserRange,
        boundary: &mut B,
    ) -> Result<usize, StoreError> {
        let name = WeightName::new(name)?;

        let registry = self.lock_registry();
        let blob = registry
            .find(&name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        if dst.is_query() {
            return Ok(blob.len());
        }

        if dst.len < blob.len() {
            return Err(StoreError::BufferTooSmall {
                need: blob.len(),
                have: dst.len,
            });
        }

        blob.read_into(dst.addr, boundary)?;

        debug!(name = %name, size = blob.len(), "fetched weight");
        Ok(blob.len())
    }

    pub fn stats(&self) -> StoreStats {
        let registry = self.lock_registry();
        StoreStats {
            blobs: registry.blob_count(),
            bytes_stored: registry.bytes_stored(),
            pages_live: self.pages.live_pages(),
            page_size: self.pages.page_size(),
        }
    }

    /// Acquire the registry lock, recovering from poisoning. The registry
    /// is consistent at every panic point: its only mutation is the single
    /// insert of a fully built blob.
    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
