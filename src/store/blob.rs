//! Page-chunked storage of one named blob.
//!
//! A blob owns an ordered chain of fixed-size pages. The declared length,
//! not the page count, determines the valid byte count; the last page may
//! be only partially filled. Dropping the blob releases every page.

use thiserror::Error;
use tracing::trace;

use crate::boundary::copy::{CopyBoundary, CopyFault};
use crate::mem::pages::{Page, PageError, PageProvider};
use crate::store::name::WeightName;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Allocation(#[from] PageError),

    #[error(transparent)]
    Copy(#[from] CopyFault),
}

/// One stored weight: name, declared length, and the owned page chain.
///
/// Immutable once built. Concatenating the pages and truncating to `len`
/// reproduces exactly the bytes supplied at creation.
#[derive(Debug)]
pub struct Blob {
    name: WeightName,
    len: usize,
    chunks: Vec<Page>,
}

impl Blob {
    /// Build a blob by pulling `len` bytes from caller address `src_addr`,
    /// one page at a time.
    ///
    /// On any allocation or copy failure the pages acquired so far are
    /// released when the partial chain drops; the caller observes only the
    /// error, never a half-built blob.
    pub(crate) fn build<B: CopyBoundary + ?Sized>(
        name: WeightName,
        len: usize,
        src_addr: u64,
        provider: &dyn PageProvider,
        boundary: &B,
    ) -> Result<Self, BuildError> {
        let page_size = provider.page_size();
        let mut chunks = Vec::with_capacity(len.div_ceil(page_size));

        let mut remaining = len;
        let mut src = src_addr;
        while remaining > 0 {
            let mut page = provider.allocate()?;
            let n = remaining.min(page_size);
            boundary.copy_in(&mut page[..n], src)?;
            chunks.push(page);
            src += n as u64;
            remaining -= n;
        }

        trace!(name = %name, len, chunks = chunks.len(), "built blob");

        Ok(Self { name, len, chunks })
    }

    /// Copy the blob's content to caller address `dst_addr`, page by page.
    ///
    /// A fault partway through leaves the destination partially written;
    /// the caller sees only the fault, with no indication of progress.
    pub(crate) fn read_into<B: CopyBoundary + ?Sized>(
        &self,
        dst_addr: u64,
        boundary: &mut B,
    ) -> Result<(), CopyFault> {
        let mut remaining = self.len;
        let mut dst = dst_addr;
        for page in &self.chunks {
            if remaining == 0 {
                break;
            }
            let n = remaining.min(page.len());
            boundary.copy_out(dst, &page[..n])?;
            dst += n as u64;
            remaining -= n;
        }
        Ok(())
    }

    pub fn name(&self) -> &WeightName {
        &self.name
    }

    /// Declared byte length.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::vm::VmSpace;
    use crate::mem::pages::HeapPages;

    const BASE: u64 = 0x4000;

    fn name(s: &str) -> WeightName {
        WeightName::new(s).unwrap()
    }

    fn build_from(data: &[u8], pages: &HeapPages) -> Result<Blob, BuildError> {
        let vm = VmSpace::from_bytes(BASE, data.to_vec());
        Blob::build(name("w"), data.len(), BASE, pages, &vm)
    }

    #[test]
    fn test_build_and_read_back() {
        let pages = HeapPages::new(16);
        let data: Vec<u8> = (0u8..40).collect();

        let blob = build_from(&data, &pages).unwrap();
        assert_eq!(blob.len(), 40);
        assert_eq!(blob.chunk_count(), 3); // 16 + 16 + 8

        let mut dst = VmSpace::new(BASE, 40);
        blob.read_into(BASE, &mut dst).unwrap();
        assert_eq!(dst.as_slice(), &data[..]);
    }

    #[test]
    fn test_page_boundary_lengths() {
        let pages = HeapPages::new(16);

        for len in [15usize, 16, 17] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let blob = build_from(&data, &pages).unwrap();
            assert_eq!(blob.chunk_count(), len.div_ceil(16));

            let mut dst = VmSpace::new(BASE, len);
            blob.read_into(BASE, &mut dst).unwrap();
            assert_eq!(dst.as_slice(), &data[..], "length {len} round trip");
        }
    }

    #[test]
    fn test_empty_blob_has_no_pages() {
        let pages = HeapPages::new(16);
        let blob = build_from(&[], &pages).unwrap();
        assert_eq!(blob.chunk_count(), 0);
        assert!(blob.is_empty());
        assert_eq!(pages.live_pages(), 0);
    }

    #[test]
    fn test_allocation_failure_releases_pages() {
        let pages = HeapPages::with_budget(16, 2);
        let data = vec![7u8; 48]; // needs 3 pages

        let err = build_from(&data, &pages).unwrap_err();
        assert!(matches!(err, BuildError::Allocation(_)));
        assert_eq!(pages.live_pages(), 0);
    }

    #[test]
    fn test_copy_fault_releases_pages() {
        let pages = HeapPages::new(16);

        // Caller claims 48 bytes but only 20 are mapped: the second page
        // copy faults after the first page was filled.
        let vm = VmSpace::from_bytes(BASE, vec![1u8; 20]);
        let err = Blob::build(name("w"), 48, BASE, &pages, &vm).unwrap_err();
        assert!(matches!(err, BuildError::Copy(_)));
        assert_eq!(pages.live_pages(), 0);
    }

    #[test]
    fn test_drop_releases_pages() {
        let pages = HeapPages::new(16);
        let blob = build_from(&[9u8; 33], &pages).unwrap();
        assert_eq!(pages.live_pages(), 3);
        drop(blob);
        assert_eq!(pages.live_pages(), 0);
    }
}
