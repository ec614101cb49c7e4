//! Caller buffer descriptors and the boundary-crossing copy capability.
//!
//! Callers never hand the store references into their memory. They describe
//! a range of their own address space ([`UserRange`]) and the surrounding
//! host supplies a [`CopyBoundary`] that validates the range and moves the
//! bytes. Data crossing the boundary is always copied, never aliased.

use thiserror::Error;

/// A byte range in the calling side's address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRange {
    /// Start address in the caller's space.
    pub addr: u64,
    /// Length in bytes.
    pub len: usize,
}

impl UserRange {
    pub fn new(addr: u64, len: usize) -> Self {
        Self { addr, len }
    }

    /// The null descriptor used to probe a blob's size without a copy.
    pub fn query() -> Self {
        Self { addr: 0, len: 0 }
    }

    /// A null address or zero length requests query mode: no data moves.
    pub fn is_query(&self) -> bool {
        self.addr == 0 || self.len == 0
    }
}

/// The caller's address range was not mapped or not fully accessible.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("caller range {addr:#x}..+{len} is not mapped")]
pub struct CopyFault {
    pub addr: u64,
    pub len: usize,
}

/// Moves bytes across the caller/store trust boundary.
///
/// Both directions validate that the full caller range is mapped before
/// copying. Implementations are supplied by the host environment; the store
/// never touches caller memory directly.
pub trait CopyBoundary {
    /// Copy `dst.len()` bytes from caller address `src` into `dst`.
    fn copy_in(&self, dst: &mut [u8], src: u64) -> Result<(), CopyFault>;

    /// Copy `src` to caller address `dst`.
    fn copy_out(&mut self, dst: u64, src: &[u8]) -> Result<(), CopyFault>;
}
