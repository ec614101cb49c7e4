//! Numeric call surface for the store.
//!
//! This is the contract clients program against when all they have is a
//! status integer: `weight_store` answers 0 or -1, `weight_load` answers
//! the stored size, -1, or -2. The typed [`StoreError`] detail is collapsed
//! here — already-exists, allocation failure, and copy fault all report the
//! same -1 — and surfaces only in the trace output.

use tracing::debug;

use crate::boundary::copy::{CopyBoundary, UserRange};
use crate::store::registry::{StoreError, WeightStore};

/// Operation completed.
pub const WEIGHT_OK: i64 = 0;
/// Name already present, allocation failure, copy fault, invalid name, or
/// (for loads) name absent.
pub const WEIGHT_ERR: i64 = -1;
/// Destination buffer smaller than the stored weight.
pub const WEIGHT_TOO_SMALL: i64 = -2;

/// Store `src.len` bytes from the caller under `name`.
///
/// Returns [`WEIGHT_OK`] or [`WEIGHT_ERR`].
pub fn weight_store<B: CopyBoundary + ?Sized>(
    store: &WeightStore,
    name: &str,
    src: UserRange,
    boundary: &B,
) -> i64 {
    match store.put(name, src, boundary) {
        Ok(()) => WEIGHT_OK,
        Err(err) => {
            debug!(name, %err, "weight_store failed");
            WEIGHT_ERR
        }
    }
}

/// Load the weight stored under `name` into the caller's buffer.
///
/// With a null or zero-length destination, returns the stored size without
/// copying. Otherwise returns the stored size after copying it, [`WEIGHT_ERR`]
/// if the name is absent or the copy faults, or [`WEIGHT_TOO_SMALL`] if the
/// destination cannot hold the stored weight.
pub fn weight_load<B: CopyBoundary + ?Sized>(
    store: &WeightStore,
    name: &str,
    dst: UserRange,
    boundary: &mut B,
) -> i64 {
    match store.get(name, dst, boundary) {
        Ok(size) => size as i64,
        Err(StoreError::BufferTooSmall { need, have }) => {
            debug!(name, need, have, "weight_load destination too small");
            WEIGHT_TOO_SMALL
        }
        Err(err) => {
            debug!(name, %err, "weight_load failed");
            WEIGHT_ERR
        }
    }
}
