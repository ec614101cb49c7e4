//! Resident memory management.
//!
//! - [`pages`]: fixed-size page allocation with budget accounting

pub mod pages;
