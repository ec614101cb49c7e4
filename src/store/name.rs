//! Validated weight identifiers.
//!
//! Names are bounded at construction time so the registry never has to
//! re-check lengths or scan for NUL bytes during lookup.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Maximum name length in bytes.
pub const MAX_NAME_LEN: usize = 63;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("weight name is empty")]
    Empty,

    #[error("weight name is {len} bytes, limit is {MAX_NAME_LEN}")]
    TooLong { len: usize },

    #[error("weight name contains a NUL byte")]
    EmbeddedNul,
}

/// A weight's identifier: 1 to [`MAX_NAME_LEN`] bytes, no NUL.
///
/// Unique within the registry; immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeightName(String);

impl WeightName {
    pub fn new(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong { len: name.len() });
        }
        if name.contains('\0') {
            return Err(NameError::EmbeddedNul);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeightName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WeightName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for WeightName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, NameError> {
        Self::new(s)
    }
}
