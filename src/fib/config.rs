//------------ Config --------------------------------------------------------

//! Configuration options for the compiled tables of a FIB.
//!
//! A Configuration is created by picking the `*Config` struct that belongs
//! to the backend, instantiate it, set some fields on it, and pass it in as
//! an argument to [new_with_config](super::Fib::new_with_config).
//!
//! ```
//! use rotonda_fib::fib::{config::DxrConfig, Fib};
//! use rotonda_fib::Dxr;
//!
//! let config = DxrConfig::default().with_chunk_bits(16);
//! let fib = Fib::<Dxr>::new_with_config(config);
//! assert!(fib.is_ok());
//! ```
//!
//! The configurations can be (de)serialized with serde, so that they can
//! live in the router's configuration file.

use log::warn;
use serde_derive::{Deserialize, Serialize};

use crate::types::errors::FibError;

pub trait Config:
    Clone + Default + std::fmt::Debug + Send + Sync + 'static
{
    /// Returns the upper bound, in bytes, for the tables built by a single
    /// commit. `None` means the tables are only bounded by the allocator.
    fn memory_limit(&self) -> Option<usize>;
    /// Set the upper bound for the tables built by a single commit.
    fn set_memory_limit(&mut self, limit: Option<usize>);
    /// Check that all values are within their valid ranges.
    fn validate(&self) -> Result<(), FibError> {
        Ok(())
    }
}

//------------ DxrConfig -----------------------------------------------------

/// The default number of leading address bits that index the chunk table
/// of the range backend.
pub const DEFAULT_CHUNK_BITS: u8 = 18;
/// Chunks must be small enough for relative range starts to fit a u16, and
/// large enough for the chunk table to stay reasonably small.
pub const MIN_CHUNK_BITS: u8 = 16;
pub const MAX_CHUNK_BITS: u8 = 24;

/// The configuration for the range (DXR) backend.
///
/// The address space is cut into `2^chunk_bits` chunks of
/// `2^(32 - chunk_bits)` addresses each, every chunk searched on its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DxrConfig {
    pub chunk_bits: u8,
    pub memory_limit: Option<usize>,
}

impl DxrConfig {
    pub fn with_chunk_bits(mut self, chunk_bits: u8) -> Self {
        self.chunk_bits = chunk_bits;
        self
    }

    pub fn with_memory_limit(mut self, limit: usize) -> Self {
        self.memory_limit = Some(limit);
        self
    }
}

impl Config for DxrConfig {
    fn memory_limit(&self) -> Option<usize> {
        self.memory_limit
    }

    fn set_memory_limit(&mut self, limit: Option<usize>) {
        self.memory_limit = limit;
    }

    fn validate(&self) -> Result<(), FibError> {
        if !(MIN_CHUNK_BITS..=MAX_CHUNK_BITS).contains(&self.chunk_bits) {
            warn!(
                "chunk_bits {} is outside of {}..={}",
                self.chunk_bits, MIN_CHUNK_BITS, MAX_CHUNK_BITS
            );
            return Err(FibError::ConfigInvalid);
        }
        Ok(())
    }
}

impl Default for DxrConfig {
    fn default() -> Self {
        Self {
            chunk_bits: DEFAULT_CHUNK_BITS,
            memory_limit: None,
        }
    }
}

//------------ SailConfig ----------------------------------------------------

/// The configuration for the hierarchical (SAIL) backend. The level
/// boundaries are fixed at /16, /24 and /32.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SailConfig {
    pub memory_limit: Option<usize>,
}

impl SailConfig {
    pub fn with_memory_limit(mut self, limit: usize) -> Self {
        self.memory_limit = Some(limit);
        self
    }
}

impl Config for SailConfig {
    fn memory_limit(&self) -> Option<usize> {
        self.memory_limit
    }

    fn set_memory_limit(&mut self, limit: Option<usize>) {
        self.memory_limit = limit;
    }
}
