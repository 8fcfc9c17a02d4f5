use std::mem::size_of;

use log::{debug, warn};

use crate::types::errors::FibError;

//------------ TableBudget ---------------------------------------------------
//
// Every allocation a commit makes for its tables goes through the budget.
// Allocations are made with `try_reserve_exact`, so that an allocator
// failure surfaces as `FibError::OutOfMemory` instead of an abort, and they
// are charged against the (optional) memory limit of the configuration.

#[derive(Debug)]
pub struct TableBudget {
    limit: Option<usize>,
    used: usize,
}

impl TableBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit, used: 0 }
    }

    /// The number of bytes charged so far.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Charge `bytes` against the limit without allocating. Used for memory
    /// that is allocated by other crates, e.g. bitmaps.
    pub fn charge(&mut self, bytes: usize) -> Result<(), FibError> {
        let used = self.used.checked_add(bytes).ok_or_else(|| {
            warn!("table size overflows usize");
            FibError::OutOfMemory
        })?;
        if let Some(limit) = self.limit {
            if used > limit {
                debug!(
                    "allocation of {} bytes exceeds limit ({} of {} used)",
                    bytes, self.used, limit
                );
                return Err(FibError::OutOfMemory);
            }
        }
        self.used = used;
        Ok(())
    }

    fn charge_items<T>(&mut self, items: usize) -> Result<(), FibError> {
        let bytes = items
            .checked_mul(size_of::<T>())
            .ok_or(FibError::OutOfMemory)?;
        self.charge(bytes)
    }

    /// An empty vec that can hold `capacity` items without reallocating.
    pub fn with_capacity<T>(
        &mut self,
        capacity: usize,
    ) -> Result<Vec<T>, FibError> {
        self.charge_items::<T>(capacity)?;
        let mut v = Vec::new();
        v.try_reserve_exact(capacity)?;
        Ok(v)
    }

    /// A vec of `len` copies of `fill`.
    pub fn filled<T: Clone>(
        &mut self,
        len: usize,
        fill: T,
    ) -> Result<Vec<T>, FibError> {
        let mut v = self.with_capacity(len)?;
        v.resize(len, fill);
        Ok(v)
    }

    /// Push onto a vec that was allocated through this budget, growing it
    /// (and charging for the growth) when it is full.
    pub fn push<T>(&mut self, v: &mut Vec<T>, item: T) -> Result<(), FibError> {
        if v.len() == v.capacity() {
            let additional = v.capacity().max(16);
            self.charge_items::<T>(additional)?;
            v.try_reserve_exact(additional)?;
        }
        v.push(item);
        Ok(())
    }
}
