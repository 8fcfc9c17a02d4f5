use std::collections::HashMap;

use log::trace;
use serde_derive::{Deserialize, Serialize};

use crate::types::budget::TableBudget;
use crate::types::errors::FibError;

//------------ NextHop -------------------------------------------------------

/// The forwarding decision for a route, an opaque 32-bit value.
///
/// The value `u32::MAX` is reserved as the [NextHop::NO_ENTRY] sentinel,
/// meaning "unrouted". Lookups return it for addresses without a matching
/// route, it cannot be used as the next hop of a route.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub struct NextHop(u32);

impl NextHop {
    pub const NO_ENTRY: NextHop = NextHop(u32::MAX);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn is_no_entry(self) -> bool {
        self.0 == u32::MAX
    }
}

impl From<u32> for NextHop {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<NextHop> for u32 {
    fn from(value: NextHop) -> Self {
        value.0
    }
}

impl std::fmt::Display for NextHop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_no_entry() {
            write!(f, "NO_ENTRY")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

//------------ Stored next hop indexes ---------------------------------------

/// Index of a next hop in the [NextHopTable].
pub type NextHopIdx = u32;

// Compiled tables never hold a next hop index directly. They hold the index
// plus one, so that a stored zero always means "no entry" (or "defer to the
// next level" where a level uses that), and never collides with index 0.
pub(crate) const STORED_NO_ENTRY: u32 = 0;

#[inline]
pub(crate) fn to_stored(idx: Option<NextHopIdx>) -> u32 {
    idx.map_or(STORED_NO_ENTRY, |i| i + 1)
}

// The hierarchical backend shifts stored values left by one to make room
// for its tag bit, so the largest index has to survive that.
const MAX_NEXT_HOPS: usize = (u32::MAX >> 2) as usize;

//------------ NextHopTable --------------------------------------------------

/// A deduplicated store of next hop values. Routes in the trie and all
/// compiled tables refer to next hops by their index in this table.
#[derive(Debug, Default)]
pub struct NextHopTable {
    hops: Vec<NextHop>,
    index: HashMap<NextHop, NextHopIdx>,
}

impl NextHopTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index of `value`, appending it to the table if it wasn't
    /// seen before.
    pub fn intern(&mut self, value: NextHop) -> Result<NextHopIdx, FibError> {
        if value.is_no_entry() {
            return Err(FibError::NextHopInvalid);
        }
        if let Some(idx) = self.index.get(&value) {
            return Ok(*idx);
        }
        if self.hops.len() >= MAX_NEXT_HOPS {
            return Err(FibError::OutOfMemory);
        }
        let idx = self.hops.len() as NextHopIdx;
        self.hops.push(value);
        self.index.insert(value, idx);
        trace!("interned next hop {} at index {}", value, idx);
        Ok(idx)
    }

    pub fn resolve(&self, idx: NextHopIdx) -> NextHop {
        self.hops
            .get(idx as usize)
            .copied()
            .unwrap_or(NextHop::NO_ENTRY)
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NextHop> + '_ {
        self.hops.iter().copied()
    }

    /// Copy the current values into an immutable array that a compiled
    /// table can carry with it, so that lookups never touch this table.
    pub(crate) fn freeze(
        &self,
        budget: &mut TableBudget,
    ) -> Result<FrozenNextHops, FibError> {
        let mut hops = budget.with_capacity(self.hops.len())?;
        hops.extend_from_slice(&self.hops);
        Ok(FrozenNextHops(hops.into_boxed_slice()))
    }
}

//------------ FrozenNextHops ------------------------------------------------

/// The next hop values as they were at commit time.
#[derive(Debug)]
pub(crate) struct FrozenNextHops(Box<[NextHop]>);

impl FrozenNextHops {
    /// Resolve a stored (index plus one) value.
    #[inline]
    pub(crate) fn resolve_stored(&self, stored: u32) -> NextHop {
        match stored.checked_sub(1) {
            Some(idx) => {
                self.0.get(idx as usize).copied().unwrap_or(NextHop::NO_ENTRY)
            }
            None => NextHop::NO_ENTRY,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn mem_size(&self) -> usize {
        std::mem::size_of_val(&*self.0)
    }
}
