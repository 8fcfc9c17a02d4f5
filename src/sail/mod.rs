//! The hierarchical backend, after SAIL[^1].
//!
//! The address space is split into three directly indexed levels at /16,
//! /24 and /32. Only the parts of the address space that hold more specific
//! routes get expanded into the next level, so every lookup reads one, two
//! or three levels, never more:
//!
//! - Level 16: one entry for each /16. The lowest bit is a tag: with the tag
//!   cleared the rest of the entry is the stored next hop for the whole
//!   /16, with the tag set it is the level 24 block number plus one.
//! - Level 24: blocks of 256 slots, one block per expanded /16. A non-zero
//!   slot is the stored next hop for its /24. A zero slot defers to level
//!   32 through the level 32 block number (plus one) kept at the same
//!   position in the parallel `c24` array. If that is zero as well the /24
//!   has no route.
//! - Level 32: blocks of 256 slots, one block per expanded /24, each slot
//!   holding the stored next hop for a single address.
//!
//! [^1]: <https://doi.org/10.1145/2619239.2626297>
mod build;

use log::debug;

use crate::fib::config::SailConfig;
use crate::fib::{Backend, Config};
use crate::prefix_trie::PrefixTrie;
use crate::types::errors::FibError;
use crate::types::stats::{BackendStats, TableStats};
use crate::types::{
    FrozenNextHops, NextHop, NextHopTable, TableBudget, STORED_NO_ENTRY,
};

pub(crate) const L16_ENTRIES: usize = 1 << 16;
pub(crate) const BLOCK_SIZE: usize = 256;

// The tag bit of a level 16 entry.
pub(crate) const L16_EXPANDED: u32 = 1;

#[derive(Debug)]
pub struct Sail {
    l16: Vec<u32>,
    l24: Vec<u32>,
    c24: Vec<u32>,
    l32: Vec<u32>,
    nexthops: FrozenNextHops,
}

impl Sail {
    /// The stored (index plus one) next hop for `addr`, and the number of
    /// levels that were read to find it.
    #[inline]
    pub fn lookup_depth(&self, addr: u32) -> (u32, u8) {
        let e16 = self.l16.get((addr >> 16) as usize).copied().unwrap_or(0);
        if e16 & L16_EXPANDED == 0 {
            return (e16 >> 1, 1);
        }

        let block = ((e16 >> 1) as usize).saturating_sub(1);
        let slot = block * BLOCK_SIZE + ((addr >> 8) & 0xff) as usize;
        let v = self.l24.get(slot).copied().unwrap_or(STORED_NO_ENTRY);
        if v != STORED_NO_ENTRY {
            return (v, 2);
        }
        let Some(block) = self
            .c24
            .get(slot)
            .and_then(|b| (*b as usize).checked_sub(1))
        else {
            return (STORED_NO_ENTRY, 2);
        };

        let slot = block * BLOCK_SIZE + (addr & 0xff) as usize;
        (self.l32.get(slot).copied().unwrap_or(STORED_NO_ENTRY), 3)
    }

    /// The number of expanded /16s.
    pub fn l24_blocks(&self) -> usize {
        self.l24.len() / BLOCK_SIZE
    }

    /// The number of expanded /24s.
    pub fn l32_blocks(&self) -> usize {
        self.l32.len() / BLOCK_SIZE
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of_val(self.l16.as_slice())
            + std::mem::size_of_val(self.l24.as_slice())
            + std::mem::size_of_val(self.c24.as_slice())
            + std::mem::size_of_val(self.l32.as_slice())
            + self.nexthops.mem_size()
    }
}

impl Backend for Sail {
    type Config = SailConfig;

    const NAME: &'static str = "sail";

    fn compile(
        trie: &PrefixTrie,
        nexthops: &NextHopTable,
        config: &SailConfig,
        budget: &mut TableBudget,
    ) -> Result<Self, FibError> {
        config.validate()?;

        let mut marks = build::mark(trie, budget)?;
        debug!(
            "sail: {} /16s and {} /24s need expansion",
            marks.m16.len(),
            marks.m24.len()
        );
        marks.check();

        let l16 = build::level16(trie, &marks, budget)?;
        let (l24, c24, expanded) = build::level24(trie, &marks, budget)?;
        let l32 = build::level32(trie, &expanded, budget)?;
        debug!(
            "sail: {} level 24 blocks, {} level 32 blocks",
            l24.len() / BLOCK_SIZE,
            l32.len() / BLOCK_SIZE
        );

        Ok(Self {
            l16,
            l24,
            c24,
            l32,
            nexthops: nexthops.freeze(budget)?,
        })
    }

    #[inline]
    fn lookup(&self, addr: u32) -> NextHop {
        self.nexthops.resolve_stored(self.lookup_depth(addr).0)
    }

    fn stats(&self) -> TableStats {
        TableStats {
            backend: BackendStats::Sail {
                l24_blocks: self.l24_blocks(),
                l32_blocks: self.l32_blocks(),
            },
            next_hops: self.nexthops.len(),
            mem_size: self.mem_size(),
        }
    }
}
