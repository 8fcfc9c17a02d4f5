//! The range backend, after DXR[^1].
//!
//! The trie is flattened into the sorted list of disjoint address ranges
//! that each map to one next hop, covering the whole address space. The
//! list is cut into chunks of `2^(32 - chunk_bits)` addresses. A lookup
//! indexes the chunk table with the leading `chunk_bits` bits of the
//! address. A chunk that falls in one range holds its next hop directly,
//! any other chunk points at its own slice of the range array, which is
//! binary searched on the remaining bits.
//!
//! [^1]: <https://doi.org/10.1145/2317307.2317324>
mod build;

use log::debug;

use crate::fib::config::DxrConfig;
use crate::fib::{Backend, Config};
use crate::prefix_trie::PrefixTrie;
use crate::types::af::BITS;
use crate::types::errors::FibError;
use crate::types::stats::{BackendStats, TableStats};
use crate::types::{
    FrozenNextHops, NextHop, NextHopTable, TableBudget, STORED_NO_ENTRY,
};

//------------ Range ---------------------------------------------------------

/// An inclusive range of addresses that maps to a single next hop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Range {
    pub begin: u32,
    pub end: u32,
    pub nexthop: NextHop,
}

//------------ RangeEntry ----------------------------------------------------

// An entry in the range array: the start of a range relative to the start
// of its chunk, and its stored next hop. The range ends where the next entry
// of the chunk starts, or at the end of the chunk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RangeEntry {
    pub(crate) start: u16,
    pub(crate) nexthop: u32,
}

//------------ Chunk ---------------------------------------------------------

// A chunk descriptor. With a `len` of zero the chunk resolves directly and
// `base` is the stored next hop, otherwise the chunk's ranges are
// `entries[base..base + len]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub(crate) base: u32,
    pub(crate) len: u32,
}

impl Chunk {
    pub(crate) fn direct(stored: u32) -> Self {
        Self {
            base: stored,
            len: 0,
        }
    }

    pub(crate) fn is_direct(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn range(&self) -> std::ops::Range<usize> {
        self.base as usize..self.base as usize + self.len as usize
    }
}

//------------ Dxr -----------------------------------------------------------

#[derive(Debug)]
pub struct Dxr {
    chunks: Vec<Chunk>,
    entries: Vec<RangeEntry>,
    chunk_bits: u8,
    // 32 - chunk_bits
    shift: u32,
    low_mask: u32,
    nexthops: FrozenNextHops,
    direct_chunks: usize,
    range_chunks: usize,
    shared_chunks: usize,
}

impl Dxr {
    /// The stored (index plus one) next hop for `addr`.
    #[inline]
    pub(crate) fn lookup_stored(&self, addr: u32) -> u32 {
        let Some(chunk) = self.chunks.get((addr >> self.shift) as usize)
        else {
            return STORED_NO_ENTRY;
        };
        if chunk.is_direct() {
            return chunk.base;
        }
        let Some(entries) = self.entries.get(chunk.range()) else {
            return STORED_NO_ENTRY;
        };
        let low = (addr & self.low_mask) as u16;
        // The first entry of a chunk starts at 0, so there is always one
        // entry at or before `low`.
        let pos = entries.partition_point(|e| e.start <= low);
        entries
            .get(pos.wrapping_sub(1))
            .map_or(STORED_NO_ENTRY, |e| e.nexthop)
    }

    pub fn chunk_bits(&self) -> u8 {
        self.chunk_bits
    }

    /// The compiled range list: sorted, disjoint and covering all of
    /// `0..=u32::MAX`. Ranges are cut at chunk borders, so neighbouring
    /// ranges may have the same next hop.
    pub fn ranges(&self) -> Vec<Range> {
        let mut res = Vec::with_capacity(self.chunks.len());
        for (c, chunk) in self.chunks.iter().enumerate() {
            let chunk_start = (c as u32) << self.shift;
            let chunk_end = chunk_start | self.low_mask;
            if chunk.is_direct() {
                res.push(Range {
                    begin: chunk_start,
                    end: chunk_end,
                    nexthop: self.nexthops.resolve_stored(chunk.base),
                });
                continue;
            }
            let entries = self.entries.get(chunk.range()).unwrap_or(&[]);
            for (i, entry) in entries.iter().enumerate() {
                let end = entries.get(i + 1).map_or(chunk_end, |next| {
                    chunk_start | (next.start as u32).saturating_sub(1)
                });
                res.push(Range {
                    begin: chunk_start | entry.start as u32,
                    end,
                    nexthop: self.nexthops.resolve_stored(entry.nexthop),
                });
            }
        }
        res
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of_val(self.chunks.as_slice())
            + std::mem::size_of_val(self.entries.as_slice())
            + self.nexthops.mem_size()
    }
}

impl Backend for Dxr {
    type Config = DxrConfig;

    const NAME: &'static str = "dxr";

    fn compile(
        trie: &PrefixTrie,
        nexthops: &NextHopTable,
        config: &DxrConfig,
        budget: &mut TableBudget,
    ) -> Result<Self, FibError> {
        config.validate()?;
        let chunk_bits = config.chunk_bits;
        let shift = (BITS - chunk_bits) as u32;

        let bounds = build::flatten(trie, budget)?;
        debug!("dxr: {} ranges before chunking", bounds.len());
        let chunked = build::chunk(&bounds, chunk_bits, budget)?;
        drop(bounds);
        debug!(
            "dxr: {} chunks, {} range entries",
            chunked.chunks.len(),
            chunked.entries.len()
        );

        Ok(Self {
            chunks: chunked.chunks,
            entries: chunked.entries,
            chunk_bits,
            shift,
            low_mask: (1_u32 << shift) - 1,
            nexthops: nexthops.freeze(budget)?,
            direct_chunks: chunked.direct_chunks,
            range_chunks: chunked.range_chunks,
            shared_chunks: chunked.shared_chunks,
        })
    }

    #[inline]
    fn lookup(&self, addr: u32) -> NextHop {
        self.nexthops.resolve_stored(self.lookup_stored(addr))
    }

    fn stats(&self) -> TableStats {
        TableStats {
            backend: BackendStats::Dxr {
                chunk_bits: self.chunk_bits,
                direct_chunks: self.direct_chunks,
                range_chunks: self.range_chunks,
                shared_chunks: self.shared_chunks,
                range_entries: self.entries.len(),
            },
            next_hops: self.nexthops.len(),
            mem_size: self.mem_size(),
        }
    }
}
