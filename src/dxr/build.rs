use log::trace;

use crate::prefix_trie::{PrefixTrie, TrieNode};
use crate::types::af::BITS;
use crate::types::errors::FibError;
use crate::types::{to_stored, TableBudget, STORED_NO_ENTRY};

use super::{Chunk, RangeEntry};

//------------ Flattening ----------------------------------------------------

// A boundary is the first address of a range, together with the stored next
// hop of that range. The range ends right before the next boundary, the
// last one at 255.255.255.255.
pub(super) type Boundary = (u32, u32);

/// Turn the trie into the sorted list of range boundaries covering the whole
/// address space. Consecutive ranges always have different next hops, gaps
/// between routes become explicit `NO_ENTRY` ranges.
pub(super) fn flatten(
    trie: &PrefixTrie,
    budget: &mut TableBudget,
) -> Result<Vec<Boundary>, FibError> {
    let mut bounds = budget.with_capacity(trie.len() * 2 + 1)?;
    walk(trie, trie.root(), 0, STORED_NO_ENTRY, &mut bounds, budget)?;
    trace!("flattened {} routes into {} ranges", trie.len(), bounds.len());
    Ok(bounds)
}

// In-order walk. `start` is the first address covered by `node`, `inherited`
// the next hop in effect for it from its ancestors. A missing child covers
// its half of the node with the node's own effective next hop.
fn walk(
    trie: &PrefixTrie,
    node: &TrieNode,
    start: u32,
    inherited: u32,
    bounds: &mut Vec<Boundary>,
    budget: &mut TableBudget,
) -> Result<(), FibError> {
    let effective = match node.nexthop() {
        Some(idx) => to_stored(Some(idx)),
        None => inherited,
    };
    if node.is_leaf() || node.depth() >= BITS {
        return mark(bounds, budget, start, effective);
    }

    let half = 1_u32 << (BITS - 1 - node.depth());
    for bit in 0..2 {
        let child_start = if bit == 0 { start } else { start | half };
        match node.child(bit).and_then(|id| trie.node(id)) {
            Some(child) => {
                walk(trie, child, child_start, effective, bounds, budget)?
            }
            None => mark(bounds, budget, child_start, effective)?,
        }
    }
    Ok(())
}

fn mark(
    bounds: &mut Vec<Boundary>,
    budget: &mut TableBudget,
    begin: u32,
    nexthop: u32,
) -> Result<(), FibError> {
    if bounds.last().is_some_and(|(_, nh)| *nh == nexthop) {
        return Ok(());
    }
    budget.push(bounds, (begin, nexthop))
}

//------------ Chunking ------------------------------------------------------

pub(super) struct Chunked {
    pub(super) chunks: Vec<Chunk>,
    pub(super) entries: Vec<RangeEntry>,
    pub(super) direct_chunks: usize,
    pub(super) range_chunks: usize,
    pub(super) shared_chunks: usize,
}

/// Cut the boundaries at every chunk border and build the chunk table.
///
/// A chunk that lies entirely within one range resolves directly. Any other
/// chunk gets a slice of the range array, starting with an entry at
/// relative address 0 for the range that reaches into the chunk from
/// before. A chunk whose slice equals the one of the chunk before it shares
/// that slice.
pub(super) fn chunk(
    bounds: &[Boundary],
    chunk_bits: u8,
    budget: &mut TableBudget,
) -> Result<Chunked, FibError> {
    let shift = (BITS - chunk_bits) as u32;
    let low_mask = (1_u32 << shift) - 1;
    let num_chunks = 1_usize << chunk_bits;

    let mut res = Chunked {
        chunks: budget.with_capacity(num_chunks)?,
        entries: budget.with_capacity(bounds.len())?,
        direct_chunks: 0,
        range_chunks: 0,
        shared_chunks: 0,
    };
    let mut prev = Chunk::direct(STORED_NO_ENTRY);
    // The boundary of the range that covers the start of the current chunk.
    let mut cur = 0;

    for c in 0..num_chunks {
        let chunk_start = (c as u32) << shift;
        while bounds.get(cur + 1).is_some_and(|(b, _)| *b <= chunk_start) {
            cur += 1;
        }
        let first = bounds.get(cur).map_or(STORED_NO_ENTRY, |(_, nh)| *nh);

        let offset = res.entries.len();
        budget.push(
            &mut res.entries,
            RangeEntry {
                start: 0,
                nexthop: first,
            },
        )?;
        let mut next = cur + 1;
        while let Some((begin, nexthop)) = bounds.get(next) {
            if (*begin >> shift) as usize != c {
                break;
            }
            budget.push(
                &mut res.entries,
                RangeEntry {
                    start: (begin & low_mask) as u16,
                    nexthop: *nexthop,
                },
            )?;
            next += 1;
        }

        let len = res.entries.len() - offset;
        let desc = if len == 1 {
            res.entries.truncate(offset);
            res.direct_chunks += 1;
            Chunk::direct(first)
        } else if !prev.is_direct()
            && res.entries.get(prev.range()) == res.entries.get(offset..)
        {
            res.entries.truncate(offset);
            res.shared_chunks += 1;
            prev
        } else {
            res.range_chunks += 1;
            Chunk {
                base: u32::try_from(offset)
                    .map_err(|_| FibError::OutOfMemory)?,
                len: u32::try_from(len).map_err(|_| FibError::OutOfMemory)?,
            }
        };
        budget.push(&mut res.chunks, desc)?;
        prev = desc;
    }

    Ok(res)
}
