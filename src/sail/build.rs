use log::{error, trace};
use roaring::RoaringBitmap;

use crate::prefix_trie::{PrefixTrie, TrieNode};
use crate::types::errors::FibError;
use crate::types::{to_stored, TableBudget, STORED_NO_ENTRY};

use super::{BLOCK_SIZE, L16_ENTRIES, L16_EXPANDED};

//------------ Marks ---------------------------------------------------------

// The /16s (by their 16 leading bits) and /24s (by their 24 leading bits)
// that hold more specific routes and therefore need a block in the next
// level.
#[derive(Debug, Default)]
pub(super) struct Marks {
    pub(super) m16: RoaringBitmap,
    pub(super) m24: RoaringBitmap,
}

impl Marks {
    // A /24 can only need expansion if its /16 does. If that doesn't hold
    // the /24 is dropped, and its addresses resolve at level 16.
    pub(super) fn check(&mut self) {
        let orphans: Vec<u32> = self
            .m24
            .iter()
            .filter(|i24| !self.m16.contains(i24 >> 8))
            .collect();
        debug_assert!(
            orphans.is_empty(),
            "/24s marked under an unmarked /16: {:?}",
            orphans
        );
        for i24 in orphans {
            error!(
                "{}/24 needs expansion, but its /16 is resolved directly",
                std::net::Ipv4Addr::from(i24 << 8)
            );
            self.m24.remove(i24);
        }
    }
}

/// Walk the trie down to depth 25, marking the /16 of every node deeper than
/// 16, and the /24 of every node deeper than 24.
pub(super) fn mark(
    trie: &PrefixTrie,
    budget: &mut TableBudget,
) -> Result<Marks, FibError> {
    let mut marks = Marks::default();
    mark_node(trie, trie.root(), 0, &mut marks);
    budget.charge(
        marks.m16.serialized_size() + marks.m24.serialized_size(),
    )?;
    Ok(marks)
}

fn mark_node(
    trie: &PrefixTrie,
    node: &TrieNode,
    prefix: u32,
    marks: &mut Marks,
) {
    let depth = node.depth();
    if depth > 16 {
        marks.m16.insert(prefix >> 16);
    }
    if depth > 24 {
        // Everything below lives in the same /24.
        marks.m24.insert(prefix >> 8);
        return;
    }
    for bit in 0..2 {
        if let Some(child) = node.child(bit).and_then(|id| trie.node(id)) {
            let child_prefix = if bit == 0 {
                prefix
            } else {
                prefix | (1 << (31 - depth as u32))
            };
            mark_node(trie, child, child_prefix, marks);
        }
    }
}

//------------ Levels --------------------------------------------------------

/// Level 16: the level 24 block number (plus one) with the tag bit set for
/// every marked /16, the stored next hop of the /16 otherwise. Blocks are
/// numbered in address order.
pub(super) fn level16(
    trie: &PrefixTrie,
    marks: &Marks,
    budget: &mut TableBudget,
) -> Result<Vec<u32>, FibError> {
    let mut l16 = budget.filled(L16_ENTRIES, 0_u32)?;
    let mut blocks = 0_u32;
    for (i16, entry) in (0_u32..).zip(l16.iter_mut()) {
        *entry = if marks.m16.contains(i16) {
            blocks += 1;
            (blocks << 1) | L16_EXPANDED
        } else {
            to_stored(trie.longest_match(i16 << 16, 16)) << 1
        };
    }
    trace!("level 16: {} entries, {} expanded", L16_ENTRIES, blocks);
    Ok(l16)
}

/// Level 24, one block per marked /16, in address order. Returns the level
/// 24 slots, the parallel level 32 block numbers (plus one), and the /24s
/// that got a level 32 block, in block order.
#[allow(clippy::type_complexity)]
pub(super) fn level24(
    trie: &PrefixTrie,
    marks: &Marks,
    budget: &mut TableBudget,
) -> Result<(Vec<u32>, Vec<u32>, Vec<u32>), FibError> {
    let slots = (marks.m16.len() as usize)
        .checked_mul(BLOCK_SIZE)
        .ok_or(FibError::OutOfMemory)?;
    let mut l24 = budget.filled(slots, STORED_NO_ENTRY)?;
    let mut c24 = budget.filled(slots, 0_u32)?;
    let mut expanded = budget.with_capacity(marks.m24.len() as usize)?;

    for ((l24_block, c24_block), i16) in l24
        .chunks_exact_mut(BLOCK_SIZE)
        .zip(c24.chunks_exact_mut(BLOCK_SIZE))
        .zip(marks.m16.iter())
    {
        for (octet, (slot, l32_block)) in
            (0_u32..).zip(l24_block.iter_mut().zip(c24_block.iter_mut()))
        {
            let i24 = (i16 << 8) | octet;
            if marks.m24.contains(i24) {
                budget.push(&mut expanded, i24)?;
                *slot = STORED_NO_ENTRY;
                *l32_block = u32::try_from(expanded.len())
                    .map_err(|_| FibError::OutOfMemory)?;
            } else {
                *slot = to_stored(trie.longest_match(i24 << 8, 24));
            }
        }
    }
    trace!(
        "level 24: {} blocks, {} /24s deferred",
        slots / BLOCK_SIZE,
        expanded.len()
    );
    Ok((l24, c24, expanded))
}

/// Level 32, one block per expanded /24, in the order of `expanded`.
pub(super) fn level32(
    trie: &PrefixTrie,
    expanded: &[u32],
    budget: &mut TableBudget,
) -> Result<Vec<u32>, FibError> {
    let slots = expanded
        .len()
        .checked_mul(BLOCK_SIZE)
        .ok_or(FibError::OutOfMemory)?;
    let mut l32 = budget.filled(slots, STORED_NO_ENTRY)?;
    for (block, i24) in l32.chunks_exact_mut(BLOCK_SIZE).zip(expanded) {
        for (octet, slot) in (0_u32..).zip(block.iter_mut()) {
            *slot = to_stored(trie.longest_match((i24 << 8) | octet, 32));
        }
    }
    trace!("level 32: {} blocks", expanded.len());
    Ok(l32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie_of(routes: &[(u32, u8)]) -> Result<PrefixTrie, FibError> {
        let mut trie = PrefixTrie::new();
        for (i, (prefix, len)) in (0_u32..).zip(routes) {
            trie.insert(*prefix, *len, i)?;
        }
        Ok(trie)
    }

    #[test]
    fn marks_by_depth() -> Result<(), FibError> {
        let trie = trie_of(&[
            (0x0a00_0000, 8),
            (0x0a01_0000, 16),
            (0x0a02_0000, 17),
            (0x0a03_0400, 24),
            (0x0a04_0500, 25),
            (0xc0a8_0101, 32),
        ])?;
        let marks = mark(&trie, &mut TableBudget::new(None))?;
        assert_eq!(
            marks.m16.iter().collect::<Vec<_>>(),
            vec![0x0a02, 0x0a03, 0x0a04, 0xc0a8]
        );
        assert_eq!(
            marks.m24.iter().collect::<Vec<_>>(),
            vec![0x0a_0405, 0xc0_a801]
        );
        Ok(())
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic)]
    fn orphaned_24_is_dropped() {
        let mut marks = Marks::default();
        marks.m16.insert(0x0a01);
        marks.m24.insert(0x0a_0101);
        marks.m24.insert(0x0a_0201);
        marks.check();
        assert_eq!(marks.m24.iter().collect::<Vec<_>>(), vec![0x0a_0101]);
    }

    #[test]
    fn level16_tags_expanded_entries() -> Result<(), FibError> {
        let trie = trie_of(&[(0, 0), (0x0a01_0100, 24), (0x0b01_0100, 24)])?;
        let mut budget = TableBudget::new(None);
        let marks = mark(&trie, &mut budget)?;
        let l16 = level16(&trie, &marks, &mut budget)?;
        assert_eq!(l16.len(), L16_ENTRIES);
        // Default route, index 0, stored as 1, untagged.
        assert_eq!(l16.first(), Some(&(1 << 1)));
        assert_eq!(l16.get(0x0a01), Some(&((1 << 1) | L16_EXPANDED)));
        assert_eq!(l16.get(0x0b01), Some(&((2 << 1) | L16_EXPANDED)));
        assert_eq!(l16.get(0x0b02), Some(&(1 << 1)));
        Ok(())
    }

    #[test]
    fn memory_limit_applies() -> Result<(), FibError> {
        let trie = trie_of(&[(0x0a01_0100, 24)])?;
        let mut budget = TableBudget::new(Some(1024));
        let marks = mark(&trie, &mut budget)?;
        assert_eq!(
            level16(&trie, &marks, &mut budget),
            Err(FibError::OutOfMemory)
        );
        Ok(())
    }
}
