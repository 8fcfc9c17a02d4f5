//------------ Types for Statistics -----------------------------------------

use std::fmt::{Debug, Display};

//------------ BackendStats --------------------------------------------------

/// Shape of a compiled table, specific to the backend that built it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackendStats {
    Dxr {
        /// Number of address bits used to index the chunk table.
        chunk_bits: u8,
        /// Chunks that resolve to a single next hop without a range search.
        direct_chunks: usize,
        /// Chunks that carry their own slice of the range array.
        range_chunks: usize,
        /// Chunks that reuse the slice of the chunk before them.
        shared_chunks: usize,
        /// Total number of entries in the range array.
        range_entries: usize,
    },
    Sail {
        /// Expanded /16s, each a block of 256 slots in level 24.
        l24_blocks: usize,
        /// Expanded /24s, each a block of 256 slots in level 32.
        l32_blocks: usize,
    },
}

impl Display for BackendStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendStats::Dxr {
                chunk_bits,
                direct_chunks,
                range_chunks,
                shared_chunks,
                range_entries,
            } => write!(
                f,
                "D{}R: {} direct, {} with ranges ({} shared), {} ranges",
                chunk_bits,
                direct_chunks,
                range_chunks,
                shared_chunks,
                range_entries
            ),
            BackendStats::Sail {
                l24_blocks,
                l32_blocks,
            } => write!(
                f,
                "SAIL: {} level-24 blocks, {} level-32 blocks",
                l24_blocks, l32_blocks
            ),
        }
    }
}

//------------ TableStats ----------------------------------------------------

/// Statistics of a compiled forwarding table, returned by a commit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableStats {
    pub backend: BackendStats,
    /// The number of next hops frozen into the table.
    pub next_hops: usize,
    /// Size of all table arrays in bytes.
    pub mem_size: usize,
}

impl Display for TableStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {} next hops ({}k)",
            self.backend,
            self.next_hops,
            self.mem_size / 1024
        )
    }
}

//------------ FibStats ------------------------------------------------------

/// Statistics of a FIB: its editable trie and its published table.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct FibStats {
    /// Number of routes in the trie.
    pub routes: usize,
    /// Number of trie nodes, including the ones that don't carry a route.
    pub trie_nodes: usize,
    /// Number of distinct next hops.
    pub next_hops: usize,
    /// Number of successful commits.
    pub generation: u64,
    /// The published table, if any commit has succeeded yet.
    pub table: Option<TableStats>,
}

impl Debug for FibStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "routes: {}, nodes: {}, next hops: {}, generation: {}, \
            table: {:?}",
            self.routes,
            self.trie_nodes,
            self.next_hops,
            self.generation,
            self.table
        ))
    }
}

impl Display for FibStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "routes:     {}", self.routes)?;
        writeln!(f, "trie nodes: {}", self.trie_nodes)?;
        writeln!(f, "next hops:  {}", self.next_hops)?;
        writeln!(f, "generation: {}", self.generation)?;
        match &self.table {
            Some(table) => write!(f, "table:      {}", table),
            None => write!(f, "table:      none"),
        }
    }
}
