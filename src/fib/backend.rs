use crate::fib::config::Config;
use crate::prefix_trie::PrefixTrie;
use crate::types::errors::FibError;
use crate::types::stats::TableStats;
use crate::types::{NextHop, NextHopTable, TableBudget};

//------------ Backend (trait) ----------------------------------------------
//
/// A compiled, immutable lookup table for a FIB.
///
/// A backend is built wholesale from the trie and the next hop table on
/// every commit, and is never modified afterwards. It carries its own copy
/// of the next hop values, so that lookups never touch the editable side of
/// the FIB.
pub trait Backend: Sized + Send + Sync + 'static {
    type Config: Config;

    /// A short name for logging.
    const NAME: &'static str;

    /// Build the table. Every allocation goes through `budget`; if one
    /// fails, the partial table is dropped and the error returned.
    fn compile(
        trie: &PrefixTrie,
        nexthops: &NextHopTable,
        config: &Self::Config,
        budget: &mut TableBudget,
    ) -> Result<Self, FibError>;

    /// The next hop for `addr`, `NextHop::NO_ENTRY` if no route matches.
    fn lookup(&self, addr: u32) -> NextHop;

    fn stats(&self) -> TableStats;
}
