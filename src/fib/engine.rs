use std::net::Ipv4Addr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};
use epoch::Guard;
use inetnum::addr::Prefix;
use log::{debug, info, warn};

use crate::fib::{Backend, Config};
use crate::prefix_trie::PrefixTrie;
use crate::types::af::BITS;
use crate::types::errors::FibError;
use crate::types::stats::{FibStats, TableStats};
use crate::types::{NextHop, NextHopTable, TableBudget};

//------------ CompiledTable -------------------------------------------------

struct CompiledTable<B> {
    backend: B,
    generation: u64,
}

//------------ TableSlot -----------------------------------------------------
//
// The place where the compiled table is published, shared by a FIB and all
// of its readers. Publishing swaps the pointer in one atomic store. The
// previous table is handed to the epoch collector, and freed once every
// reader that could have loaded it has unpinned.

struct TableSlot<B: Backend> {
    table: Atomic<CompiledTable<B>>,
}

impl<B: Backend> TableSlot<B> {
    fn new() -> Self {
        Self {
            table: Atomic::null(),
        }
    }

    fn load<'g>(&self, guard: &'g Guard) -> Option<&'g CompiledTable<B>> {
        let table = self.table.load(Ordering::Acquire, guard);
        // Tables are only destroyed through the guard, so the reference
        // lives as long as the guard is pinned.
        unsafe { table.as_ref() }
    }

    #[inline]
    fn lookup(&self, addr: u32, guard: &Guard) -> NextHop {
        match self.load(guard) {
            Some(table) => table.backend.lookup(addr),
            None => NextHop::NO_ENTRY,
        }
    }

    fn publish(&self, table: CompiledTable<B>) {
        let guard = &epoch::pin();
        let prev = self.table.swap(Owned::new(table), Ordering::AcqRel, guard);
        if !prev.is_null() {
            unsafe { guard.defer_destroy(prev) };
        }
        guard.flush();
    }
}

impl<B: Backend> Drop for TableSlot<B> {
    fn drop(&mut self) {
        // The slot goes away with the last FIB or reader, so nobody can
        // hold a reference to the table anymore.
        let guard = unsafe { epoch::unprotected() };
        let table = self.table.swap(Shared::null(), Ordering::AcqRel, guard);
        if !table.is_null() {
            drop(unsafe { table.into_owned() });
        }
    }
}

//------------ Fib -----------------------------------------------------------

/// A forwarding information base for IPv4: the routes of one routing table,
/// compiled into a lookup table of backend `B`.
///
/// Routes are added with [route_add](Fib::route_add) (or
/// [insert](Fib::insert)), but are not visible to lookups until the next
/// [commit](Fib::commit), which rebuilds the lookup table from all routes
/// and publishes it. Before the first commit every lookup returns
/// `NextHop::NO_ENTRY`.
///
/// The FIB itself is the control plane, it needs exclusive access to add
/// routes and commit. Packet-processing threads get a [FibReader] through
/// [reader](Fib::reader), and keep on looking up in the previous table
/// while a commit is running.
///
/// ```
/// use rotonda_fib::{fib::Fib, NextHop, Sail};
///
/// let mut fib = Fib::<Sail>::try_default()?;
/// fib.route_add(0x0a00_0000, 8, NextHop::new(1))?;
/// fib.commit()?;
/// assert_eq!(fib.lookup(0x0a01_0203), NextHop::new(1));
/// assert_eq!(fib.lookup(0x0b00_0000), NextHop::NO_ENTRY);
/// # Ok::<(), rotonda_fib::errors::FibError>(())
/// ```
pub struct Fib<B: Backend> {
    trie: PrefixTrie,
    nexthops: NextHopTable,
    config: B::Config,
    slot: Arc<TableSlot<B>>,
    generation: u64,
}

impl<B: Backend> Fib<B> {
    /// Create a new FIB with the default configuration of the backend.
    pub fn try_default() -> Result<Self, FibError> {
        Self::new_with_config(B::Config::default())
    }

    /// Create a new FIB with the specified configuration. Fails if the
    /// configuration doesn't validate.
    pub fn new_with_config(config: B::Config) -> Result<Self, FibError> {
        config.validate()?;
        debug!("new {} fib with config {:?}", B::NAME, config);
        Ok(Self {
            trie: PrefixTrie::new(),
            nexthops: NextHopTable::new(),
            config,
            slot: Arc::new(TableSlot::new()),
            generation: 0,
        })
    }

    pub fn config(&self) -> &B::Config {
        &self.config
    }

    /// Add a route for `prefix/len`. Bits of `prefix` past `len` are
    /// ignored. The route is used by lookups after the next commit.
    ///
    /// Returns `FibError::DuplicateRoute` if a route for the exact same
    /// prefix and length exists. That leaves the FIB untouched.
    pub fn route_add(
        &mut self,
        prefix: u32,
        len: u8,
        nexthop: NextHop,
    ) -> Result<(), FibError> {
        if len > BITS {
            return Err(FibError::PrefixLengthInvalid);
        }
        if nexthop.is_no_entry() {
            return Err(FibError::NextHopInvalid);
        }
        if self.trie.get(prefix, len).is_some() {
            return Err(FibError::DuplicateRoute);
        }
        let idx = self.nexthops.intern(nexthop)?;
        self.trie.insert(prefix, len, idx)
    }

    /// Add a route for an `inetnum` prefix. IPv6 prefixes are refused.
    pub fn insert(
        &mut self,
        prefix: &Prefix,
        nexthop: NextHop,
    ) -> Result<(), FibError> {
        match prefix.addr() {
            std::net::IpAddr::V4(addr) => {
                self.route_add(u32::from(addr), prefix.len(), nexthop)
            }
            std::net::IpAddr::V6(_) => Err(FibError::AddressFamilyInvalid),
        }
    }

    /// Rebuild the lookup table from all routes and publish it.
    ///
    /// The new table replaces the previous one in a single step. If the
    /// build fails, e.g. because it runs out of memory, nothing is published
    /// and lookups keep using the previous table.
    pub fn commit(&mut self) -> Result<TableStats, FibError> {
        let mut budget = TableBudget::new(self.config.memory_limit());
        let backend = B::compile(
            &self.trie,
            &self.nexthops,
            &self.config,
            &mut budget,
        )
        .inspect_err(|err| {
            warn!(
                "{}: commit of {} routes failed, keeping generation {}: {}",
                B::NAME,
                self.trie.len(),
                self.generation,
                err
            )
        })?;

        let stats = backend.stats();
        self.generation += 1;
        self.slot.publish(CompiledTable {
            backend,
            generation: self.generation,
        });
        info!(
            "{}: published generation {} with {} routes ({} bytes \
            allocated): {}",
            B::NAME,
            self.generation,
            self.trie.len(),
            budget.used(),
            stats
        );
        Ok(stats)
    }

    /// The next hop for `addr` in the last committed table.
    pub fn lookup(&self, addr: u32) -> NextHop {
        let guard = &epoch::pin();
        self.slot.lookup(addr, guard)
    }

    pub fn lookup_ipv4(&self, addr: Ipv4Addr) -> NextHop {
        self.lookup(u32::from(addr))
    }

    /// Look up under a guard the caller already pinned, e.g. once for a
    /// whole batch of packets.
    pub fn lookup_with_guard(&self, addr: u32, guard: &Guard) -> NextHop {
        self.slot.lookup(addr, guard)
    }

    /// A handle for looking up in this FIB from other threads.
    pub fn reader(&self) -> FibReader<B> {
        FibReader {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Run `f` on the published table, if there is one.
    pub fn with_table<R>(&self, f: impl FnOnce(&B) -> R) -> Option<R> {
        let guard = &epoch::pin();
        self.slot.load(guard).map(|table| f(&table.backend))
    }

    pub fn trie(&self) -> &PrefixTrie {
        &self.trie
    }

    pub fn nexthops(&self) -> &NextHopTable {
        &self.nexthops
    }

    /// The number of successful commits.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> FibStats {
        FibStats {
            routes: self.trie.len(),
            trie_nodes: self.trie.node_count(),
            next_hops: self.nexthops.len(),
            generation: self.generation,
            table: self.with_table(|backend| backend.stats()),
        }
    }
}

impl<B: Backend> std::fmt::Debug for Fib<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fib")
            .field("backend", &B::NAME)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

//------------ FibReader -----------------------------------------------------

/// A lookup-only handle on a [Fib], that can be cloned and sent to other
/// threads. Lookups through a reader always see the table of the last
/// commit that completed, and never block.
pub struct FibReader<B: Backend> {
    slot: Arc<TableSlot<B>>,
}

impl<B: Backend> Clone for FibReader<B> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<B: Backend> FibReader<B> {
    pub fn lookup(&self, addr: u32) -> NextHop {
        let guard = &epoch::pin();
        self.slot.lookup(addr, guard)
    }

    pub fn lookup_ipv4(&self, addr: Ipv4Addr) -> NextHop {
        self.lookup(u32::from(addr))
    }

    pub fn lookup_with_guard(&self, addr: u32, guard: &Guard) -> NextHop {
        self.slot.lookup(addr, guard)
    }

    /// The generation of the table that lookups currently go to, `None`
    /// before the first commit.
    pub fn generation(&self) -> Option<u64> {
        let guard = &epoch::pin();
        self.slot.load(guard).map(|table| table.generation)
    }
}
