#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

//! A library that compiles IPv4 routes into forwarding tables for fast
//! longest prefix match lookups, as used in the forwarding plane of a
//! router.
//!
//! Routes are collected in a binary prefix trie, and on every commit the
//! whole trie is compiled into an immutable lookup table. Lookups only ever
//! go to the last committed table, which is published atomically, so that
//! packet-processing threads can keep looking up while the control plane
//! adds routes and commits.
//!
//! Two lookup table backends solve the same problem in different ways.
//! Both return, for every address, exactly what a longest prefix match
//! over the routes in the trie at commit time would return:
//!
//! - [Dxr], a range table after DXR[^1]: the address space as a sorted list
//!   of disjoint ranges, cut in chunks that are binary searched.
//! - [Sail], a three-level direct index after SAIL[^2]: levels at /16, /24
//!   and /32, so that every lookup takes one, two or three reads.
//!
//! [^1]: <https://doi.org/10.1145/2317307.2317324>
//! [^2]: <https://doi.org/10.1145/2619239.2626297>
mod dxr;
mod prefix_trie;
mod sail;
mod types;

#[macro_use]
mod macros;

// re-exports
pub use crossbeam_epoch::{self as epoch, Guard};
pub use inetnum::addr;

// Public Interfaces on the root of the crate

/// The FIB, its configuration and the backend trait
pub mod fib;

/// The range (DXR) backend
pub use dxr::{Dxr, Range};

/// The three-level (SAIL) backend
pub use sail::Sail;

/// The prefix trie that holds the routes between commits
pub use prefix_trie::{NodeId, PrefixTrie, TrieNode};

/// Next hops and their deduplicating table
pub use types::{NextHop, NextHopIdx, NextHopTable};

/// Allocation accounting for compiled tables
pub use types::TableBudget;

/// Error types returned by a FIB
pub use types::errors;

/// Statistics types returned by a FIB
pub use types::stats;

// Used in tests
#[doc(hidden)]
pub use types::test_types;
