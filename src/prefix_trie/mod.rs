//! The editable side of a FIB: a binary trie of routes.
//!
//! Routes are inserted one bit at a time from the most significant bit, so
//! a route of length `l` lives at depth `l`. The nodes are kept in an arena
//! (a `Vec`) and refer to their children by index, the parent owning its
//! children exclusively. The trie is only ever read by the compilers during
//! a commit; lookups go to the compiled tables.
mod node;

pub use node::{NodeId, TrieNode};

use log::trace;

use crate::types::af::{bit_at, truncate_to_len, IPv4, BITS};
use crate::types::errors::FibError;
use crate::types::NextHopIdx;

#[derive(Clone, Debug)]
pub struct PrefixTrie {
    nodes: Vec<TrieNode>,
    routes: usize,
}

impl Default for PrefixTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::new(0)],
            routes: 0,
        }
    }

    /// Insert a route. A `len` of 0 is the default route, bits of `prefix`
    /// past `len` are ignored.
    ///
    /// Returns `FibError::DuplicateRoute` if the (prefix, len) pair is
    /// already a route. Nodes that were created on the way down in that case
    /// don't carry a route and are harmless.
    pub fn insert(
        &mut self,
        prefix: IPv4,
        len: u8,
        nexthop: NextHopIdx,
    ) -> Result<(), FibError> {
        if len > BITS {
            return Err(FibError::PrefixLengthInvalid);
        }

        let mut cur = NodeId::ROOT;
        for depth in 0..len {
            let bit = bit_at(prefix, depth);
            let next = self.nodes.get(cur.index()).and_then(|n| n.child(bit));
            cur = match next {
                Some(next) => next,
                None => self.add_child(cur, bit, depth + 1)?,
            };
        }

        let node = self
            .nodes
            .get_mut(cur.index())
            .ok_or(FibError::InternalConsistency)?;
        if node.nexthop.is_some() {
            trace!(
                "duplicate route {}/{}",
                std::net::Ipv4Addr::from(truncate_to_len(prefix, len)),
                len
            );
            return Err(FibError::DuplicateRoute);
        }
        node.nexthop = Some(nexthop);
        self.routes += 1;

        trace!(
            "inserted {}/{} -> next hop index {}",
            std::net::Ipv4Addr::from(truncate_to_len(prefix, len)),
            len,
            nexthop
        );
        Ok(())
    }

    fn add_child(
        &mut self,
        parent: NodeId,
        bit: usize,
        depth: u8,
    ) -> Result<NodeId, FibError> {
        let id = NodeId::new(self.nodes.len()).ok_or(FibError::OutOfMemory)?;
        let slot = self
            .nodes
            .get_mut(parent.index())
            .and_then(|p| p.children.get_mut(bit))
            .ok_or(FibError::InternalConsistency)?;
        *slot = Some(id);
        self.nodes.push(TrieNode::new(depth));
        Ok(id)
    }

    /// The next hop of the exact route (prefix, len), if it exists.
    pub fn get(&self, prefix: IPv4, len: u8) -> Option<NextHopIdx> {
        if len > BITS {
            return None;
        }
        let mut node = self.root();
        for depth in 0..len {
            node = node
                .child(bit_at(prefix, depth))
                .and_then(|id| self.node(id))?;
        }
        node.nexthop
    }

    /// The next hop of the most specific route covering the first `len`
    /// bits of `addr`.
    ///
    /// Walks the path of `addr` down to depth `len`, remembering the
    /// deepest node that carries a route. The path may end early, in which
    /// case the best route found so far is returned.
    pub fn longest_match(&self, addr: IPv4, len: u8) -> Option<NextHopIdx> {
        let mut node = self.root();
        let mut best = node.nexthop;
        for depth in 0..len.min(BITS) {
            match node.child(bit_at(addr, depth)).and_then(|id| self.node(id))
            {
                Some(next) => {
                    node = next;
                    best = next.nexthop.or(best);
                }
                None => break,
            }
        }
        best
    }

    pub fn root(&self) -> &TrieNode {
        static EMPTY: TrieNode = TrieNode {
            nexthop: None,
            children: [None, None],
            depth: 0,
        };
        self.nodes.get(NodeId::ROOT.index()).unwrap_or(&EMPTY)
    }

    pub fn node(&self, id: NodeId) -> Option<&TrieNode> {
        self.nodes.get(id.index())
    }

    /// The number of routes in the trie.
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// The number of nodes in the trie, including the root and the nodes
    /// without a route.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All routes as (prefix, len, next hop index), in address order, less
    /// specifics before more specifics.
    pub fn routes(&self) -> Vec<(IPv4, u8, NextHopIdx)> {
        let mut res = Vec::with_capacity(self.routes);
        let mut stack = vec![(NodeId::ROOT, 0_u32)];
        while let Some((id, prefix)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if let Some(nh) = node.nexthop {
                res.push((prefix, node.depth, nh));
            }
            // Right first, so that the left child is popped first.
            if let Some(right) = node.child(1) {
                stack.push((right, prefix | (1 << (31 - node.depth as u32))));
            }
            if let Some(left) = node.child(0) {
                stack.push((left, prefix));
            }
        }
        res
    }
}
