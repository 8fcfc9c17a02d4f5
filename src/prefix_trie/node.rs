use crate::types::NextHopIdx;

//------------ NodeId --------------------------------------------------------

/// Index of a node in the trie's node arena. The root is always index 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    pub(crate) fn new(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(NodeId)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

//------------ TrieNode ------------------------------------------------------

// A node at depth `d` stands for all addresses that share the `d` leading
// bits of the path from the root to the node. Nodes are created lazily on
// the path of an inserted route, so a node only carries a route if it has a
// next hop.
#[derive(Clone, Debug)]
pub struct TrieNode {
    pub(crate) nexthop: Option<NextHopIdx>,
    pub(crate) children: [Option<NodeId>; 2],
    pub(crate) depth: u8,
}

impl TrieNode {
    pub(crate) fn new(depth: u8) -> Self {
        Self {
            nexthop: None,
            children: [None, None],
            depth,
        }
    }

    /// Whether this node is the terminal node of a route.
    pub fn is_valid(&self) -> bool {
        self.nexthop.is_some()
    }

    pub fn nexthop(&self) -> Option<NextHopIdx> {
        self.nexthop
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// The child for the next address bit, 0 being the left child.
    pub fn child(&self, bit: usize) -> Option<NodeId> {
        self.children.get(bit).copied().flatten()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}
