use crate::types::af::{mask, truncate_to_len, IPv4};
use crate::types::errors::FibError;
use crate::types::next_hop::NextHop;

//------------ LinearFib -----------------------------------------------------
//
// A brute-force longest prefix match over a plain list of routes. Slow, but
// obviously correct, so the compiled tables can be checked against it.

#[derive(Clone, Debug, Default)]
pub struct LinearFib {
    routes: Vec<(IPv4, u8, NextHop)>,
}

impl LinearFib {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        prefix: IPv4,
        len: u8,
        nexthop: NextHop,
    ) -> Result<(), FibError> {
        if len > 32 {
            return Err(FibError::PrefixLengthInvalid);
        }
        let net = truncate_to_len(prefix, len);
        if self.routes.iter().any(|(p, l, _)| *p == net && *l == len) {
            return Err(FibError::DuplicateRoute);
        }
        self.routes.push((net, len, nexthop));
        Ok(())
    }

    pub fn lookup(&self, addr: IPv4) -> NextHop {
        self.routes
            .iter()
            .filter(|(p, l, _)| addr & mask(*l) == *p)
            .max_by_key(|(_, l, _)| *l)
            .map_or(NextHop::NO_ENTRY, |(_, _, nh)| *nh)
    }

    /// The length of the longest matching route, if any.
    pub fn matched_len(&self, addr: IPv4) -> Option<u8> {
        self.routes
            .iter()
            .filter(|(p, l, _)| addr & mask(*l) == *p)
            .map(|(_, l, _)| *l)
            .max()
    }

    pub fn routes(&self) -> &[(IPv4, u8, NextHop)] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Addresses worth probing: the first and last address of every route,
    /// and the addresses right outside of it.
    pub fn edge_addresses(&self) -> Vec<IPv4> {
        let mut addrs = vec![0, u32::MAX];
        for (p, l, _) in &self.routes {
            let last = p | !mask(*l);
            addrs.push(*p);
            addrs.push(last);
            addrs.push(p.wrapping_sub(1));
            addrs.push(last.wrapping_add(1));
        }
        addrs.sort_unstable();
        addrs.dedup();
        addrs
    }
}
