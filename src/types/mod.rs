pub(crate) mod af;
pub(crate) mod budget;
pub(crate) mod next_hop;

pub use budget::TableBudget;
pub use next_hop::{NextHop, NextHopIdx, NextHopTable};
pub(crate) use next_hop::{to_stored, FrozenNextHops, STORED_NO_ENTRY};

pub mod errors;
pub mod stats;
pub mod test_types;
