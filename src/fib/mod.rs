//! The forwarding information base: routes, the commit step that compiles
//! them, and lookups in the compiled table.
pub mod config;

mod backend;
mod engine;

pub use backend::Backend;
pub use config::Config;
pub use engine::{Fib, FibReader};
