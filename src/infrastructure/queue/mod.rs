//! Work queue adapters

mod memory;
mod spool;

pub use memory::InMemoryQueue;
pub use spool::SpoolQueue;
