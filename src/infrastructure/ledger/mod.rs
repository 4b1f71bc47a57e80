//! Ledger adapters

mod fs;
mod memory;

pub use fs::FsLedger;
pub use memory::InMemoryLedger;
