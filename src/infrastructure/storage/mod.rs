//! Object store adapters

mod local;

pub use local::LocalObjectStore;
