//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, logging setup,
//! and the pipeline step runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod logging;
pub mod presenter;

// Re-export commonly used types
pub use app::{run, Pipeline, EXIT_ERROR, EXIT_SUCCESS, EXIT_TIMEOUT, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction};
pub use logging::init_tracing;
pub use presenter::Presenter;
