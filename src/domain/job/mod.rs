//! Job domain module

mod event;
mod work;
mod workspace;

pub use event::{Job, StepEvent};
pub use work::{LedgerEntry, WorkMessage};
pub use workspace::{path_component, JobWorkspace, TRANSCRIPT_FILE_NAME};
