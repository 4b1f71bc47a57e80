//! CLI presenter for output formatting

use colored::*;

use crate::application::DrainReport;
use crate::domain::error::PipelineError;
use crate::domain::job::StepEvent;

/// Presenter for CLI output formatting.
///
/// Status lines go to stderr; stdout carries only machine-readable
/// output so steps can be piped into one another.
pub struct Presenter;

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a pipeline error with its kind highlighted
    pub fn pipeline_error(&self, err: &PipelineError) {
        eprintln!("{} {}: {}", "✗".red(), err.kind.as_str().red().bold(), err.message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Output a step event as one JSON line
    pub fn event(&self, event: &StepEvent) -> Result<(), PipelineError> {
        self.output(&event.to_json()?);
        Ok(())
    }

    /// Print key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Summarize a queue drain on stderr
    pub fn drain_report(&self, report: &DrainReport) {
        if report.received() == 0 {
            self.info("No work messages available");
            return;
        }
        for (message, err) in &report.failed {
            match message {
                Some(m) => self.error(&format!("{} #{}: {}", m.job_id, m.index, err)),
                None => self.error(&err.to_string()),
            }
        }
        let summary = format!(
            "{} clipped, {} already done, {} failed",
            report.clipped,
            report.skipped,
            report.failed.len()
        );
        if report.is_success() {
            self.success(&summary);
        } else {
            self.warn(&summary);
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
