//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::domain::config::AppConfig;

/// Default number of messages a `work` run takes from the queue
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// SpeechCut - cut the silence out of recorded speech
#[derive(Parser, Debug)]
#[command(name = "speechcut")]
#[command(version)]
#[command(about = "Silence-cutting media pipeline: transcribe, segment, clip in parallel, reassemble")]
#[command(long_about = None)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/speechcut/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Per-invocation overrides of config keys
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Root of per-job working directories
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace_dir: Option<String>,

    /// Root of the local object store
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_root: Option<String>,

    /// Bucket holding source media
    #[arg(long, global = true, value_name = "NAME")]
    pub input_bucket: Option<String>,

    /// Bucket receiving transcripts and results
    #[arg(long, global = true, value_name = "NAME")]
    pub output_bucket: Option<String>,

    /// Directory of the clip ledger
    #[arg(long, global = true, value_name = "DIR")]
    pub ledger_dir: Option<String>,

    /// Directory of the work queue spool
    #[arg(long, global = true, value_name = "DIR")]
    pub queue_dir: Option<String>,

    /// Base URL of the transcription service
    #[arg(long, global = true, value_name = "URL")]
    pub transcription_endpoint: Option<String>,

    /// Maximum silence gap in seconds that stays inside a segment
    #[arg(long, global = true, value_name = "SECONDS")]
    pub silence_threshold: Option<Decimal>,

    /// Observations before a poll step gives up
    #[arg(long, global = true, value_name = "N")]
    pub max_poll_count: Option<u32>,

    /// FFmpeg binary
    #[arg(long, global = true, value_name = "PATH")]
    pub ffmpeg_path: Option<String>,
}

impl Overrides {
    /// Overrides as a partial config, highest merge precedence
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            workspace_dir: self.workspace_dir.clone(),
            storage_root: self.storage_root.clone(),
            input_bucket: self.input_bucket.clone(),
            output_bucket: self.output_bucket.clone(),
            ledger_dir: self.ledger_dir.clone(),
            queue_dir: self.queue_dir.clone(),
            transcription_endpoint: self.transcription_endpoint.clone(),
            silence_threshold: self.silence_threshold.map(|t| t.to_string()),
            max_poll_count: self.max_poll_count,
            ffmpeg_path: self.ffmpeg_path.clone(),
            ..Default::default()
        }
    }
}

/// Step event input shared by the pipeline steps
#[derive(Args, Debug, Clone, Default)]
pub struct EventArgs {
    /// Step event JSON; read from stdin when omitted
    #[arg(long, value_name = "JSON")]
    pub event: Option<String>,
}

/// Poll step options
#[derive(Args, Debug, Clone, Default)]
pub struct PollArgs {
    #[command(flatten)]
    pub input: EventArgs,

    /// Exit with status 3 once the poll state times out
    #[arg(long)]
    pub fail_on_timeout: bool,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a job per source file and print its opening event
    Start {
        /// Source file names in the input bucket
        #[arg(required = true, value_name = "FILE")]
        files: Vec<String>,
    },
    /// Start the transcription job for an event
    Transcribe(EventArgs),
    /// Observe the transcription job once and advance the poll state
    TranscribeStatus(PollArgs),
    /// Download source media and transcript into the job workspace
    Fetch(EventArgs),
    /// Segment the transcript and fan out one work message per segment
    Dispatch(EventArgs),
    /// Clip the segment named by one work message
    Clip {
        /// Work message JSON; read from stdin when omitted
        #[arg(value_name = "JSON")]
        message: Option<String>,
    },
    /// Take messages from the work queue and clip them concurrently
    Work {
        /// Maximum messages taken in one run
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch: usize,
    },
    /// Observe the clip ledger once and advance the poll state
    ClipStatus(PollArgs),
    /// Join the clips of a job in index order
    Concat(EventArgs),
    /// Upload the joined output and remove the job workspace
    Publish(EventArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_start_files() {
        let cli = Cli::parse_from(["speechcut", "start", "a.mp4", "b.mp4"]);
        if let Commands::Start { files } = cli.command {
            assert_eq!(files, vec!["a.mp4", "b.mp4"]);
        } else {
            panic!("Expected Start command");
        }
    }

    #[test]
    fn start_requires_a_file() {
        assert!(Cli::try_parse_from(["speechcut", "start"]).is_err());
    }

    #[test]
    fn cli_parses_poll_flags() {
        let cli = Cli::parse_from([
            "speechcut",
            "clip-status",
            "--event",
            "{}",
            "--fail-on-timeout",
        ]);
        if let Commands::ClipStatus(args) = cli.command {
            assert!(args.fail_on_timeout);
            assert_eq!(args.input.event.as_deref(), Some("{}"));
        } else {
            panic!("Expected ClipStatus command");
        }
    }

    #[test]
    fn work_batch_defaults() {
        let cli = Cli::parse_from(["speechcut", "work"]);
        assert!(matches!(
            cli.command,
            Commands::Work {
                batch: DEFAULT_BATCH_SIZE
            }
        ));
    }

    #[test]
    fn global_overrides_after_subcommand() {
        let cli = Cli::parse_from([
            "speechcut",
            "dispatch",
            "--ledger-dir",
            "/tmp/l",
            "--silence-threshold",
            "0.5",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let config = cli.overrides.to_config();
        assert_eq!(config.ledger_dir.as_deref(), Some("/tmp/l"));
        assert_eq!(config.silence_threshold.as_deref(), Some("0.5"));
        assert!(config.queue_dir.is_none());
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["speechcut", "config", "set", "input_bucket", "media"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "input_bucket");
            assert_eq!(value, "media");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
