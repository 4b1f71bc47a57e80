//! Application configuration value object

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::{ConfigError, PipelineError};
use crate::domain::polling::DEFAULT_MAX_POLL_COUNT;
use crate::domain::segment::DEFAULT_SILENCE_THRESHOLD;

/// Prefix of environment variables overriding config keys
pub const ENV_PREFIX: &str = "SPEECHCUT_";

/// Every settable config key, in display order
pub const CONFIG_KEYS: &[&str] = &[
    "workspace_dir",
    "storage_root",
    "input_bucket",
    "output_bucket",
    "ledger_dir",
    "queue_dir",
    "transcription_endpoint",
    "transcription_api_key",
    "silence_threshold",
    "max_poll_count",
    "media_format",
    "language_code",
    "ffmpeg_path",
];

const DEFAULT_MEDIA_FORMAT: &str = "mp4";
const DEFAULT_LANGUAGE_CODE: &str = "ja-JP";
const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub workspace_dir: Option<String>,
    pub storage_root: Option<String>,
    pub input_bucket: Option<String>,
    pub output_bucket: Option<String>,
    pub ledger_dir: Option<String>,
    pub queue_dir: Option<String>,
    pub transcription_endpoint: Option<String>,
    pub transcription_api_key: Option<String>,
    pub silence_threshold: Option<String>,
    pub max_poll_count: Option<u32>,
    pub media_format: Option<String>,
    pub language_code: Option<String>,
    pub ffmpeg_path: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        let data_dir = default_data_dir();
        let under = |name: &str| Some(data_dir.join(name).to_string_lossy().to_string());
        Self {
            workspace_dir: under("work"),
            storage_root: under("storage"),
            input_bucket: None,
            output_bucket: None,
            ledger_dir: under("ledger"),
            queue_dir: under("queue"),
            transcription_endpoint: None,
            transcription_api_key: None,
            silence_threshold: Some(DEFAULT_SILENCE_THRESHOLD.to_string()),
            max_poll_count: Some(DEFAULT_MAX_POLL_COUNT),
            media_format: Some(DEFAULT_MEDIA_FORMAT.to_string()),
            language_code: Some(DEFAULT_LANGUAGE_CODE.to_string()),
            ffmpeg_path: Some(DEFAULT_FFMPEG_PATH.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            workspace_dir: other.workspace_dir.or(self.workspace_dir),
            storage_root: other.storage_root.or(self.storage_root),
            input_bucket: other.input_bucket.or(self.input_bucket),
            output_bucket: other.output_bucket.or(self.output_bucket),
            ledger_dir: other.ledger_dir.or(self.ledger_dir),
            queue_dir: other.queue_dir.or(self.queue_dir),
            transcription_endpoint: other.transcription_endpoint.or(self.transcription_endpoint),
            transcription_api_key: other.transcription_api_key.or(self.transcription_api_key),
            silence_threshold: other.silence_threshold.or(self.silence_threshold),
            max_poll_count: other.max_poll_count.or(self.max_poll_count),
            media_format: other.media_format.or(self.media_format),
            language_code: other.language_code.or(self.language_code),
            ffmpeg_path: other.ffmpeg_path.or(self.ffmpeg_path),
        }
    }

    /// Build a config from `SPEECHCUT_<KEY>` variables via `lookup`.
    /// An invalid value is an error naming the variable.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::empty();
        for key in CONFIG_KEYS {
            let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Some(value) = lookup(&var).filter(|v| !v.is_empty()) {
                config.set(key, &value).map_err(|e| match e {
                    ConfigError::ValidationError { message, .. } => {
                        ConfigError::ValidationError { key: var, message }
                    }
                    other => other,
                })?;
            }
        }
        Ok(config)
    }

    /// Build a config from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|var| std::env::var(var).ok())
    }

    /// Check values that bypassed [`set`](Self::set), e.g. from a
    /// hand-edited file or a command-line flag
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threshold) = self.silence_threshold.as_deref() {
            parse_threshold(threshold)?;
        }
        if let Some(count) = self.max_poll_count {
            parse_max_poll_count(&count.to_string())?;
        }
        Ok(())
    }

    /// Set a key from its string form, validating the value
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let text = Some(value.to_string());
        match key {
            "workspace_dir" => self.workspace_dir = text,
            "storage_root" => self.storage_root = text,
            "input_bucket" => self.input_bucket = text,
            "output_bucket" => self.output_bucket = text,
            "ledger_dir" => self.ledger_dir = text,
            "queue_dir" => self.queue_dir = text,
            "transcription_endpoint" => self.transcription_endpoint = text,
            "transcription_api_key" => self.transcription_api_key = text,
            "silence_threshold" => {
                parse_threshold(value)?;
                self.silence_threshold = text;
            }
            "max_poll_count" => {
                self.max_poll_count = Some(parse_max_poll_count(value)?);
            }
            "media_format" => self.media_format = text,
            "language_code" => self.language_code = text,
            "ffmpeg_path" => self.ffmpeg_path = text,
            _ => {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: format!("Unknown key. Valid keys: {}", CONFIG_KEYS.join(", ")),
                })
            }
        }
        Ok(())
    }

    /// Get a key in its string form
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "workspace_dir" => self.workspace_dir.clone(),
            "storage_root" => self.storage_root.clone(),
            "input_bucket" => self.input_bucket.clone(),
            "output_bucket" => self.output_bucket.clone(),
            "ledger_dir" => self.ledger_dir.clone(),
            "queue_dir" => self.queue_dir.clone(),
            "transcription_endpoint" => self.transcription_endpoint.clone(),
            "transcription_api_key" => self.transcription_api_key.clone(),
            "silence_threshold" => self.silence_threshold.clone(),
            "max_poll_count" => self.max_poll_count.map(|n| n.to_string()),
            "media_format" => self.media_format.clone(),
            "language_code" => self.language_code.clone(),
            "ffmpeg_path" => self.ffmpeg_path.clone(),
            _ => None,
        }
    }

    /// Silence threshold as Decimal, or the default if not set
    pub fn silence_threshold_or_default(&self) -> Result<Decimal, ConfigError> {
        self.silence_threshold
            .as_deref()
            .map_or(Ok(DEFAULT_SILENCE_THRESHOLD), parse_threshold)
    }

    /// Get max poll count, or 200 if not set
    pub fn max_poll_count_or_default(&self) -> u32 {
        self.max_poll_count.unwrap_or(DEFAULT_MAX_POLL_COUNT)
    }

    pub fn media_format_or_default(&self) -> &str {
        self.media_format.as_deref().unwrap_or(DEFAULT_MEDIA_FORMAT)
    }

    pub fn language_code_or_default(&self) -> &str {
        self.language_code.as_deref().unwrap_or(DEFAULT_LANGUAGE_CODE)
    }

    pub fn ffmpeg_path_or_default(&self) -> &str {
        self.ffmpeg_path.as_deref().unwrap_or(DEFAULT_FFMPEG_PATH)
    }

    pub fn workspace_dir_or_default(&self) -> PathBuf {
        dir_or_default(self.workspace_dir.as_deref(), "work")
    }

    pub fn storage_root_or_default(&self) -> PathBuf {
        dir_or_default(self.storage_root.as_deref(), "storage")
    }

    pub fn ledger_dir_or_default(&self) -> PathBuf {
        dir_or_default(self.ledger_dir.as_deref(), "ledger")
    }

    pub fn queue_dir_or_default(&self) -> PathBuf {
        dir_or_default(self.queue_dir.as_deref(), "queue")
    }

    pub fn require_input_bucket(&self) -> Result<&str, PipelineError> {
        require(self.input_bucket.as_deref(), "input_bucket")
    }

    pub fn require_output_bucket(&self) -> Result<&str, PipelineError> {
        require(self.output_bucket.as_deref(), "output_bucket")
    }

    pub fn require_transcription_endpoint(&self) -> Result<&str, PipelineError> {
        require(
            self.transcription_endpoint.as_deref(),
            "transcription_endpoint",
        )
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("speechcut")
}

fn dir_or_default(value: Option<&str>, name: &str) -> PathBuf {
    value
        .map(PathBuf::from)
        .unwrap_or_else(|| default_data_dir().join(name))
}

fn require<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, PipelineError> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| {
        PipelineError::configuration(format!(
            "missing {key}. Set {}{} or run 'speechcut config set {key} <value>'",
            ENV_PREFIX,
            key.to_uppercase()
        ))
    })
}

fn parse_threshold(value: &str) -> Result<Decimal, ConfigError> {
    let threshold: Decimal = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError {
            key: "silence_threshold".to_string(),
            message: format!("'{}' is not a decimal number of seconds", value),
        })?;
    if threshold.is_sign_negative() {
        return Err(ConfigError::ValidationError {
            key: "silence_threshold".to_string(),
            message: "Value must not be negative".to_string(),
        });
    }
    Ok(threshold)
}

fn parse_max_poll_count(value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::ValidationError {
            key: "max_poll_count".to_string(),
            message: "Value must be a positive integer".to_string(),
        }),
    }
}
