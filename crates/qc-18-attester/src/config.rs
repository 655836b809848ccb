//! Attester configuration
//!
//! Loaded from a TOML file or from environment variables; anything not set
//! falls back to [`AttesterConfig::default`].

use crate::error::{AttesterError, AttesterResult};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Weak subjectivity period in epochs (mainnet value).
pub const DEFAULT_WEAK_SUBJECTIVITY_PERIOD: u64 = 54_000;

/// How many candidate votes an attempt produces.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CandidateMode {
    /// Fetch a second candidate until its source epoch differs from the
    /// first, then sign and submit both.
    #[default]
    Divergent,
    /// One vote per slot.
    Single,
}

impl CandidateMode {
    fn parse(value: &str) -> AttesterResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "divergent" => Ok(Self::Divergent),
            "single" => Ok(Self::Single),
            other => Err(AttesterError::Config(format!(
                "unknown candidate mode '{}'",
                other
            ))),
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Runtime configuration for the attester
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AttesterConfig {
    /// Check and record slashing protection history around every vote
    pub protect_attester: bool,

    /// Increment per-key success/failure counters
    pub emit_account_metrics: bool,

    /// Number of epochs of vote history retained per key
    pub weak_subjectivity_period: u64,

    /// Candidate votes per attempt
    pub candidate_mode: CandidateMode,

    /// Directory for on-disk protection history (in-memory when unset)
    pub history_dir: Option<PathBuf>,

    pub logging: LoggingConfig,
}

impl Default for AttesterConfig {
    fn default() -> Self {
        Self {
            protect_attester: true,
            emit_account_metrics: true,
            weak_subjectivity_period: DEFAULT_WEAK_SUBJECTIVITY_PERIOD,
            candidate_mode: CandidateMode::Divergent,
            history_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl AttesterConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> AttesterResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| AttesterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_ATTESTER_PROTECT`: Enable slashing protection (default: true)
    /// - `QC_EMIT_ACCOUNT_METRICS`: Per-key counters (default: true)
    /// - `QC_WS_PERIOD`: Weak subjectivity period in epochs (default: 54000)
    /// - `QC_ATTESTER_CANDIDATES`: `divergent` or `single` (default: divergent)
    /// - `QC_ATTESTER_HISTORY_DIR`: Protection history directory (default: in-memory)
    /// - `QC_LOG_LEVEL`: Log level (default: info)
    /// - `QC_JSON_LOGS`: JSON log output (default: false)
    pub fn from_env() -> AttesterResult<Self> {
        let defaults = Self::default();

        let config = Self {
            protect_attester: env_bool("QC_ATTESTER_PROTECT")?.unwrap_or(defaults.protect_attester),
            emit_account_metrics: env_bool("QC_EMIT_ACCOUNT_METRICS")?
                .unwrap_or(defaults.emit_account_metrics),
            weak_subjectivity_period: match env::var("QC_WS_PERIOD") {
                Ok(v) => v
                    .parse()
                    .map_err(|_| AttesterError::Config(format!("QC_WS_PERIOD: '{}'", v)))?,
                Err(_) => defaults.weak_subjectivity_period,
            },
            candidate_mode: match env::var("QC_ATTESTER_CANDIDATES") {
                Ok(v) => CandidateMode::parse(&v)?,
                Err(_) => defaults.candidate_mode,
            },
            history_dir: env::var("QC_ATTESTER_HISTORY_DIR").ok().map(PathBuf::from),
            logging: LoggingConfig {
                log_level: env::var("QC_LOG_LEVEL").unwrap_or(defaults.logging.log_level),
                json_logs: env_bool("QC_JSON_LOGS")?.unwrap_or(defaults.logging.json_logs),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AttesterResult<()> {
        if self.weak_subjectivity_period == 0 {
            return Err(AttesterError::Config(
                "weak_subjectivity_period must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_bool(name: &str) -> AttesterResult<Option<bool>> {
    match env::var(name) {
        Ok(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Some(true)),
            "0" | "false" | "no" => Ok(Some(false)),
            _ => Err(AttesterError::Config(format!("{}: '{}'", name, v))),
        },
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AttesterConfig::default();
        assert!(config.protect_attester);
        assert_eq!(config.weak_subjectivity_period, 54_000);
        assert_eq!(config.candidate_mode, CandidateMode::Divergent);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AttesterConfig::from_toml_str(
            r#"
            weak_subjectivity_period = 16
            candidate_mode = "single"

            [logging]
            json_logs = true
            "#,
        )
        .unwrap();

        assert_eq!(config.weak_subjectivity_period, 16);
        assert_eq!(config.candidate_mode, CandidateMode::Single);
        assert!(config.protect_attester);
        assert!(config.logging.json_logs);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_zero_period_rejected() {
        let result = AttesterConfig::from_toml_str("weak_subjectivity_period = 0");
        assert!(matches!(result, Err(AttesterError::Config(_))));
    }

    #[test]
    fn test_unknown_candidate_mode() {
        assert!(CandidateMode::parse("triple").is_err());
        assert_eq!(CandidateMode::parse("SINGLE").unwrap(), CandidateMode::Single);
    }
}
