//! Ledger configuration.
//!
//! Sources are layered: built-in defaults, then an optional YAML file, then
//! environment overrides.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ATTENDANCE_STREAK_THRESHOLD` | Streak length that awards the badge (default: 15) |
//! | `ATTENDANCE_STREAK_BADGE_URI` | Shared streak badge metadata URI |
//! | `ATTENDANCE_GENESIS` | RFC 3339 timestamp of height 0 for the wall-clock oracle |
//! | `ATTENDANCE_BLOCK_TIME_MINUTES` | Minutes per height step (default: 10) |

use crate::credentials::DEFAULT_STREAK_BADGE_URI;
use crate::errors::ConfigError;
use crate::height::BLOCK_TIME_MINUTES;
use crate::streak::DEFAULT_STREAK_THRESHOLD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_STREAK_THRESHOLD: &str = "ATTENDANCE_STREAK_THRESHOLD";
pub const ENV_STREAK_BADGE_URI: &str = "ATTENDANCE_STREAK_BADGE_URI";
pub const ENV_GENESIS: &str = "ATTENDANCE_GENESIS";
pub const ENV_BLOCK_TIME_MINUTES: &str = "ATTENDANCE_BLOCK_TIME_MINUTES";

/// Deployment constants of a ledger plus the chronology used to derive heights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Streak length that awards the badge.
    #[serde(default = "default_streak_threshold")]
    pub streak_threshold: u64,

    /// Metadata URI shared by every streak badge holder.
    #[serde(default = "default_streak_badge_uri")]
    pub streak_badge_uri: String,

    #[serde(default)]
    pub chain: ChainConfig,
}

/// Wall-clock chronology: height N begins `N * block_time_minutes` after genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_genesis")]
    pub genesis: DateTime<Utc>,

    #[serde(default = "default_block_time_minutes")]
    pub block_time_minutes: u64,
}

fn default_streak_threshold() -> u64 {
    DEFAULT_STREAK_THRESHOLD
}

fn default_streak_badge_uri() -> String {
    DEFAULT_STREAK_BADGE_URI.to_string()
}

fn default_genesis() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn default_block_time_minutes() -> u64 {
    BLOCK_TIME_MINUTES
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            streak_threshold: default_streak_threshold(),
            streak_badge_uri: default_streak_badge_uri(),
            chain: ChainConfig::default(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis: default_genesis(),
            block_time_minutes: default_block_time_minutes(),
        }
    }
}

impl LedgerConfig {
    /// Parse a YAML document. Missing keys take their defaults.
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let cfg: LedgerConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                path: origin.to_string(),
                message: e.to_string(),
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&content, &path.display().to_string())
    }

    /// Defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        let cfg = base.with_env_overrides(|var| std::env::var(var).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides read through `lookup` (the process environment in [`LedgerConfig::load`]).
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup(ENV_STREAK_THRESHOLD) {
            self.streak_threshold = parse_env(ENV_STREAK_THRESHOLD, &v)?;
        }
        if let Some(v) = lookup(ENV_STREAK_BADGE_URI) {
            self.streak_badge_uri = v;
        }
        if let Some(v) = lookup(ENV_GENESIS) {
            self.chain.genesis = DateTime::parse_from_rfc3339(&v)
                .map_err(|e| ConfigError::Env {
                    var: ENV_GENESIS.to_string(),
                    message: e.to_string(),
                })?
                .with_timezone(&Utc);
        }
        if let Some(v) = lookup(ENV_BLOCK_TIME_MINUTES) {
            self.chain.block_time_minutes = parse_env(ENV_BLOCK_TIME_MINUTES, &v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streak_threshold == 0 {
            return Err(ConfigError::Invalid {
                message: "streak_threshold must be at least 1".to_string(),
            });
        }
        if !self.streak_badge_uri.is_ascii() {
            return Err(ConfigError::Invalid {
                message: "streak_badge_uri must be ASCII".to_string(),
            });
        }
        if self.chain.block_time_minutes == 0 {
            return Err(ConfigError::Invalid {
                message: "chain.block_time_minutes must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env(var: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Env {
        var: var.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_deployment() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.streak_threshold, 15);
        assert_eq!(cfg.streak_badge_uri, DEFAULT_STREAK_BADGE_URI);
        assert_eq!(cfg.chain.block_time_minutes, 10);
        assert_eq!(cfg.chain.genesis.timestamp(), 0);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = LedgerConfig::from_yaml("streak_threshold: 5\n", "inline").unwrap();
        assert_eq!(cfg.streak_threshold, 5);
        assert_eq!(cfg.streak_badge_uri, DEFAULT_STREAK_BADGE_URI);
    }

    #[test]
    fn test_yaml_chain_section() {
        let yaml = r#"
streak_badge_uri: "ipfs://streak"
chain:
  genesis: "2025-01-01T00:00:00Z"
  block_time_minutes: 5
"#;
        let cfg = LedgerConfig::from_yaml(yaml, "inline").unwrap();
        assert_eq!(cfg.streak_badge_uri, "ipfs://streak");
        assert_eq!(cfg.chain.block_time_minutes, 5);
        assert_eq!(cfg.chain.genesis.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let err = LedgerConfig::from_yaml("streak_threshold: 0\n", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_STREAK_THRESHOLD, "3"),
            (ENV_BLOCK_TIME_MINUTES, "1"),
        ]);
        let cfg = LedgerConfig::default()
            .with_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.streak_threshold, 3);
        assert_eq!(cfg.chain.block_time_minutes, 1);
    }

    #[test]
    fn test_bad_env_value_names_variable() {
        let err = LedgerConfig::default()
            .with_env_overrides(|k| (k == ENV_STREAK_THRESHOLD).then(|| "many".to_string()))
            .unwrap_err();
        match err {
            ConfigError::Env { var, .. } => assert_eq!(var, ENV_STREAK_THRESHOLD),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[serial]
    fn test_load_reads_file_then_process_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.yaml");
        std::fs::write(&path, "streak_threshold: 7\n").unwrap();

        std::env::set_var(ENV_STREAK_BADGE_URI, "ipfs://from-env");
        let cfg = LedgerConfig::load(Some(&path));
        std::env::remove_var(ENV_STREAK_BADGE_URI);

        let cfg = cfg.unwrap();
        assert_eq!(cfg.streak_threshold, 7);
        assert_eq!(cfg.streak_badge_uri, "ipfs://from-env");
    }

    #[test]
    #[serial]
    fn test_load_missing_file_is_read_error() {
        let err = LedgerConfig::load(Some(Path::new("/nonexistent/attendance.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
