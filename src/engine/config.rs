//! Engine configuration
//!
//! Read from a JSON file. Every field is optional; missing fields take the
//! defaults below.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::executor::{FailurePolicy, MergeSettings};
use crate::observability::{log_event_with_fields, Event, Severity};
use crate::planner::PageBounds;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Largest page size served
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,

    /// Page size when the request gives none
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    #[serde(default = "default_sort_field")]
    pub default_sort_field: String,

    /// Bound on each partition call
    #[serde(default = "default_partition_timeout_ms")]
    pub partition_timeout_ms: u64,

    /// Partition counts in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// How long a discovered partition set is reused
    #[serde(default = "default_registry_ttl_secs")]
    pub registry_ttl_secs: u64,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Collections that are never partitions
    #[serde(default = "default_reserved_collections")]
    pub reserved_collections: Vec<String>,

    /// Minimum log severity: trace, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_limit() -> u64 {
    100
}
fn default_limit() -> u64 {
    20
}
fn default_sort_field() -> String {
    "number".to_string()
}
fn default_partition_timeout_ms() -> u64 {
    5000
}
fn default_max_concurrency() -> usize {
    8
}
fn default_registry_ttl_secs() -> u64 {
    300
}
fn default_reserved_collections() -> Vec<String> {
    vec!["syllabus".to_string()]
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_limit: default_max_limit(),
            default_limit: default_limit(),
            default_sort_field: default_sort_field(),
            partition_timeout_ms: default_partition_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            registry_ttl_secs: default_registry_ttl_secs(),
            failure_policy: FailurePolicy::default(),
            reserved_collections: default_reserved_collections(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Loads and validates a config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("failure_policy", config.failure_policy.as_str()),
                ("path", &path.display().to_string()),
            ],
        );
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_limit == 0 {
            return Err(ConfigError::Invalid("max_limit must be > 0".into()));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit must be between 1 and max_limit ({})",
                self.max_limit
            )));
        }
        if self.default_sort_field.trim().is_empty() {
            return Err(ConfigError::Invalid("default_sort_field must not be empty".into()));
        }
        if self.partition_timeout_ms == 0 {
            return Err(ConfigError::Invalid("partition_timeout_ms must be > 0".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be > 0".into()));
        }
        self.log_severity()?;
        Ok(())
    }

    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    pub fn page_bounds(&self) -> PageBounds {
        PageBounds {
            max_limit: self.max_limit,
            default_limit: self.default_limit,
            default_sort_field: self.default_sort_field.clone(),
        }
    }

    pub fn partition_timeout(&self) -> Duration {
        Duration::from_millis(self.partition_timeout_ms)
    }

    pub fn registry_ttl(&self) -> Duration {
        Duration::from_secs(self.registry_ttl_secs)
    }

    pub fn merge_settings(&self) -> MergeSettings {
        MergeSettings {
            partition_timeout: self.partition_timeout(),
            max_concurrency: self.max_concurrency,
            failure_policy: self.failure_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_limit, 100);
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.default_sort_field, "number");
        assert_eq!(config.partition_timeout(), Duration::from_secs(5));
        assert_eq!(config.registry_ttl(), Duration::from_secs(300));
        assert_eq!(config.failure_policy, FailurePolicy::Degrade);
        assert_eq!(config.reserved_collections, vec!["syllabus"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"{"failure_policy": "fail_fast", "max_limit": 50, "log_level": "warn"}"#,
        )
        .unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.max_limit, 50);
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.log_severity().unwrap(), Severity::Warn);
        assert_eq!(config.page_bounds().max_limit, 50);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"{"max_limit": 10, "default_limit": 20}"#).unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));

        fs::write(file.path(), r#"{"log_level": "loud"}"#).unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));

        fs::write(file.path(), r#"{"failure_policy": "panic"}"#).unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/examdex.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert_eq!(EngineConfig::load_or_default(None).unwrap(), EngineConfig::default());
    }
}
