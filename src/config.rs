use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Settings for running the chapter from the command line.
///
/// Every field is optional in the TOML file:
///
/// ```toml
/// verify_timeout_ms = 500
/// log_filter = "filtering_sequence=debug"
/// exercises = ["golden_middle", "economical"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChapterConfig {
    /// Per-pull timeout applied by the step verifier.
    pub verify_timeout_ms: u64,
    /// Default `env_logger` filter, used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Exercises to run, by name. Empty runs all of them.
    pub exercises: Vec<String>,
}

impl Default for ChapterConfig {
    fn default() -> Self {
        Self {
            verify_timeout_ms: 1000,
            log_filter: "info".to_string(),
            exercises: Vec::new(),
        }
    }
}

impl ChapterConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verify_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "verify_timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "log_filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }

    pub fn selects(&self, exercise: &str) -> bool {
        self.exercises.is_empty() || self.exercises.iter().any(|name| name == exercise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ChapterConfig::from_toml_str("").unwrap();
        assert_eq!(config, ChapterConfig::default());
        assert_eq!(config.verify_timeout(), Duration::from_secs(1));
        assert!(config.selects("anything"));
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = ChapterConfig::from_toml_str(
            r#"
            verify_timeout_ms = 250
            exercises = ["golden_middle"]
            "#,
        )
        .unwrap();
        assert_eq!(config.verify_timeout_ms, 250);
        assert_eq!(config.log_filter, "info");
        assert!(config.selects("golden_middle"));
        assert!(!config.selects("economical"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ChapterConfig::from_toml_str("verify_timeout_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "verify_timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let err = ChapterConfig::from_toml_str("verify_timeout = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_filter = \"debug\"").unwrap();

        let config = ChapterConfig::load(file.path()).unwrap();
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ChapterConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
