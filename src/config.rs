/*!
 * Configuration types for Tessera
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TesseraError};

/// Connection-wide defaults for table operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TesseraConfig {
    /// Prefix for auto-generated table names
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Cache imported tables in engine memory
    #[serde(default = "default_true")]
    pub import_memory: bool,

    /// Partition count for imports (0 = let the engine decide)
    #[serde(default)]
    pub import_repartition: u32,

    /// Storage level forced onto tables that receive a unique id column
    #[serde(default = "default_unique_id_storage_level")]
    pub unique_id_storage_level: String,

    /// Storage level used by `persist_default`
    #[serde(default = "default_storage_level")]
    pub default_storage_level: String,

    /// First value of sequential id columns
    #[serde(default = "default_sequential_id_from")]
    pub sequential_id_from: i64,

    /// Relative error for quantiles when the caller passes none
    #[serde(default = "default_quantile_relative_error")]
    pub quantile_relative_error: f64,

    /// Engine-side checkpoint directory, set when the connection opens
    #[serde(default)]
    pub checkpoint_dir: Option<String>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for debug level)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for TesseraConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            import_memory: true,
            import_repartition: 0,
            unique_id_storage_level: default_unique_id_storage_level(),
            default_storage_level: default_storage_level(),
            sequential_id_from: default_sequential_id_from(),
            quantile_relative_error: default_quantile_relative_error(),
            checkpoint_dir: None,
            log_level: LogLevel::default(),
            log_file: None,
            verbose: false,
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_name_prefix() -> String {
    "tessera_tmp_".to_string()
}

fn default_unique_id_storage_level() -> String {
    "MEMORY_ONLY".to_string()
}

fn default_storage_level() -> String {
    "MEMORY_AND_DISK".to_string()
}

fn default_sequential_id_from() -> i64 {
    1
}

fn default_quantile_relative_error() -> f64 {
    1e-5
}

impl TesseraConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TesseraConfig = toml::from_str(&contents)
            .map_err(|e| TesseraError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| TesseraError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values no operation could use
    pub fn validate(&self) -> Result<()> {
        if self.name_prefix.trim().is_empty() {
            return Err(TesseraError::Config("name_prefix must not be empty".to_string()));
        }
        if self.unique_id_storage_level.trim().is_empty() {
            return Err(TesseraError::Config(
                "unique_id_storage_level must not be empty".to_string(),
            ));
        }
        if self.default_storage_level.trim().is_empty() {
            return Err(TesseraError::Config(
                "default_storage_level must not be empty".to_string(),
            ));
        }
        if self.quantile_relative_error.is_nan() || self.quantile_relative_error < 0.0 {
            return Err(TesseraError::Config(format!(
                "quantile_relative_error must be >= 0, got {}",
                self.quantile_relative_error
            )));
        }
        if matches!(&self.checkpoint_dir, Some(dir) if dir.trim().is_empty()) {
            return Err(TesseraError::Config(
                "checkpoint_dir must not be empty when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = TesseraConfig::default();
        assert_eq!(config.name_prefix, "tessera_tmp_");
        assert!(config.import_memory);
        assert_eq!(config.import_repartition, 0);
        assert_eq!(config.unique_id_storage_level, "MEMORY_ONLY");
        assert_eq!(config.sequential_id_from, 1);
        assert!(config.checkpoint_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TesseraConfig = toml::from_str("").unwrap();
        assert_eq!(config, TesseraConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
name_prefix = "scratch_"
import_memory = false
sequential_id_from = 0
checkpoint_dir = "/tmp/checkpoints"
log_level = "debug"
"#;
        let config: TesseraConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.name_prefix, "scratch_");
        assert!(!config.import_memory);
        assert_eq!(config.sequential_id_from, 0);
        assert_eq!(config.checkpoint_dir.as_deref(), Some("/tmp/checkpoints"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.unique_id_storage_level, "MEMORY_ONLY");
    }

    #[test]
    fn test_file_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let config = TesseraConfig {
            import_repartition: 8,
            quantile_relative_error: 0.01,
            ..Default::default()
        };
        config.to_file(file.path()).unwrap();

        let loaded = TesseraConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "quantile_relative_error = -1.0\n").unwrap();

        let err = TesseraConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, TesseraError::Config(_)));
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "import_memory = \"sometimes\"\n").unwrap();

        assert!(matches!(
            TesseraConfig::from_file(file.path()),
            Err(TesseraError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TesseraConfig::from_file(Path::new("/nonexistent/tessera.toml")).unwrap_err();
        assert!(matches!(err, TesseraError::Io(_)));
    }

    #[test]
    fn test_validate() {
        let mut config = TesseraConfig::default();
        config.name_prefix = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = TesseraConfig::default();
        config.quantile_relative_error = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = TesseraConfig::default();
        config.checkpoint_dir = Some(String::new());
        assert!(config.validate().is_err());
    }
}
