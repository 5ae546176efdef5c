//! Global configuration model for the stress agent.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Result, StressError};

/// Root configuration for the stress agent.
///
/// Every field has a default, so a config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Where per-process kernel files are read from.
    pub proc_root: PathBuf,
    /// Where cgroup hierarchies are mounted.
    pub cgroup_root: PathBuf,
    /// Program spawned as the stress workload.
    pub stress_program: String,
    /// Number of lifecycle events buffered for slow subscribers.
    pub event_capacity: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(constants::DEFAULT_PROC_ROOT),
            cgroup_root: PathBuf::from(constants::DEFAULT_CGROUP_ROOT),
            stress_program: constants::DEFAULT_STRESS_PROGRAM.to_owned(),
            event_capacity: constants::DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl StressConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON,
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StressError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.stress_program.trim().is_empty() {
            return Err(StressError::Config {
                message: "stress_program must not be empty".into(),
            });
        }
        if self.event_capacity == 0 {
            return Err(StressError::Config {
                message: "event_capacity must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_host_paths() {
        let config = StressConfig::default();
        assert_eq!(config.proc_root, PathBuf::from("/proc"));
        assert_eq!(config.cgroup_root, PathBuf::from("/sys/fs/cgroup"));
        assert_eq!(config.stress_program, "stress-ng");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_merges_partial_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"proc_root": "/host/proc"}"#).unwrap();

        let config = StressConfig::load(&path).unwrap();
        assert_eq!(config.proc_root, PathBuf::from("/host/proc"));
        assert_eq!(config.stress_program, "stress-ng");
    }

    #[test]
    fn load_rejects_empty_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"stress_program": " "}"#).unwrap();

        let err = StressConfig::load(&path).unwrap_err();
        assert!(matches!(err, StressError::Config { .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = StressConfig::load(Path::new("/nonexistent/cgstress.json")).unwrap_err();
        assert!(matches!(err, StressError::Io { .. }));
    }
}
