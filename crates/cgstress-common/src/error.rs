//! Unified error types for the cgstress workspace.
//!
//! Every fallible operation in the resolver, locator and supervisor returns
//! [`StressError`]. The variants follow the failure taxonomy of a stress
//! request: identifier resolution, cgroup resolution, and process control.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StressError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A line of a `/proc/<pid>/cgroup` file did not have three fields.
    #[error("invalid cgroup entry: {line:?}")]
    InvalidCgroupEntry {
        /// The offending line, verbatim.
        line: String,
    },

    /// No mountinfo entry carries the subsystem in its super options.
    #[error("mount destination not found for subsystem {subsystem}")]
    MountNotFound {
        /// Subsystem that has no visible mount.
        subsystem: String,
    },

    /// A cgroup path could not be expressed relative to its mount point.
    #[error("cannot make {path} relative to {base}")]
    UnrelatedPath {
        /// Mount destination used as the base.
        base: String,
        /// Cgroup path reported by the kernel.
        path: String,
    },

    /// The requested subsystem is not part of the process's cgroup set.
    #[error("cgroup controller {subsystem} is not active")]
    ControllerNotActive {
        /// Subsystem that was looked up.
        subsystem: String,
    },

    /// No subsystem path contains the target identifier.
    #[error("no valid cgroup found for {target}")]
    CgroupNotFound {
        /// Normalized target identifier.
        target: String,
    },

    /// Building the subsystem table for a process failed.
    ///
    /// Captured at resolution time and surfaced on first lookup.
    #[error("failed to resolve cgroup paths for pid {pid}: {source}")]
    Resolution {
        /// Process whose cgroup membership was being resolved.
        pid: u32,
        /// The captured underlying failure.
        source: Arc<StressError>,
    },

    /// The container runtime client could not resolve an identifier.
    #[error("container runtime error: {message}")]
    Runtime {
        /// Description of the runtime failure.
        message: String,
    },

    /// The stress workload could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that was being spawned.
        program: String,
        /// Underlying spawn error.
        source: std::io::Error,
    },

    /// A started stress process could not be moved into its cgroup.
    #[error("failed to attach pid {pid} to cgroup {path}: {source}")]
    Attach {
        /// Process being attached.
        pid: u32,
        /// Cgroup directory (or `cgroup.procs` file) involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Signaling a stress process failed.
    #[error("failed to signal stress process {pid}: {source}")]
    Signal {
        /// Process that was being signaled.
        pid: u32,
        /// Underlying error reported by the kernel.
        source: std::io::Error,
    },

    /// A stressor is already registered for the target.
    #[error("stressors already running for {target}")]
    AlreadyRunning {
        /// Target identifier of the existing session.
        target: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl StressError {
    /// Builds an [`StressError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_includes_captured_cause() {
        let cause = Arc::new(StressError::InvalidCgroupEntry {
            line: "garbage".into(),
        });
        let err = StressError::Resolution { pid: 42, source: cause };
        let msg = err.to_string();
        assert!(msg.contains("pid 42"));
        assert!(msg.contains("invalid cgroup entry"));
    }

    #[test]
    fn not_found_names_the_target() {
        let err = StressError::CgroupNotFound {
            target: "abc123".into(),
        };
        assert_eq!(err.to_string(), "no valid cgroup found for abc123");
    }
}
