//! Migrating processes into existing cgroup v1 hierarchies.
//!
//! A located cgroup path is relative to a hierarchy root, and the same path
//! usually exists in several hierarchies (`cpu,cpuacct`, `memory`, ...).
//! Attaching writes the pid into `cgroup.procs` of every hierarchy that
//! carries the path.

use std::io::Write;
use std::path::{Path, PathBuf};

use cgstress_common::constants::CGROUP_PROCS_FILE;
use cgstress_common::error::{Result, StressError};

/// Moves processes into cgroups found under a cgroup mount root.
#[derive(Debug, Clone)]
pub struct CgroupAttacher {
    root: PathBuf,
}

impl CgroupAttacher {
    /// Creates an attacher for hierarchies mounted under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lists the cgroup directories for `cgroup` across all hierarchies.
    ///
    /// Symlinked hierarchy aliases (`cpu` → `cpu,cpuacct`) are skipped so
    /// each hierarchy is visited once. The result is sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the mount root cannot be listed.
    pub fn cgroup_dirs(&self, cgroup: &str) -> Result<Vec<PathBuf>> {
        let relative = cgroup.trim_start_matches('/');
        let entries = std::fs::read_dir(&self.root).map_err(|e| StressError::io(&self.root, e))?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StressError::io(&self.root, e))?;
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            if !is_dir {
                continue;
            }
            let dir = entry.path().join(relative);
            if dir.join(CGROUP_PROCS_FILE).is_file() {
                dirs.push(dir);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Moves `pid` into `cgroup` in every hierarchy that carries it.
    ///
    /// Returns the directories the process was written into.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::Attach`] if no hierarchy carries the cgroup or
    /// a `cgroup.procs` write fails.
    pub fn attach(&self, cgroup: &str, pid: u32) -> Result<Vec<PathBuf>> {
        let dirs = self.cgroup_dirs(cgroup)?;
        if dirs.is_empty() {
            return Err(StressError::Attach {
                pid,
                path: self.root.join(cgroup.trim_start_matches('/')),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no cgroup hierarchy contains this path",
                ),
            });
        }
        for dir in &dirs {
            write_pid(&dir.join(CGROUP_PROCS_FILE), pid)?;
        }
        tracing::debug!(pid, cgroup, hierarchies = dirs.len(), "attached process to cgroup");
        Ok(dirs)
    }
}

fn write_pid(procs: &Path, pid: u32) -> Result<()> {
    let attach_err = |source| StressError::Attach {
        pid,
        path: procs.to_path_buf(),
        source,
    };
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .open(procs)
        .map_err(attach_err)?;
    file.write_all(pid.to_string().as_bytes()).map_err(attach_err)
}
