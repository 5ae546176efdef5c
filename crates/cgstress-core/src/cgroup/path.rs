//! Per-subsystem cgroup paths of an existing process.
//!
//! [`resolve`] reads a process's cgroup membership and localizes each path
//! against the root of the mount that carries the subsystem, which is what
//! makes the result usable from inside a containerized agent whose cgroup
//! mounts are bind mounts of a sub-tree.
//!
//! Resolution never fails eagerly. A broken file yields a [`FailedPaths`]
//! that reports the captured error on every lookup, so a caller probing
//! several subsystems decides for itself when the failure matters.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use cgstress_common::constants::{PROC_CGROUP_FILE, PROC_MOUNTINFO_FILE};
use cgstress_common::error::{Result, StressError};

use super::procfs;

/// Lookup from a subsystem name to the process's cgroup path in it.
pub trait SubsystemPath: Send + Sync {
    /// Returns the cgroup path of `subsystem`, rooted at `/`.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::ControllerNotActive`] if the process is not a
    /// member of the subsystem, or the error captured during resolution.
    fn path(&self, subsystem: &str) -> Result<String>;
}

/// Table-backed lookup produced by a successful resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPaths {
    paths: HashMap<String, String>,
}

impl ResolvedPaths {
    /// Wraps an already localized subsystem → path table.
    #[must_use]
    pub const fn new(paths: HashMap<String, String>) -> Self {
        Self { paths }
    }
}

impl SubsystemPath for ResolvedPaths {
    fn path(&self, subsystem: &str) -> Result<String> {
        self.paths
            .get(subsystem)
            .or_else(|| self.paths.get(&format!("name={subsystem}")))
            .cloned()
            .ok_or_else(|| StressError::ControllerNotActive {
                subsystem: subsystem.to_owned(),
            })
    }
}

/// Lookup that always fails with the error captured at resolution time.
#[derive(Debug, Clone)]
pub struct FailedPaths {
    pid: u32,
    cause: Arc<StressError>,
}

impl FailedPaths {
    /// Captures `cause` as the resolution failure for `pid`.
    #[must_use]
    pub fn new(pid: u32, cause: StressError) -> Self {
        Self {
            pid,
            cause: Arc::new(cause),
        }
    }
}

impl SubsystemPath for FailedPaths {
    fn path(&self, _subsystem: &str) -> Result<String> {
        Err(StressError::Resolution {
            pid: self.pid,
            source: Arc::clone(&self.cause),
        })
    }
}

/// Resolves the cgroup paths of `pid` from the files under `proc_root`.
///
/// Both `/proc/<pid>/cgroup` and `/proc/<pid>/mountinfo` are read once per
/// call. Any failure is deferred into the returned lookup.
#[must_use]
pub fn resolve(proc_root: &Path, pid: u32) -> Box<dyn SubsystemPath> {
    match localized_paths(proc_root, pid) {
        Ok(paths) => {
            tracing::debug!(pid, subsystems = paths.len(), "resolved cgroup paths");
            Box::new(ResolvedPaths::new(paths))
        }
        Err(e) => {
            tracing::debug!(pid, error = %e, "cgroup resolution failed, deferring error");
            Box::new(FailedPaths::new(pid, e))
        }
    }
}

fn localized_paths(proc_root: &Path, pid: u32) -> Result<HashMap<String, String>> {
    let membership = procfs::read_proc_file(proc_root, pid, PROC_CGROUP_FILE)?;
    let raw = procfs::parse_cgroup_membership(&membership)?;
    if raw.is_empty() {
        return Ok(raw);
    }

    let mountinfo = procfs::read_proc_file(proc_root, pid, PROC_MOUNTINFO_FILE)?;
    let mounts = procfs::parse_mountinfo(&mountinfo);

    raw.into_iter()
        .map(|(subsystem, path)| -> Result<(String, String)> {
            let mount = procfs::find_mount(&mounts, &subsystem)?;
            let localized = localize(&mount.root, &path)?;
            tracing::trace!(
                pid,
                subsystem = %subsystem,
                mount_point = %mount.mount_point,
                path = %localized,
                "localized cgroup path"
            );
            Ok((subsystem, localized))
        })
        .collect()
}

/// Expresses a kernel-reported cgroup path relative to a mount root.
///
/// When the two coincide the mount root itself is kept. The result is
/// always rooted at `/`.
fn localize(root: &str, path: &str) -> Result<String> {
    let rel = relative_to(root, path)?;
    if rel == "." {
        Ok(rooted(root))
    } else {
        Ok(rooted(&rel))
    }
}

/// Lexical relative path from `base` to `target`; both must be absolute.
fn relative_to(base: &str, target: &str) -> Result<String> {
    if !base.starts_with('/') || !target.starts_with('/') {
        return Err(StressError::UnrelatedPath {
            base: base.to_owned(),
            path: target.to_owned(),
        });
    }
    let base_parts = clean_parts(base);
    let target_parts = clean_parts(target);
    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel: Vec<&str> = std::iter::repeat_n("..", base_parts.len() - common).collect();
    rel.extend_from_slice(&target_parts[common..]);
    if rel.is_empty() {
        Ok(".".to_owned())
    } else {
        Ok(rel.join("/"))
    }
}

/// Joins `path` onto `/` and cleans it; `..` cannot climb above the root.
fn rooted(path: &str) -> String {
    format!("/{}", clean_parts(path).join("/"))
}

fn clean_parts(path: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                let _ = parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts
}
