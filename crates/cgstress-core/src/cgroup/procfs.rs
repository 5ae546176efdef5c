//! Parsers for the per-process kernel files under `/proc/<pid>`.
//!
//! Both parsers work on file contents rather than paths so they can be
//! exercised against synthetic input.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cgstress_common::error::{Result, StressError};

/// One line of `/proc/<pid>/mountinfo`, reduced to the fields we consult.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Field 3: root of the mount within its filesystem.
    pub root: String,
    /// Field 4: mount point relative to the reader's root.
    pub mount_point: String,
    /// Last field, split on commas (super options for cgroup mounts).
    pub options: Vec<String>,
}

/// Returns `<proc_root>/<pid>/<name>`.
#[must_use]
pub fn proc_file(proc_root: &Path, pid: u32, name: &str) -> PathBuf {
    proc_root.join(pid.to_string()).join(name)
}

/// Reads a per-process file to a string.
///
/// # Errors
///
/// Returns [`StressError::Io`] if the file cannot be read.
pub fn read_proc_file(proc_root: &Path, pid: u32, name: &str) -> Result<String> {
    let path = proc_file(proc_root, pid, name);
    std::fs::read_to_string(&path).map_err(|e| StressError::io(path, e))
}

/// Parses `/proc/<pid>/cgroup` into a subsystem → path table.
///
/// Each line is `hierarchy-id:subsys[,subsys...]:path`. A named hierarchy
/// such as `name=systemd` is kept under that literal key. Empty subsystem
/// names (the cgroup v2 `0::/` line) contribute nothing.
///
/// # Errors
///
/// Returns [`StressError::InvalidCgroupEntry`] for a line with fewer than
/// three colon-separated fields.
pub fn parse_cgroup_membership(content: &str) -> Result<HashMap<String, String>> {
    let mut memberships = HashMap::new();
    for line in content.lines() {
        let mut parts = line.splitn(3, ':');
        let (Some(_id), Some(subsystems), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(StressError::InvalidCgroupEntry {
                line: line.to_owned(),
            });
        };
        for subsystem in subsystems.split(',').filter(|s| !s.is_empty()) {
            let _ = memberships.insert(subsystem.to_owned(), path.to_owned());
        }
    }
    Ok(memberships)
}

/// Parses `/proc/<pid>/mountinfo`.
///
/// Lines too short to carry a mount point are skipped.
#[must_use]
pub fn parse_mountinfo(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            let options = fields[fields.len() - 1]
                .split(',')
                .map(str::to_owned)
                .collect();
            Some(MountEntry {
                root: fields[3].to_owned(),
                mount_point: fields[4].to_owned(),
                options,
            })
        })
        .collect()
}

/// Finds the mount of the hierarchy carrying `subsystem`.
///
/// The first entry whose options contain `subsystem` exactly wins.
///
/// # Errors
///
/// Returns [`StressError::MountNotFound`] if no entry matches.
pub fn find_mount<'a>(mounts: &'a [MountEntry], subsystem: &str) -> Result<&'a MountEntry> {
    mounts
        .iter()
        .find(|m| m.options.iter().any(|opt| opt == subsystem))
        .ok_or_else(|| StressError::MountNotFound {
            subsystem: subsystem.to_owned(),
        })
}
