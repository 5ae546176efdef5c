//! Container runtime client abstraction.
//!
//! The supervisor only needs two things from a container runtime: the pid
//! of a container's process, and the bare container id without its
//! `<runtime>://` prefix. [`ProcfsRuntime`] answers both from procfs alone.

use std::future::Future;
use std::path::{Path, PathBuf};

use cgstress_common::constants::{KNOWN_RUNTIME_PROTOCOLS, PROC_CGROUP_FILE};
use cgstress_common::error::{Result, StressError};

/// Maps container identifiers to kernel processes.
pub trait ContainerRuntime: Send + Sync {
    /// Returns the pid of the container's main process.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is unknown or not running.
    fn pid_from_container_id(&self, target: &str) -> impl Future<Output = Result<u32>> + Send;

    /// Removes the `<runtime>://` prefix from a container identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier has no recognized prefix.
    fn strip_protocol_prefix(&self, target: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Runtime client that finds containers by scanning `/proc/*/cgroup`.
///
/// The container's process is taken to be the lowest pid whose cgroup
/// membership mentions the container id.
#[derive(Debug, Clone)]
pub struct ProcfsRuntime {
    proc_root: PathBuf,
}

impl ProcfsRuntime {
    /// Creates a client reading processes under `proc_root`.
    #[must_use]
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl ContainerRuntime for ProcfsRuntime {
    async fn pid_from_container_id(&self, target: &str) -> Result<u32> {
        let id = strip_prefix(target)?;
        let proc_root = self.proc_root.clone();
        let lookup_id = id.clone();
        let pid = tokio::task::spawn_blocking(move || lowest_pid_in_container(&proc_root, &lookup_id))
            .await
            .map_err(|e| StressError::Runtime {
                message: format!("procfs scan aborted: {e}"),
            })??;
        tracing::debug!(container = %id, pid, "resolved container pid from procfs");
        Ok(pid)
    }

    async fn strip_protocol_prefix(&self, target: &str) -> Result<String> {
        strip_prefix(target)
    }
}

fn strip_prefix(target: &str) -> Result<String> {
    let Some((protocol, id)) = target.split_once("://") else {
        return Err(StressError::Runtime {
            message: format!("container id {target:?} has no runtime protocol prefix"),
        });
    };
    if !KNOWN_RUNTIME_PROTOCOLS.contains(&protocol) {
        return Err(StressError::Runtime {
            message: format!("unsupported runtime protocol {protocol:?} in {target:?}"),
        });
    }
    if id.is_empty() {
        return Err(StressError::Runtime {
            message: format!("empty container id in {target:?}"),
        });
    }
    Ok(id.to_owned())
}

fn lowest_pid_in_container(proc_root: &Path, id: &str) -> Result<u32> {
    let entries = std::fs::read_dir(proc_root).map_err(|e| StressError::io(proc_root, e))?;
    entries
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
        .filter(|pid| {
            // processes may exit mid-scan
            std::fs::read_to_string(proc_root.join(pid.to_string()).join(PROC_CGROUP_FILE))
                .is_ok_and(|content| content.contains(id))
        })
        .min()
        .ok_or_else(|| StressError::Runtime {
            message: format!("no process found for container {id}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_process(root: &Path, pid: u32, cgroup: &str) {
        let dir = root.join(pid.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PROC_CGROUP_FILE), cgroup).unwrap();
    }

    #[test]
    fn strip_prefix_accepts_known_runtimes() {
        assert_eq!(strip_prefix("docker://abc").unwrap(), "abc");
        assert_eq!(strip_prefix("containerd://def").unwrap(), "def");
        assert_eq!(strip_prefix("cri-o://ghi").unwrap(), "ghi");
    }

    #[test]
    fn strip_prefix_rejects_bare_and_unknown_ids() {
        assert!(strip_prefix("abc").is_err());
        assert!(strip_prefix("rkt://abc").is_err());
        assert!(strip_prefix("docker://").is_err());
    }

    #[tokio::test]
    async fn pid_lookup_picks_lowest_matching_process() {
        let dir = tempfile::tempdir().unwrap();
        add_process(dir.path(), 300, "4:cpu:/kubepods/pod1/abc\n");
        add_process(dir.path(), 120, "4:cpu:/kubepods/pod1/abc\n");
        add_process(dir.path(), 50, "4:cpu:/kubepods/pod1/other\n");
        std::fs::create_dir_all(dir.path().join("self")).unwrap();

        let runtime = ProcfsRuntime::new(dir.path());
        assert_eq!(runtime.pid_from_container_id("docker://abc").await.unwrap(), 120);
    }

    #[tokio::test]
    async fn pid_lookup_fails_for_unknown_container() {
        let dir = tempfile::tempdir().unwrap();
        add_process(dir.path(), 1, "0::/init.scope\n");

        let runtime = ProcfsRuntime::new(dir.path());
        let err = runtime.pid_from_container_id("containerd://missing").await.unwrap_err();
        assert!(matches!(err, StressError::Runtime { .. }));
    }
}
