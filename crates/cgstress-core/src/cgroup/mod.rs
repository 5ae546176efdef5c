//! Cgroup v1 discovery and attachment.
//!
//! A running container's cgroup is found in three steps: [`path::resolve`]
//! turns a pid into a per-subsystem lookup, [`locate::locate`] probes the
//! [`SUBSYSTEMS`] catalog for the path naming the container, and
//! [`attach::CgroupAttacher`] moves a new process into that cgroup.

pub mod attach;
pub mod locate;
pub mod path;
pub mod procfs;

pub use attach::CgroupAttacher;
pub use locate::locate;
pub use path::{FailedPaths, ResolvedPaths, SubsystemPath, resolve};

/// Known cgroup v1 subsystems, in the order the locator probes them.
///
/// The first subsystem whose path contains the target wins, so the order
/// matters when a container shows up in more than one hierarchy.
pub const SUBSYSTEMS: &[&str] = &[
    "cpu",
    "memory",
    "systemd",
    "net_cls",
    "net_prio",
    "freezer",
    "blkio",
    "perf_event",
    "devices",
    "cpuset",
    "cpuacct",
    "pids",
    "hugetlb",
];
