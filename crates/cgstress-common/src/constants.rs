//! System-wide constants and default paths.

/// Mount point of the kernel's per-process information.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Root under which cgroup v1 hierarchies are mounted.
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Program launched to generate synthetic load.
pub const DEFAULT_STRESS_PROGRAM: &str = "stress-ng";

/// Capacity of the stress lifecycle event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Per-process cgroup membership file name under `/proc/<pid>`.
pub const PROC_CGROUP_FILE: &str = "cgroup";

/// Per-process mount table file name under `/proc/<pid>`.
pub const PROC_MOUNTINFO_FILE: &str = "mountinfo";

/// File that receives pids to migrate into a cgroup.
pub const CGROUP_PROCS_FILE: &str = "cgroup.procs";

/// Container runtime protocols accepted as identifier prefixes.
pub const KNOWN_RUNTIME_PROTOCOLS: &[&str] = &["docker", "containerd", "cri-o"];
