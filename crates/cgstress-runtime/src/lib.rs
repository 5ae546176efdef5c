//! Stressor lifecycle management for the stress agent.
//!
//! [`supervisor::StressSupervisor`] ties the pieces together: it asks a
//! [`client::ContainerRuntime`] for the container's pid, locates the
//! container cgroup, starts the workload through a
//! [`launcher::StressLauncher`], attaches it, and hands the process to a
//! detached reaper that deregisters it on exit.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod client;
pub mod event;
pub mod launcher;
pub mod registry;
pub mod supervisor;

pub use supervisor::StressSupervisor;
