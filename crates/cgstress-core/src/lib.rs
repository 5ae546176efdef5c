//! # cgstress-core
//!
//! Cgroup plumbing for the stress agent.
//!
//! This crate provides:
//! - **Resolution**: rediscovering which cgroup a running process belongs to,
//!   per subsystem, from `/proc/<pid>/cgroup` and `/proc/<pid>/mountinfo`.
//! - **Location**: picking the cgroup that belongs to a container id and
//!   widening it to the pod level on request.
//! - **Attachment**: migrating a process into an existing cgroup through
//!   `cgroup.procs`.
//!
//! Nothing here creates, removes, or reconfigures cgroups.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cgroup;
