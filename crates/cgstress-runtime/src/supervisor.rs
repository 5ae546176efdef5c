//! Starting, tracking, reaping, and cancelling stress processes.
//!
//! Per target: `Absent → Running → {Cancelled, Crashed, Exited} → Absent`.
//! A target becomes `Running` once its registry entry is written and
//! returns to `Absent` when its reaper removes the entry.

use std::path::PathBuf;

use cgstress_common::config::StressConfig;
use cgstress_common::error::{Result, StressError};
use cgstress_common::types::StressRequest;
use cgstress_core::cgroup::{self, CgroupAttacher};
use tokio::process::Child;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::client::ContainerRuntime;
use crate::event::{StressEvent, StressOutcome};
use crate::launcher::{StressLauncher, StressNgLauncher};
use crate::registry::{CancelReply, SessionInfo, StressorRegistry, StressorHandle};

/// Runs stress workloads inside container cgroups.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct StressSupervisor<R, L = StressNgLauncher> {
    runtime: R,
    launcher: L,
    proc_root: PathBuf,
    attacher: CgroupAttacher,
    registry: StressorRegistry,
    events: broadcast::Sender<StressEvent>,
}

impl<R: ContainerRuntime> StressSupervisor<R> {
    /// Creates a supervisor launching the configured stress program.
    #[must_use]
    pub fn new(runtime: R, config: &StressConfig) -> Self {
        Self::with_launcher(runtime, StressNgLauncher::new(config.stress_program.clone()), config)
    }
}

impl<R: ContainerRuntime, L: StressLauncher> StressSupervisor<R, L> {
    /// Creates a supervisor with a custom workload launcher.
    #[must_use]
    pub fn with_launcher(runtime: R, launcher: L, config: &StressConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            runtime,
            launcher,
            proc_root: config.proc_root.clone(),
            attacher: CgroupAttacher::new(config.cgroup_root.clone()),
            registry: StressorRegistry::new(),
            events,
        }
    }

    /// Subscribes to lifecycle events published by reapers.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StressEvent> {
        self.events.subscribe()
    }

    /// Returns the registry of running stress processes.
    #[must_use]
    pub const fn registry(&self) -> &StressorRegistry {
        &self.registry
    }

    /// Returns `true` if a stress process is running for `target`.
    #[must_use]
    pub fn is_running(&self, target: &str) -> bool {
        self.registry.contains(target)
    }

    /// Lists running stress sessions.
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionInfo> {
        self.registry.sessions()
    }

    /// Resolves the cgroup a request would attach its workload to.
    ///
    /// # Errors
    ///
    /// Propagates runtime client failures unchanged, and returns
    /// [`StressError::CgroupNotFound`] if no cgroup names the container.
    pub async fn locate_cgroup(&self, request: &StressRequest) -> Result<String> {
        let pid = self.runtime.pid_from_container_id(&request.target).await?;
        let id = self.runtime.strip_protocol_prefix(&request.target).await?;
        let paths = cgroup::resolve(&self.proc_root, pid);
        cgroup::locate(paths.as_ref(), &id, request.scope)
    }

    /// Starts the request's stressors inside the target's cgroup.
    ///
    /// Returns once the process is attached and registered; its exit is
    /// handled by a detached reaper.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::AlreadyRunning`] if the target already has a
    /// stress process, and otherwise the first failure among pid lookup,
    /// cgroup resolution, launch, and attach. A process that was launched
    /// but could not be attached or registered is killed first.
    pub async fn execute_stress(&self, request: &StressRequest) -> Result<()> {
        tracing::info!(
            container = %request.target,
            stressors = %request.stressors,
            scope = %request.scope,
            "executing stressors"
        );
        if self.registry.contains(&request.target) {
            return Err(StressError::AlreadyRunning {
                target: request.target.clone(),
            });
        }

        let cgroup = self.locate_cgroup(request).await?;
        let mut child = self.launcher.launch(&request.stressor_args()).await?;
        let Some(pid) = child.id() else {
            return Err(StressError::Launch {
                program: self.launcher.program().to_owned(),
                source: std::io::Error::other("process exited before it could be tracked"),
            });
        };

        let guard = KillOnDrop::new(&mut child, pid);
        let _ = self.attacher.attach(&cgroup, pid)?;

        let (cancel_tx, cancel_rx) = mpsc::channel(1);
        if !self
            .registry
            .insert_if_absent(&request.target, StressorHandle::new(pid, cancel_tx))
        {
            return Err(StressError::AlreadyRunning {
                target: request.target.clone(),
            });
        }
        guard.disarm();

        let reaper = Reaper {
            target: request.target.clone(),
            pid,
            registry: self.registry.clone(),
            events: self.events.clone(),
        };
        drop(tokio::spawn(reaper.run(child, cancel_rx)));

        tracing::info!(container = %request.target, pid, cgroup = %cgroup, "stressors started");
        Ok(())
    }

    /// Kills the stress process registered for the request's target.
    ///
    /// Cancelling a target with nothing running succeeds without
    /// signaling anything, as does losing the race against a process that
    /// is already exiting.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::Signal`] if the kill could not be delivered.
    pub async fn cancel_stress(&self, request: &StressRequest) -> Result<()> {
        tracing::info!(container = %request.target, "canceling stressors");
        let Some(handle) = self.registry.get(&request.target) else {
            tracing::debug!(container = %request.target, "no stressors running");
            return Ok(());
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        if handle.cancel_tx().send(reply_tx).await.is_err() {
            return Ok(());
        }
        match reply_rx.await {
            Ok(Err(e)) => {
                tracing::error!(pid = handle.pid(), error = %e, "failed to stop stressors");
                Err(e)
            }
            Ok(Ok(())) | Err(_) => Ok(()),
        }
    }
}

/// Kills a launched process unless disarmed.
///
/// Covers every exit between launch and registration, so a stress process
/// never keeps running outside the registry or its cgroup.
struct KillOnDrop<'a> {
    child: &'a mut Child,
    pid: u32,
    armed: bool,
}

impl<'a> KillOnDrop<'a> {
    const fn new(child: &'a mut Child, pid: u32) -> Self {
        Self {
            child,
            pid,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for KillOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.child.start_kill() {
            Ok(()) => tracing::warn!(pid = self.pid, "killed stress process that failed to start"),
            Err(e) => tracing::error!(pid = self.pid, error = %e, "failed to kill orphaned stress process"),
        }
    }
}

/// Detached task that owns a stress process until it exits.
struct Reaper {
    target: String,
    pid: u32,
    registry: StressorRegistry,
    events: broadcast::Sender<StressEvent>,
}

impl Reaper {
    async fn run(self, mut child: Child, mut cancel_rx: mpsc::Receiver<CancelReply>) {
        let mut cancel_requested = false;
        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                Some(reply) = cancel_rx.recv() => {
                    let result = child
                        .start_kill()
                        .map_err(|source| StressError::Signal { pid: self.pid, source });
                    cancel_requested |= result.is_ok();
                    let _ = reply.send(result);
                }
            }
        };
        drop(cancel_rx);

        let outcome = match status {
            Ok(status) => StressOutcome::classify(status, cancel_requested),
            Err(e) => {
                tracing::error!(pid = self.pid, error = %e, "failed to wait for stress process");
                StressOutcome::Crashed {
                    code: None,
                    signal: None,
                }
            }
        };
        match outcome {
            StressOutcome::Cancelled => {
                tracing::info!(container = %self.target, pid = self.pid, "stressors cancelled");
            }
            StressOutcome::Exited => {
                tracing::info!(container = %self.target, pid = self.pid, "stressors finished");
            }
            StressOutcome::Crashed { .. } => {
                tracing::error!(
                    container = %self.target,
                    pid = self.pid,
                    outcome = %outcome,
                    "stressors exited accidentally"
                );
            }
        }

        let _ = self.registry.remove_if_pid(&self.target, self.pid);
        let _ = self.events.send(StressEvent {
            target: self.target,
            pid: self.pid,
            outcome,
        });
    }
}
