//! `cgstress run` — Run stressors in a container until interrupted.

use std::time::Duration;

use anyhow::Context;
use cgstress_common::config::StressConfig;
use cgstress_common::types::{StressRequest, StressScope};
use cgstress_runtime::StressSupervisor;
use cgstress_runtime::client::ProcfsRuntime;
use cgstress_runtime::event::StressEvent;
use clap::Args;
use tokio::sync::broadcast;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Container id, with its runtime prefix (e.g. `docker://<id>`).
    #[arg(long)]
    pub target: String,

    /// Arguments passed to stress-ng, as one string.
    #[arg(long, allow_hyphen_values = true)]
    pub stressors: String,

    /// Attach to the container cgroup or the enclosing pod cgroup.
    #[arg(long, default_value_t = StressScope::Container)]
    pub scope: StressScope,

    /// Cancel after this many seconds instead of waiting for Ctrl+C.
    #[arg(long)]
    pub duration: Option<u64>,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if the stressors cannot be started or cancelled.
pub async fn execute(args: RunArgs, config: &StressConfig) -> anyhow::Result<()> {
    let supervisor = StressSupervisor::new(ProcfsRuntime::new(config.proc_root.clone()), config);
    let mut events = supervisor.subscribe();
    let duration = args.duration;
    let request = StressRequest::new(args.target, args.stressors, args.scope);

    supervisor
        .execute_stress(&request)
        .await
        .with_context(|| format!("starting stressors for {}", request.target))?;
    if let Some(session) = supervisor.sessions().first() {
        eprintln!("  stressors running for {} (pid {})", session.target, session.pid);
    }

    let deadline = async {
        match duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        event = events.recv() => {
            report(event);
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
        () = deadline => tracing::info!("duration elapsed"),
    }

    supervisor
        .cancel_stress(&request)
        .await
        .with_context(|| format!("cancelling stressors for {}", request.target))?;
    report(events.recv().await);
    Ok(())
}

fn report(event: Result<StressEvent, broadcast::error::RecvError>) {
    match event {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => eprintln!("  {json}"),
            Err(e) => tracing::warn!(error = %e, "failed to encode stress event"),
        },
        Err(e) => tracing::warn!(error = %e, "stress event lost"),
    }
}
