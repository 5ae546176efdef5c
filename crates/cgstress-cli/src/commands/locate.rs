//! `cgstress locate` — Print the cgroup a stress request would use.

use cgstress_common::config::StressConfig;
use cgstress_common::types::{StressRequest, StressScope};
use cgstress_core::cgroup;
use cgstress_runtime::StressSupervisor;
use cgstress_runtime::client::{ContainerRuntime, ProcfsRuntime};
use clap::Args;

/// Arguments for the `locate` command.
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Container id, with its runtime prefix (e.g. `containerd://<id>`).
    #[arg(long)]
    pub target: String,

    /// Use this pid instead of searching procfs for the container.
    #[arg(long)]
    pub pid: Option<u32>,

    /// Cgroup level to report.
    #[arg(long, default_value_t = StressScope::Container)]
    pub scope: StressScope,
}

/// Executes the `locate` command.
///
/// # Errors
///
/// Returns an error if the container or its cgroup cannot be found.
#[allow(clippy::print_stdout)]
pub async fn execute(args: LocateArgs, config: &StressConfig) -> anyhow::Result<()> {
    let runtime = ProcfsRuntime::new(config.proc_root.clone());
    let path = match args.pid {
        Some(pid) => {
            let id = runtime.strip_protocol_prefix(&args.target).await?;
            let paths = cgroup::resolve(&config.proc_root, pid);
            cgroup::locate(paths.as_ref(), &id, args.scope)?
        }
        None => {
            let request = StressRequest::new(args.target.clone(), String::new(), args.scope);
            StressSupervisor::new(runtime, config)
                .locate_cgroup(&request)
                .await?
        }
    };
    tracing::debug!(container = %args.target, path = %path, "located cgroup");
    println!("{path}");
    Ok(())
}
