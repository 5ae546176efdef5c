//! CLI command definitions and dispatch.

pub mod locate;
pub mod run;

use std::path::PathBuf;

use anyhow::Context;
use cgstress_common::config::StressConfig;
use clap::{Parser, Subcommand};

/// cgstress — inject synthetic load into running containers.
#[derive(Parser, Debug)]
#[command(name = "cgstress", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file.
    #[arg(long, global = true, env = "CGSTRESS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the procfs mount point (e.g. `/host/proc` in a pod).
    #[arg(long, global = true)]
    pub proc_root: Option<PathBuf>,

    /// Override the cgroup mount root.
    #[arg(long, global = true)]
    pub cgroup_root: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the cgroup a stress request would attach to.
    Locate(locate::LocateArgs),
    /// Run stressors in a container until interrupted.
    Run(run::RunArgs),
}

impl Cli {
    /// Builds the effective configuration from file and flags.
    fn load_config(&self) -> anyhow::Result<StressConfig> {
        let mut config = match &self.config {
            Some(path) => StressConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => StressConfig::default(),
        };
        if let Some(proc_root) = &self.proc_root {
            config.proc_root.clone_from(proc_root);
        }
        if let Some(cgroup_root) = &self.cgroup_root {
            config.cgroup_root.clone_from(cgroup_root);
        }
        tracing::debug!(?config, "effective configuration");
        Ok(config)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if configuration loading or the command fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    match cli.command {
        Command::Locate(args) => locate::execute(args, &config).await,
        Command::Run(args) => run::execute(args, &config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "cgstress",
            "--proc-root",
            "/host/proc",
            "locate",
            "--target",
            "docker://abc",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.proc_root, PathBuf::from("/host/proc"));
        assert_eq!(config.cgroup_root, PathBuf::from("/sys/fs/cgroup"));
    }

    #[test]
    fn run_parses_scope_and_stressors() {
        let cli = Cli::try_parse_from([
            "cgstress",
            "run",
            "--target",
            "containerd://abc",
            "--stressors",
            "--cpu 2 --timeout 30s",
            "--scope",
            "pod",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.stressors, "--cpu 2 --timeout 30s");
        assert_eq!(args.scope, cgstress_common::types::StressScope::Pod);
    }
}
