//! Spawning the stress workload.

use std::future::Future;
use std::process::Stdio;

use cgstress_common::constants::DEFAULT_STRESS_PROGRAM;
use cgstress_common::error::{Result, StressError};
use tokio::process::{Child, Command};

/// Starts the external process that generates load.
pub trait StressLauncher: Send + Sync {
    /// Name of the program this launcher starts, used in error reports.
    fn program(&self) -> &str;

    /// Spawns the workload with `args` and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`StressError::Launch`] if the process cannot be started.
    fn launch(&self, args: &[String]) -> impl Future<Output = Result<Child>> + Send;
}

/// Launches a program found on `PATH`, `stress-ng` by default.
#[derive(Debug, Clone)]
pub struct StressNgLauncher {
    program: String,
}

impl StressNgLauncher {
    /// Creates a launcher for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for StressNgLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_STRESS_PROGRAM)
    }
}

impl StressLauncher for StressNgLauncher {
    fn program(&self) -> &str {
        &self.program
    }

    async fn launch(&self, args: &[String]) -> Result<Child> {
        let launch_err = |source| StressError::Launch {
            program: self.program.clone(),
            source,
        };
        let binary = which::which(&self.program)
            .map_err(|e| launch_err(std::io::Error::new(std::io::ErrorKind::NotFound, e)))?;

        let child = Command::new(&binary)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(launch_err)?;
        tracing::debug!(program = %binary.display(), ?args, pid = ?child.id(), "stress workload spawned");
        Ok(child)
    }
}
