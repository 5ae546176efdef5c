//! Stressor lifecycle events.
//!
//! The reaper publishes one [`StressEvent`] per stress process once it has
//! been deregistered. Nobody is required to listen.

use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nix::sys::signal::Signal;
use serde::Serialize;

/// How a stress process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StressOutcome {
    /// Killed on request through the supervisor's cancel path.
    Cancelled,
    /// Exited non-zero, or died from a signal nobody asked for.
    Crashed {
        /// Exit code, if the process exited.
        code: Option<i32>,
        /// Terminating signal, if the process was signaled.
        signal: Option<i32>,
    },
    /// Ran to completion with a zero exit status.
    Exited,
}

impl StressOutcome {
    /// Classifies an exit status.
    ///
    /// A SIGKILL only counts as a cancellation when the supervisor itself
    /// delivered one; the OOM killer sends the same signal.
    #[must_use]
    pub fn classify(status: ExitStatus, cancel_requested: bool) -> Self {
        if status.success() {
            return Self::Exited;
        }
        let signal = status.signal();
        if cancel_requested && signal == Some(Signal::SIGKILL as i32) {
            Self::Cancelled
        } else {
            Self::Crashed {
                code: status.code(),
                signal,
            }
        }
    }
}

impl fmt::Display for StressOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::Exited => write!(f, "exited"),
            Self::Crashed {
                signal: Some(sig), ..
            } => match Signal::try_from(*sig) {
                Ok(signal) => write!(f, "killed by {}", signal.as_str()),
                Err(_) => write!(f, "killed by signal {sig}"),
            },
            Self::Crashed { code: Some(code), .. } => write!(f, "exited with code {code}"),
            Self::Crashed { .. } => write!(f, "lost"),
        }
    }
}

/// Emitted after a stress process has exited and been deregistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StressEvent {
    /// Target identifier the process was registered under.
    pub target: String,
    /// Pid of the stress process.
    pub pid: u32,
    /// How it ended.
    pub outcome: StressOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_exit_is_normal() {
        let outcome = StressOutcome::classify(ExitStatus::from_raw(0), true);
        assert_eq!(outcome, StressOutcome::Exited);
    }

    #[test]
    fn requested_sigkill_is_cancellation() {
        let outcome = StressOutcome::classify(ExitStatus::from_raw(9), true);
        assert_eq!(outcome, StressOutcome::Cancelled);
    }

    #[test]
    fn unrequested_sigkill_is_crash() {
        let outcome = StressOutcome::classify(ExitStatus::from_raw(9), false);
        assert_eq!(outcome, StressOutcome::Crashed { code: None, signal: Some(9) });
        assert_eq!(outcome.to_string(), "killed by SIGKILL");
    }

    #[test]
    fn nonzero_exit_is_crash() {
        let outcome = StressOutcome::classify(ExitStatus::from_raw(3 << 8), true);
        assert_eq!(outcome, StressOutcome::Crashed { code: Some(3), signal: None });
        assert_eq!(outcome.to_string(), "exited with code 3");
    }

    #[test]
    fn event_serializes_outcome_kind() {
        let event = StressEvent {
            target: "docker://abc".into(),
            pid: 7,
            outcome: StressOutcome::Cancelled,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""kind":"cancelled""#));
    }
}
