//! Domain primitive types used across the cgstress workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StressError;

/// Which cgroup level a stress request addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressScope {
    /// The container's own cgroup.
    #[default]
    Container,
    /// The enclosing pod cgroup, one directory above the container's.
    Pod,
}

impl fmt::Display for StressScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => write!(f, "container"),
            Self::Pod => write!(f, "pod"),
        }
    }
}

impl FromStr for StressScope {
    type Err = StressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "container" => Ok(Self::Container),
            "pod" => Ok(Self::Pod),
            other => Err(StressError::Config {
                message: format!("unknown stress scope: {other}"),
            }),
        }
    }
}

/// A request to start or cancel synthetic load against a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressRequest {
    /// Container identifier, possibly carrying a `<runtime>://` prefix.
    pub target: String,
    /// Free-form stress-ng arguments, whitespace separated.
    #[serde(default)]
    pub stressors: String,
    /// Cgroup level to attach the load to.
    #[serde(default)]
    pub scope: StressScope,
}

impl StressRequest {
    /// Creates a request for `target` with the given stressor arguments.
    #[must_use]
    pub fn new(target: impl Into<String>, stressors: impl Into<String>, scope: StressScope) -> Self {
        Self {
            target: target.into(),
            stressors: stressors.into(),
            scope,
        }
    }

    /// Creates a request carrying only the target, as used for cancellation.
    #[must_use]
    pub fn cancel(target: impl Into<String>) -> Self {
        Self::new(target, String::new(), StressScope::Container)
    }

    /// Splits the stressor string into process arguments.
    #[must_use]
    pub fn stressor_args(&self) -> Vec<String> {
        self.stressors.split_whitespace().map(str::to_owned).collect()
    }
}
