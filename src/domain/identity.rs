//! Process identity - the static `service` and `node` labels.
//!
//! Resolved once at startup and treated as immutable afterwards.

use std::fmt;

/// Primary environment variable naming the node.
pub const NODE_NAME_VAR: &str = "NODE_NAME";

/// Fallback host identifier variable.
pub const HOSTNAME_VAR: &str = "HOSTNAME";

/// Node label used when neither variable is set.
pub const UNKNOWN_NODE: &str = "unknown";

/// Static labels shared by every series a process emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    /// Service name, e.g. `data_collector`.
    pub service: String,
    /// Node name, e.g. the Kubernetes node the pod runs on.
    pub node: String,
}

impl ProcessIdentity {
    /// Build an identity from explicit values.
    pub fn new(service: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            node: node.into(),
        }
    }

    /// Resolve the node from the process environment.
    ///
    /// `NODE_NAME`, then `HOSTNAME`, then `"unknown"`.
    pub fn from_env(service: impl Into<String>) -> Self {
        Self::resolve(service, |var| std::env::var(var).ok())
    }

    /// Resolve the node through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn resolve<F>(service: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let node = present(NODE_NAME_VAR)
            .or_else(|| present(HOSTNAME_VAR))
            .unwrap_or_else(|| UNKNOWN_NODE.to_string());
        Self::new(service, node)
    }
}

impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.service, self.node)
    }
}
