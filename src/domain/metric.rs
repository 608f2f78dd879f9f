//! Metric model - kinds, descriptors and label sets.
//!
//! Pure data: nothing here knows about Prometheus. A metric is a unique
//! name plus a fixed, ordered list of label names; a `LabelSet` supplies
//! the values for one time series at call time.

use std::collections::BTreeMap;
use std::fmt;

// ────────────────────────────────────────────
// Standard label dimensions
// ────────────────────────────────────────────

/// Static per-process service name.
pub const LABEL_SERVICE: &str = "service";
/// Static per-process node identifier.
pub const LABEL_NODE: &str = "node";
/// HTTP verb of the request.
pub const LABEL_METHOD: &str = "method";
/// Logical route identifier (raw path when no route matched).
pub const LABEL_ENDPOINT: &str = "endpoint";
/// Final outcome code rendered as a string.
pub const LABEL_STATUS: &str = "status";

/// The two instrument kinds the registry supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Monotonically non-decreasing per series.
    Counter,
    /// Arbitrary value per series.
    Gauge,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => write!(f, "counter"),
            Self::Gauge => write!(f, "gauge"),
        }
    }
}

/// Definition of one metric family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    /// Globally unique metric name.
    pub name: String,
    /// Help text shown in the exposition output.
    pub help: String,
    /// Counter or gauge.
    pub kind: MetricKind,
    /// Declared label names, in declaration order.
    pub label_names: Vec<String>,
}

impl MetricDescriptor {
    /// Describe a counter family.
    pub fn counter(name: &str, help: &str, label_names: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Counter, label_names)
    }

    /// Describe a gauge family.
    pub fn gauge(name: &str, help: &str, label_names: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Gauge, label_names)
    }

    /// Describe a family of any kind.
    pub fn new(name: &str, help: &str, kind: MetricKind, label_names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind,
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Whether `other` describes the same family shape (kind + label names).
    ///
    /// Help text is not part of the identity.
    pub fn is_compatible(&self, other: &MetricDescriptor) -> bool {
        self.kind == other.kind && self.label_names == other.label_names
    }
}

/// Label name → label value bindings for one observation.
///
/// Built ad hoc per call. Binding order is irrelevant; the registry maps
/// values onto the declared label order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    values: BTreeMap<String, String>,
}

impl LabelSet {
    /// Empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding of one label.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Bind (or rebind) one label.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Iterate over bound label names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of bound labels.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no label is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for (k, v) in iter {
            set.insert(k.as_ref(), v);
        }
        set
    }
}
