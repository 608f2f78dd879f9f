//! Metric Registry - Process-scoped Prometheus Instruments
//!
//! Holds every metric family a service defines, keyed by name, on top of
//! a private `prometheus::Registry`. Built once at startup and injected
//! wherever metrics are recorded; tests build isolated instances.
//!
//! Registration is idempotent for identical shapes and fails fast for
//! conflicting ones. Series are created lazily on first resolve, start at
//! zero and are never removed.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, GaugeVec, IntCounter, IntCounterVec, Opts, Registry};
use tracing::debug;

use crate::domain::metric::{LabelSet, MetricDescriptor, MetricKind};
use crate::error::{InstrumentationError, Result};

/// Underlying Prometheus vector for one family.
#[derive(Clone)]
enum Family {
    Counter(IntCounterVec),
    Gauge(GaugeVec),
}

impl Family {
    fn build(descriptor: &MetricDescriptor) -> Result<Self> {
        let opts = Opts::new(descriptor.name.as_str(), descriptor.help.as_str());
        let labels: Vec<&str> = descriptor.label_names.iter().map(String::as_str).collect();
        Ok(match descriptor.kind {
            MetricKind::Counter => Self::Counter(IntCounterVec::new(opts, &labels)?),
            MetricKind::Gauge => Self::Gauge(GaugeVec::new(opts, &labels)?),
        })
    }

    fn collector(&self) -> Box<dyn Collector> {
        match self {
            Self::Counter(v) => Box::new(v.clone()),
            Self::Gauge(v) => Box::new(v.clone()),
        }
    }
}

/// A registered family: its definition plus the live vector.
struct Registered {
    descriptor: MetricDescriptor,
    family: Family,
}

impl Registered {
    /// Map a label set onto the declared label order.
    fn ordered_values<'a>(&self, labels: &'a LabelSet) -> Result<Vec<&'a str>> {
        let name = &self.descriptor.name;
        for supplied in labels.names() {
            if !self.descriptor.label_names.iter().any(|l| l == supplied) {
                return Err(InstrumentationError::UnexpectedLabel {
                    name: name.clone(),
                    label: supplied.to_string(),
                });
            }
        }
        self.descriptor
            .label_names
            .iter()
            .map(|label| {
                labels.get(label).ok_or_else(|| InstrumentationError::MissingLabel {
                    name: name.clone(),
                    label: label.clone(),
                })
            })
            .collect()
    }

    fn kind_mismatch(&self, expected: MetricKind) -> InstrumentationError {
        InstrumentationError::KindMismatch {
            name: self.descriptor.name.clone(),
            expected,
            actual: self.descriptor.kind,
        }
    }
}

/// Process-wide collection of named, labeled counters and gauges.
pub struct MetricRegistry {
    /// Prometheus registry gathered by the exposition endpoint.
    registry: Registry,
    /// Definitions by metric name.
    families: DashMap<String, Arc<Registered>>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: DashMap::new(),
        }
    }

    /// Register a metric family.
    ///
    /// Re-registering the same name with the same kind and label names
    /// returns the existing handle. Any other reuse of the name is a
    /// configuration error.
    pub fn register(&self, descriptor: MetricDescriptor) -> Result<MetricHandle> {
        match self.families.entry(descriptor.name.clone()) {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                if existing.descriptor.is_compatible(&descriptor) {
                    Ok(MetricHandle {
                        inner: Arc::clone(existing),
                    })
                } else {
                    Err(InstrumentationError::Conflict {
                        name: descriptor.name,
                        existing_kind: existing.descriptor.kind,
                        existing_labels: existing.descriptor.label_names.clone(),
                        requested_kind: descriptor.kind,
                        requested_labels: descriptor.label_names,
                    })
                }
            }
            Entry::Vacant(entry) => {
                let family = Family::build(&descriptor)?;
                self.registry.register(family.collector())?;
                debug!(
                    metric = %descriptor.name,
                    kind = %descriptor.kind,
                    labels = ?descriptor.label_names,
                    "Metric registered"
                );
                let registered = Arc::new(Registered { descriptor, family });
                entry.insert(Arc::clone(&registered));
                Ok(MetricHandle { inner: registered })
            }
        }
    }

    /// Register (or fetch) a counter family.
    pub fn counter(&self, name: &str, help: &str, label_names: &[&str]) -> Result<CounterFamily> {
        self.register(MetricDescriptor::counter(name, help, label_names))?
            .into_counter()
    }

    /// Register (or fetch) a gauge family.
    pub fn gauge(&self, name: &str, help: &str, label_names: &[&str]) -> Result<GaugeFamily> {
        self.register(MetricDescriptor::gauge(name, help, label_names))?
            .into_gauge()
    }

    /// Resolve one series of a registered metric, creating it on first use.
    pub fn resolve(&self, name: &str, labels: &LabelSet) -> Result<SeriesHandle> {
        self.handle(name)?.resolve(labels)
    }

    /// Handle of an already registered metric.
    pub fn handle(&self, name: &str) -> Result<MetricHandle> {
        self.families
            .get(name)
            .map(|r| MetricHandle {
                inner: Arc::clone(r.value()),
            })
            .ok_or_else(|| InstrumentationError::UnknownMetric(name.to_string()))
    }

    /// Current value of a series, without creating it.
    ///
    /// Returns `None` when the metric is unknown or the label combination
    /// was never observed. Label bindings must match exactly.
    pub fn sample(&self, name: &str, labels: &LabelSet) -> Option<f64> {
        let kind = self.families.get(name)?.descriptor.kind;
        let families = self.registry.gather();
        let family = families.iter().find(|f| f.get_name() == name)?;
        family
            .get_metric()
            .iter()
            .find(|m| {
                let pairs = m.get_label();
                pairs.len() == labels.len()
                    && pairs
                        .iter()
                        .all(|p| labels.get(p.get_name()) == Some(p.get_value()))
            })
            .map(|m| match kind {
                MetricKind::Counter => m.get_counter().get_value(),
                MetricKind::Gauge => m.get_gauge().get_value(),
            })
    }

    /// Snapshot of every family with at least one series.
    ///
    /// Families come back sorted by name and series by label values, so
    /// repeated gathers over unchanged state are identical.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Number of registered metric names.
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

/// Handle to one registered family of either kind.
#[derive(Clone)]
pub struct MetricHandle {
    inner: Arc<Registered>,
}

impl MetricHandle {
    /// Resolve one series, creating it zero-initialised on first use.
    pub fn resolve(&self, labels: &LabelSet) -> Result<SeriesHandle> {
        let values = self.inner.ordered_values(labels)?;
        Ok(match &self.inner.family {
            Family::Counter(v) => SeriesHandle::Counter(v.get_metric_with_label_values(&values)?),
            Family::Gauge(v) => SeriesHandle::Gauge(v.get_metric_with_label_values(&values)?),
        })
    }

    /// Typed counter view; fails for gauges.
    pub fn into_counter(self) -> Result<CounterFamily> {
        match self.inner.descriptor.kind {
            MetricKind::Counter => Ok(CounterFamily { inner: self.inner }),
            MetricKind::Gauge => Err(self.inner.kind_mismatch(MetricKind::Counter)),
        }
    }

    /// Typed gauge view; fails for counters.
    pub fn into_gauge(self) -> Result<GaugeFamily> {
        match self.inner.descriptor.kind {
            MetricKind::Gauge => Ok(GaugeFamily { inner: self.inner }),
            MetricKind::Counter => Err(self.inner.kind_mismatch(MetricKind::Gauge)),
        }
    }
}

/// Mutable handle to one time series.
#[derive(Clone)]
pub enum SeriesHandle {
    /// Integer counter series.
    Counter(IntCounter),
    /// Floating point gauge series.
    Gauge(Gauge),
}

impl SeriesHandle {
    /// Kind of the owning family.
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Counter(_) => MetricKind::Counter,
            Self::Gauge(_) => MetricKind::Gauge,
        }
    }

    /// Current value.
    #[allow(clippy::cast_precision_loss)] // the text encoding carries counters as f64 as well
    pub fn value(&self) -> f64 {
        match self {
            Self::Counter(c) => c.get() as f64,
            Self::Gauge(g) => g.get(),
        }
    }
}

/// Typed counter family.
#[derive(Clone)]
pub struct CounterFamily {
    inner: Arc<Registered>,
}

impl CounterFamily {
    /// Metric name.
    pub fn name(&self) -> &str {
        &self.inner.descriptor.name
    }

    /// Resolve one counter series.
    pub fn series(&self, labels: &LabelSet) -> Result<IntCounter> {
        let values = self.inner.ordered_values(labels)?;
        match &self.inner.family {
            Family::Counter(v) => Ok(v.get_metric_with_label_values(&values)?),
            Family::Gauge(_) => Err(self.inner.kind_mismatch(MetricKind::Counter)),
        }
    }

    /// Increment one series by one.
    pub fn inc(&self, labels: &LabelSet) -> Result<()> {
        self.series(labels)?.inc();
        Ok(())
    }

    /// Increment one series by `n`.
    pub fn inc_by(&self, labels: &LabelSet, n: u64) -> Result<()> {
        self.series(labels)?.inc_by(n);
        Ok(())
    }
}

/// Typed gauge family.
#[derive(Clone)]
pub struct GaugeFamily {
    inner: Arc<Registered>,
}

impl GaugeFamily {
    /// Metric name.
    pub fn name(&self) -> &str {
        &self.inner.descriptor.name
    }

    /// Resolve one gauge series.
    pub fn series(&self, labels: &LabelSet) -> Result<Gauge> {
        let values = self.inner.ordered_values(labels)?;
        match &self.inner.family {
            Family::Gauge(v) => Ok(v.get_metric_with_label_values(&values)?),
            Family::Counter(_) => Err(self.inner.kind_mismatch(MetricKind::Gauge)),
        }
    }

    /// Overwrite one series.
    pub fn set(&self, labels: &LabelSet, value: f64) -> Result<()> {
        self.series(labels)?.set(value);
        Ok(())
    }

    /// Increment one series by one.
    pub fn inc(&self, labels: &LabelSet) -> Result<()> {
        self.series(labels)?.inc();
        Ok(())
    }

    /// Decrement one series by one.
    pub fn dec(&self, labels: &LabelSet) -> Result<()> {
        self.series(labels)?.dec();
        Ok(())
    }
}
