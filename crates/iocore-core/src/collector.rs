//! The collector: one state object driven through refresh, rotate, compute
//! and project on every tick.
//!
//! The collector is not internally synchronized. Hosts that share it across
//! threads must hold one lock for a whole [`IoCoreCollector::collect`] call.

use serde::{Deserialize, Serialize};

use crate::config::{CollectorConfig, ConfigPolicy, ConfigValues};
use crate::derivative::{DerivedValues, calc_derivatives};
use crate::error::Result;
use crate::namespace::{CPU_UTILIZATION, DYNAMIC_IOCORE, NR_IOCORES, Namespace};
use crate::projector::{MetricSample, project};
use crate::reader::{CounterSource, SysfsReader};
use crate::snapshot::{CounterSnapshot, SnapshotStore};

/// Plugin name.
pub const PLUGIN_NAME: &str = "iocore";
/// Plugin version.
pub const PLUGIN_VERSION: u32 = 3;

/// Kind of plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Collector,
}

/// Identity advertised to a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMeta {
    pub name: String,
    pub version: u32,
    pub plugin_type: PluginType,
    /// Maximum concurrent collections a host may run against one instance.
    pub concurrency_count: usize,
}

/// A metric the collector can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricType {
    pub namespace: Namespace,
    pub description: String,
    pub unit: String,
}

/// Collector state: snapshots plus the derived table of the last tick.
#[derive(Debug, Default)]
pub struct IoCoreCollector {
    store: SnapshotStore,
    output: DerivedValues,
}

impl IoCoreCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meta() -> PluginMeta {
        PluginMeta {
            name: PLUGIN_NAME.to_string(),
            version: PLUGIN_VERSION,
            plugin_type: PluginType::Collector,
            concurrency_count: 1,
        }
    }

    pub fn config_policy() -> ConfigPolicy {
        ConfigPolicy::default()
    }

    /// The metric catalog.
    pub fn metric_types() -> Vec<MetricType> {
        vec![
            MetricType {
                namespace: Namespace::prefix().add_static_element(NR_IOCORES),
                description: "number of active I/O cores".to_string(),
                unit: String::new(),
            },
            MetricType {
                namespace: Namespace::prefix()
                    .add_dynamic_element(
                        DYNAMIC_IOCORE,
                        "I/O core effective utilization (percentage)",
                    )
                    .add_static_element(CPU_UTILIZATION),
                description: format!("dynamic iocore metric: {CPU_UTILIZATION}"),
                unit: "percent".to_string(),
            },
        ]
    }

    /// Namespaces of the whole catalog.
    pub fn catalog_namespaces() -> Vec<Namespace> {
        Self::metric_types()
            .into_iter()
            .map(|m| m.namespace)
            .collect()
    }

    /// Run one collection tick.
    ///
    /// Both pseudo-files are read before any state changes, so a read error
    /// leaves the collector exactly as it was.
    pub fn collect(
        &mut self,
        source: &dyn CounterSource,
        requested: &[Namespace],
    ) -> Result<Vec<MetricSample>> {
        let fresh = source.read_snapshot()?;
        let nr_iocores = source.read_core_count()?;

        let has_previous = self.store.advance(fresh);
        self.output.clear();
        if has_previous {
            calc_derivatives(self.store.current(), self.store.previous(), &mut self.output);
        } else {
            log::debug!("first sample, no derivatives this tick");
        }
        self.output.insert(NR_IOCORES.to_string(), nr_iocores as f64);

        Ok(project(requested, &self.output, self.store.current()))
    }

    /// Resolve `values` against the policy and collect from sysfs.
    pub fn collect_with_config(
        &mut self,
        values: &ConfigValues,
        requested: &[Namespace],
    ) -> Result<Vec<MetricSample>> {
        let config = Self::config_policy().resolve(values)?;
        self.collect_from(&config, requested)
    }

    /// Collect from the directory named by an already resolved config.
    pub fn collect_from(
        &mut self,
        config: &CollectorConfig,
        requested: &[Namespace],
    ) -> Result<Vec<MetricSample>> {
        let reader = SysfsReader::new(&config.vhost_path);
        self.collect(&reader, requested)
    }

    pub fn current(&self) -> &CounterSnapshot {
        self.store.current()
    }

    pub fn previous(&self) -> &CounterSnapshot {
        self.store.previous()
    }

    /// Derived values from the last tick, including `nr_iocores`.
    pub fn derived(&self) -> &DerivedValues {
        &self.output
    }

    pub fn is_first_sample(&self) -> bool {
        self.store.is_first_sample()
    }
}
