//! Render derived values against the requested metric namespaces.

use serde::{Deserialize, Serialize};

use crate::derivative::DerivedValues;
use crate::namespace::{
    CPU_UTILIZATION, Namespace, core_key, create_namespace, key_suffix, parse_namespace,
};
use crate::snapshot::CounterSnapshot;

/// One collected metric instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub namespace: Namespace,
    pub value: f64,
    /// Capture time of the counters the value was derived from.
    pub timestamp_unix_ms: u64,
}

impl MetricSample {
    /// `/`-joined namespace, e.g. `/ibm/sysfs/iocore/iocore0/cpu_utilization`.
    pub fn path(&self) -> String {
        self.namespace.to_string()
    }
}

/// Expand and resolve `requested` against `derived`.
///
/// Static namespaces are looked up directly; unknown ones, and anything
/// outside `/ibm/sysfs/iocore`, are logged and omitted. A wildcard namespace
/// yields one sample per derived key with the same metric name. When nothing
/// matches a per-core metric (always the case on the first tick) every core
/// of `current` is advertised with value 0.
pub fn project(
    requested: &[Namespace],
    derived: &DerivedValues,
    current: &CounterSnapshot,
) -> Vec<MetricSample> {
    let timestamp = current.collected_unix_ms;
    let mut samples = Vec::new();

    for ns in requested {
        if ns.is_wildcard() {
            expand_wildcard(ns, derived, current, timestamp, &mut samples);
            continue;
        }

        match parse_namespace(&ns.strings()).and_then(|key| derived.get(&key)) {
            Some(&value) => samples.push(MetricSample {
                namespace: ns.clone(),
                value,
                timestamp_unix_ms: timestamp,
            }),
            None => log::warn!("Can not find static metric value for {ns}"),
        }
    }

    samples
}

fn expand_wildcard(
    requested: &Namespace,
    derived: &DerivedValues,
    current: &CounterSnapshot,
    timestamp: u64,
    out: &mut Vec<MetricSample>,
) {
    let Some(metric) = requested.last_value() else {
        return;
    };
    if !requested.has_prefix() {
        log::warn!("Can not find dynamic metric value for {requested}");
        return;
    }

    let before = out.len();
    for (key, &value) in derived {
        if key_suffix(key) == metric {
            out.push(MetricSample {
                namespace: concrete_namespace(requested, key),
                value,
                timestamp_unix_ms: timestamp,
            });
        }
    }
    if out.len() > before {
        return;
    }
    if metric != CPU_UTILIZATION {
        log::warn!("Can not find dynamic metric value for {requested}");
        return;
    }

    for core in current.core_names() {
        let key = core_key(core, metric);
        out.push(MetricSample {
            namespace: concrete_namespace(requested, &key),
            value: 0.0,
            timestamp_unix_ms: timestamp,
        });
    }
}

/// Namespace for a derived key, keeping the requested dynamic element's
/// name on the segment that replaced the wildcard.
fn concrete_namespace(requested: &Namespace, key: &str) -> Namespace {
    let mut ns = Namespace::new(create_namespace(key).as_slice());
    let wildcard_at = requested.len() - 2;
    let expanded_at = ns.len().checked_sub(2);
    if let (Some(idx), Some(source)) = (expanded_at, requested.elements().get(wildcard_at)) {
        let element = &mut ns.elements_mut()[idx];
        element.name = source.name.clone();
        element.description = source.description.clone();
    }
    ns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{DYNAMIC_IOCORE, NR_IOCORES};
    use crate::snapshot::CoreCounters;

    fn utilization_ns() -> Namespace {
        Namespace::prefix()
            .add_dynamic_element(DYNAMIC_IOCORE, "I/O core")
            .add_static_element(CPU_UTILIZATION)
    }

    fn current(names: &[&str]) -> CounterSnapshot {
        CounterSnapshot {
            cores: names
                .iter()
                .map(|n| (n.to_string(), CoreCounters::default()))
                .collect(),
            collected_unix_ms: 42,
        }
    }

    #[test]
    fn static_lookup_hits() {
        let mut derived = DerivedValues::new();
        derived.insert(NR_IOCORES.to_string(), 2.0);
        let ns = Namespace::prefix().add_static_element(NR_IOCORES);

        let out = project(&[ns.clone()], &derived, &current(&[]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].namespace, ns);
        assert_eq!(out[0].value, 2.0);
        assert_eq!(out[0].timestamp_unix_ms, 42);
    }

    #[test]
    fn static_miss_is_omitted() {
        let ns = Namespace::prefix().add_static_element("no_such_metric");
        let out = project(&[ns], &DerivedValues::new(), &current(&["iocore0"]));
        assert!(out.is_empty());
    }

    #[test]
    fn wildcard_expands_matching_keys() {
        let mut derived = DerivedValues::new();
        derived.insert("iocore0/cpu_utilization".to_string(), 40.0);
        derived.insert("iocore1/cpu_utilization".to_string(), 10.5);
        derived.insert("cpu/cpu_utilization".to_string(), 50.5);
        derived.insert(NR_IOCORES.to_string(), 2.0);

        let out = project(&[utilization_ns()], &derived, &current(&["iocore0", "iocore1"]));
        let paths: Vec<String> = out.iter().map(MetricSample::path).collect();
        assert_eq!(
            paths,
            vec![
                "/ibm/sysfs/iocore/cpu/cpu_utilization",
                "/ibm/sysfs/iocore/iocore0/cpu_utilization",
                "/ibm/sysfs/iocore/iocore1/cpu_utilization",
            ]
        );
        assert_eq!(out[1].value, 40.0);
        assert!(out.iter().all(|s| s.namespace.elements()[3].name == DYNAMIC_IOCORE));
    }

    #[test]
    fn wildcard_falls_back_to_zero_per_core() {
        let out = project(
            &[utilization_ns()],
            &DerivedValues::new(),
            &current(&["iocore0", "iocore1"]),
        );
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.value == 0.0 && s.timestamp_unix_ms == 42));
        assert_eq!(out[0].path(), "/ibm/sysfs/iocore/iocore0/cpu_utilization");
        assert_eq!(out[1].path(), "/ibm/sysfs/iocore/iocore1/cpu_utilization");
    }

    #[test]
    fn wildcard_for_unknown_metric_name_is_omitted() {
        let ns = Namespace::prefix()
            .add_dynamic_element(DYNAMIC_IOCORE, "")
            .add_static_element("queue_depth");
        let mut derived = DerivedValues::new();
        derived.insert("iocore0/cpu_utilization".to_string(), 40.0);

        assert!(project(&[ns.clone()], &DerivedValues::new(), &current(&["iocore0"])).is_empty());
        assert!(project(&[ns], &derived, &current(&["iocore0"])).is_empty());
    }

    #[test]
    fn foreign_prefix_is_omitted() {
        let mut derived = DerivedValues::new();
        derived.insert(NR_IOCORES.to_string(), 2.0);
        derived.insert("iocore0/cpu_utilization".to_string(), 40.0);

        let requested: Vec<Namespace> = ["/foo/bar/baz/nr_iocores", "/foo/bar/baz/*/cpu_utilization"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert!(project(&requested, &derived, &current(&["iocore0"])).is_empty());
    }
}
