//! Hierarchical metric names.
//!
//! Every metric lives under `/ibm/sysfs/iocore`. Per-core metrics carry one
//! dynamic element (`*` until expanded) naming the I/O core, followed by the
//! metric name. Derived values are keyed by the part after the prefix, e.g.
//! `iocore0/cpu_utilization` or `nr_iocores`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CollectError;

/// Vendor segment.
pub const NS_VENDOR: &str = "ibm";
/// Class segment.
pub const NS_CLASS: &str = "sysfs";
/// Type segment.
pub const NS_TYPE: &str = "iocore";

/// Namespace prefix shared by all metrics.
pub const PREFIX: [&str; 3] = [NS_VENDOR, NS_CLASS, NS_TYPE];

/// Placeholder value of an unexpanded dynamic element.
pub const WILDCARD: &str = "*";

/// Name of the dynamic element identifying an I/O core.
pub const DYNAMIC_IOCORE: &str = "iocore";

/// Number of active I/O cores (static metric).
pub const NR_IOCORES: &str = "nr_iocores";
/// Effective utilization in percent (per-core metric).
pub const CPU_UTILIZATION: &str = "cpu_utilization";
/// Resource key under which the aggregate utilization is published.
pub const AGGREGATE_CORE: &str = "cpu";

/// Separator between segments of a derived-value key.
pub const KEY_SEPARATOR: &str = "/";

/// One namespace segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceElement {
    pub value: String,
    /// Empty for static elements.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl NamespaceElement {
    pub fn fixed(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: String::new(),
            description: String::new(),
        }
    }

    pub fn dynamic(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: WILDCARD.to_string(),
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Ordered list of namespace elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(Vec<NamespaceElement>);

impl Namespace {
    /// Build a namespace of static elements.
    pub fn new<S: AsRef<str>>(segments: &[S]) -> Self {
        Self(
            segments
                .iter()
                .map(|s| NamespaceElement::fixed(s.as_ref()))
                .collect(),
        )
    }

    /// The shared `/ibm/sysfs/iocore` prefix.
    pub fn prefix() -> Self {
        Self::new(&PREFIX)
    }

    pub fn add_static_element(mut self, value: &str) -> Self {
        self.0.push(NamespaceElement::fixed(value));
        self
    }

    pub fn add_dynamic_element(mut self, name: &str, description: &str) -> Self {
        self.0.push(NamespaceElement::dynamic(name, description));
        self
    }

    pub fn elements(&self) -> &[NamespaceElement] {
        &self.0
    }

    pub fn elements_mut(&mut self) -> &mut [NamespaceElement] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Segment values in order.
    pub fn strings(&self) -> Vec<String> {
        self.0.iter().map(|e| e.value.clone()).collect()
    }

    /// Value of the last segment.
    pub fn last_value(&self) -> Option<&str> {
        self.0.last().map(|e| e.value.as_str())
    }

    /// True when the namespace starts with `/ibm/sysfs/iocore`.
    pub fn has_prefix(&self) -> bool {
        self.0.len() >= PREFIX.len()
            && self.0.iter().zip(PREFIX).all(|(e, p)| e.value == p)
    }

    /// True when the segment before the metric name is an unexpanded wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.0.len() >= 2 && self.0[self.0.len() - 2].value == WILDCARD
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.0 {
            write!(f, "/{}", e.value)?;
        }
        Ok(())
    }
}

impl FromStr for Namespace {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(CollectError::InvalidNamespace {
                namespace: s.to_string(),
                reason: "empty namespace".to_string(),
            });
        }
        let mut elements = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(CollectError::InvalidNamespace {
                    namespace: s.to_string(),
                    reason: "empty segment".to_string(),
                });
            }
            if segment == WILDCARD {
                elements.push(NamespaceElement::dynamic(DYNAMIC_IOCORE, ""));
            } else {
                elements.push(NamespaceElement::fixed(segment));
            }
        }
        Ok(Self(elements))
    }
}

/// Prefix plus the segments of a derived-value key.
pub fn create_namespace(key: &str) -> Vec<String> {
    PREFIX
        .iter()
        .map(|s| s.to_string())
        .chain(key.split(KEY_SEPARATOR).map(str::to_string))
        .collect()
}

/// Inverse of [`create_namespace`]: strip the prefix and join the rest.
///
/// `None` when `ns` does not start with the prefix.
pub fn parse_namespace(ns: &[String]) -> Option<String> {
    if ns.len() < PREFIX.len() || !ns.iter().zip(PREFIX).all(|(s, p)| s == p) {
        return None;
    }
    Some(ns[PREFIX.len()..].join(KEY_SEPARATOR))
}

/// Derived-value key for one metric of one core.
pub fn core_key(core: &str, metric: &str) -> String {
    format!("{core}{KEY_SEPARATOR}{metric}")
}

/// Last `/`-separated segment of a derived-value key.
pub fn key_suffix(key: &str) -> &str {
    key.rsplit(KEY_SEPARATOR).next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_from_str() {
        let ns = Namespace::prefix()
            .add_dynamic_element(DYNAMIC_IOCORE, "core")
            .add_static_element(CPU_UTILIZATION);
        assert_eq!(ns.to_string(), "/ibm/sysfs/iocore/*/cpu_utilization");

        let parsed: Namespace = "/ibm/sysfs/iocore/*/cpu_utilization".parse().unwrap();
        assert!(parsed.is_wildcard());
        assert!(parsed.elements()[3].is_dynamic());
        assert_eq!(parsed.strings(), ns.strings());
    }

    #[test]
    fn from_str_rejects_empty_segments() {
        assert!("".parse::<Namespace>().is_err());
        let err = "/ibm//iocore".parse::<Namespace>().unwrap_err();
        assert!(matches!(
            err,
            CollectError::InvalidNamespace { ref namespace, .. } if namespace == "/ibm//iocore"
        ));
    }

    #[test]
    fn static_namespace_is_not_wildcard() {
        let ns = Namespace::prefix().add_static_element(NR_IOCORES);
        assert!(!ns.is_wildcard());
        assert_eq!(ns.last_value(), Some(NR_IOCORES));
    }

    #[test]
    fn create_and_parse_are_inverse() {
        let key = core_key("iocore1", CPU_UTILIZATION);
        let ns = create_namespace(&key);
        assert_eq!(ns, vec!["ibm", "sysfs", "iocore", "iocore1", "cpu_utilization"]);
        assert_eq!(parse_namespace(&ns), Some(key));
    }

    #[test]
    fn parse_rejects_foreign_prefix() {
        let ns: Vec<String> = ["foo", "bar", "baz", NR_IOCORES].map(String::from).to_vec();
        assert_eq!(parse_namespace(&ns), None);
        assert_eq!(parse_namespace(&["ibm".to_string()]), None);

        let foreign: Namespace = "/foo/bar/baz/nr_iocores".parse().unwrap();
        assert!(!foreign.has_prefix());
        assert!(Namespace::prefix().add_static_element(NR_IOCORES).has_prefix());
    }

    #[test]
    fn key_suffix_takes_last_segment() {
        assert_eq!(key_suffix("iocore0/cpu_utilization"), CPU_UTILIZATION);
        assert_eq!(key_suffix(NR_IOCORES), NR_IOCORES);
    }
}
