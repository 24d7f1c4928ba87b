//! Config policy and its resolution.
//!
//! The collector takes one string option, `vhost_path`, naming the directory
//! that holds the pseudo-files. Hosts pass raw values as a string map; the
//! policy fills in defaults and rejects anything it does not know.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CollectError, Result};
use crate::namespace::PREFIX;

/// Key of the sysfs directory option.
pub const VHOST_PATH_KEY: &str = "vhost_path";
/// Conventional sysfs location of the vhost class.
pub const DEFAULT_VHOST_PATH: &str = "/sys/class/vhost";

/// Raw config values supplied by a host.
pub type ConfigValues = BTreeMap<String, String>;

/// One string option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringRule {
    pub key: String,
    pub required: bool,
    pub default: Option<String>,
}

/// Options accepted under a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPolicy {
    pub namespace: Vec<String>,
    pub rules: Vec<StringRule>,
}

/// Resolved collector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub vhost_path: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            vhost_path: PathBuf::from(DEFAULT_VHOST_PATH),
        }
    }
}

impl Default for ConfigPolicy {
    fn default() -> Self {
        Self {
            namespace: PREFIX.iter().map(|s| s.to_string()).collect(),
            rules: vec![StringRule {
                key: VHOST_PATH_KEY.to_string(),
                required: false,
                default: Some(DEFAULT_VHOST_PATH.to_string()),
            }],
        }
    }
}

impl ConfigPolicy {
    pub fn rule(&self, key: &str) -> Option<&StringRule> {
        self.rules.iter().find(|r| r.key == key)
    }

    /// Apply defaults to `values` and validate them.
    pub fn resolve(&self, values: &ConfigValues) -> Result<CollectorConfig> {
        if let Some(unknown) = values.keys().find(|k| self.rule(k).is_none()) {
            return Err(CollectError::InvalidConfig {
                key: unknown.clone(),
                reason: "not a recognized option".to_string(),
            });
        }

        let vhost_path = self.value_of(VHOST_PATH_KEY, values)?;
        Ok(CollectorConfig {
            vhost_path: PathBuf::from(vhost_path),
        })
    }

    fn value_of(&self, key: &str, values: &ConfigValues) -> Result<String> {
        let rule = self.rule(key).ok_or_else(|| CollectError::MissingConfig {
            key: key.to_string(),
        })?;
        let value = match (values.get(key), &rule.default) {
            (Some(v), _) => v.trim().to_string(),
            (None, Some(d)) => d.clone(),
            (None, None) => {
                return Err(CollectError::MissingConfig {
                    key: key.to_string(),
                });
            }
        };
        if value.is_empty() {
            return Err(CollectError::InvalidConfig {
                key: key.to_string(),
                reason: "value is empty".to_string(),
            });
        }
        Ok(value)
    }
}

/// Load a JSON object of string options.
pub fn load_config_file(path: &Path) -> Result<ConfigValues> {
    let raw = std::fs::read_to_string(path).map_err(|e| CollectError::io(path, e))?;
    serde_json::from_str::<ConfigValues>(&raw).map_err(|e| CollectError::InvalidConfig {
        key: path.display().to_string(),
        reason: format!("failed to parse config JSON: {e}"),
    })
}
