//! # iocore-core
//!
//! Per-core utilization of vhost I/O cores, derived from the cycle counters
//! the kernel exposes under `/sys/class/vhost`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use iocore_core::{ConfigValues, IoCoreCollector};
//!
//! let mut collector = IoCoreCollector::new();
//! let requested = IoCoreCollector::catalog_namespaces();
//!
//! // The first tick only advertises the cores (all at 0%).
//! collector.collect_with_config(&ConfigValues::new(), &requested).unwrap();
//!
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! for sample in collector.collect_with_config(&ConfigValues::new(), &requested).unwrap() {
//!     println!("{} = {}", sample.path(), sample.value);
//! }
//! ```
//!
//! ## Architecture
//!
//! Reader → SnapshotStore (current/previous) → derivative engine → projector
//!
//! Each tick reads `iocores_utilization` (`<core> <work_cycles> <total_cycles>`
//! per line) and `nr_iocores`, rotates the previous snapshot, differences the
//! wrapping `u64` counters of every core seen on both ticks, and renders the
//! results against the requested namespaces. Wildcard namespaces such as
//! `/ibm/sysfs/iocore/*/cpu_utilization` expand to one metric per core.

pub mod collector;
pub mod config;
pub mod derivative;
pub mod error;
pub mod namespace;
pub mod projector;
pub mod reader;
pub mod snapshot;

pub use collector::{IoCoreCollector, MetricType, PluginMeta, PluginType};
pub use config::{
    CollectorConfig, ConfigPolicy, ConfigValues, DEFAULT_VHOST_PATH, StringRule, VHOST_PATH_KEY,
    load_config_file,
};
pub use derivative::{
    DerivedValues, calc_derivatives, core_utilization, counter_delta, truncate_tenths,
    utilization,
};
pub use error::{CollectError, Result};
pub use namespace::{Namespace, NamespaceElement};
pub use projector::{MetricSample, project};
pub use reader::{CounterSource, SysfsReader, parse_core_count, parse_counters};
pub use snapshot::{CoreCounters, CounterSnapshot, SnapshotStore};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
