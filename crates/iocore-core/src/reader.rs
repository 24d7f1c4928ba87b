//! Snapshot reader for the vhost sysfs pseudo-files.
//!
//! `iocores_utilization` has one line per I/O core:
//! ```text
//! iocore0 1234 56789
//! iocore1 4321 98765
//! ```
//! (`<name> <total_work_cycles> <total_cycles>`), and `nr_iocores` holds the
//! number of active cores as its first token.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{CollectError, Result};
use crate::snapshot::{CoreCounters, CounterSnapshot};

/// Per-core cycle counters file.
pub const COUNTERS_FILE: &str = "iocores_utilization";
/// Active core count file.
pub const CORE_COUNT_FILE: &str = "nr_iocores";

/// Where raw counters come from.
pub trait CounterSource {
    /// Read every core's counters.
    fn read_counters(&self) -> Result<BTreeMap<String, CoreCounters>>;

    /// Read the number of active cores.
    fn read_core_count(&self) -> Result<u64>;

    /// Read counters and stamp them with the capture time.
    fn read_snapshot(&self) -> Result<CounterSnapshot> {
        let cores = self.read_counters()?;
        Ok(CounterSnapshot {
            cores,
            collected_unix_ms: unix_ms_now(),
        })
    }
}

/// Reads the two pseudo-files from a sysfs directory.
#[derive(Debug, Clone)]
pub struct SysfsReader {
    dir: PathBuf,
}

impl SysfsReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_file(&self, name: &str) -> Result<(PathBuf, String)> {
        let path = self.dir.join(name);
        let raw = std::fs::read_to_string(&path).map_err(|e| CollectError::io(&path, e))?;
        Ok((path, raw))
    }
}

impl CounterSource for SysfsReader {
    fn read_counters(&self) -> Result<BTreeMap<String, CoreCounters>> {
        let (_, raw) = self.read_file(COUNTERS_FILE)?;
        Ok(parse_counters(&raw))
    }

    fn read_core_count(&self) -> Result<u64> {
        let (path, raw) = self.read_file(CORE_COUNT_FILE)?;
        parse_core_count(&raw).map_err(|reason| CollectError::CoreCount { path, reason })
    }
}

pub(crate) fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Parse the counters file. Never fails: a missing or non-numeric counter
/// field reads as zero and blank lines are skipped.
pub fn parse_counters(raw: &str) -> BTreeMap<String, CoreCounters> {
    let mut cores = BTreeMap::new();
    for line in raw.lines() {
        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else {
            continue;
        };
        let mut field = |label: &str| -> u64 {
            match fields.next().map(str::parse::<u64>) {
                Some(Ok(v)) => v,
                Some(Err(e)) => {
                    log::debug!("{name}: unparsable {label} field ({e}), using 0");
                    0
                }
                None => {
                    log::debug!("{name}: missing {label} field, using 0");
                    0
                }
            }
        };
        let work_cycles = field("total_work_cycles");
        let total_cycles = field("total_cycles");
        cores.insert(
            name.to_string(),
            CoreCounters {
                work_cycles,
                total_cycles,
            },
        );
    }
    cores
}

/// Parse the first whitespace token of the core count file.
pub fn parse_core_count(raw: &str) -> std::result::Result<u64, String> {
    let token = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| "file is empty".to_string())?;
    token
        .parse::<u64>()
        .map_err(|e| format!("`{token}` is not a count: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_lines() {
        let cores = parse_counters("iocore0 100 1000\niocore1 7 70\n");
        assert_eq!(cores.len(), 2);
        assert_eq!(cores["iocore0"].work_cycles, 100);
        assert_eq!(cores["iocore0"].total_cycles, 1000);
        assert_eq!(cores["iocore1"].work_cycles, 7);
    }

    #[test]
    fn malformed_fields_read_as_zero() {
        let cores = parse_counters("iocore0 abc 1000\niocore1 5\n\n   \niocore2 1 2 3 4\n");
        assert_eq!(cores.len(), 3);
        assert_eq!(cores["iocore0"].work_cycles, 0);
        assert_eq!(cores["iocore0"].total_cycles, 1000);
        assert_eq!(cores["iocore1"].work_cycles, 5);
        assert_eq!(cores["iocore1"].total_cycles, 0);
        assert_eq!(cores["iocore2"].total_cycles, 2);
    }

    #[test]
    fn negative_counter_reads_as_zero() {
        let cores = parse_counters("iocore0 -5 10");
        assert_eq!(cores["iocore0"].work_cycles, 0);
    }

    #[test]
    fn accepts_u64_max() {
        let line = format!("iocore0 {} {}", u64::MAX, u64::MAX);
        let cores = parse_counters(&line);
        assert_eq!(cores["iocore0"].work_cycles, u64::MAX);
    }

    #[test]
    fn core_count_uses_first_token() {
        assert_eq!(parse_core_count("2\n"), Ok(2));
        assert_eq!(parse_core_count("  4 extra"), Ok(4));
    }

    #[test]
    fn core_count_rejects_garbage() {
        assert!(parse_core_count("").is_err());
        assert!(parse_core_count("two").is_err());
    }

    #[test]
    fn missing_directory_is_io_error() {
        let reader = SysfsReader::new("/nonexistent/iocore/test/dir");
        let err = reader.read_counters().unwrap_err();
        assert!(matches!(err, CollectError::Io { .. }));
        assert!(err.to_string().contains(COUNTERS_FILE));
    }
}
