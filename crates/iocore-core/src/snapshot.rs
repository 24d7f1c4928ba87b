//! Current/previous counter snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw cycle counters of one I/O core.
///
/// Both are free-running `u64` registers; a key absent from the source file
/// reads as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreCounters {
    /// Cycles spent processing work.
    pub work_cycles: u64,
    /// All elapsed cycles, busy or idle.
    pub total_cycles: u64,
}

/// All cores' counters at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub cores: BTreeMap<String, CoreCounters>,
    pub collected_unix_ms: u64,
}

impl CounterSnapshot {
    pub fn core(&self, name: &str) -> Option<&CoreCounters> {
        self.cores.get(name)
    }

    pub fn core_names(&self) -> impl Iterator<Item = &str> {
        self.cores.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }
}

/// Holds the latest snapshot and the one before it.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    current: CounterSnapshot,
    previous: CounterSnapshot,
    first_sample: bool,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            current: CounterSnapshot::default(),
            previous: CounterSnapshot::default(),
            first_sample: true,
        }
    }

    /// Install `fresh` as the current snapshot.
    ///
    /// Except on the first call, the outgoing current snapshot is cloned
    /// core by core into `previous` first, so `previous` never shares storage
    /// with what the next refresh overwrites. Returns `true` when a previous
    /// snapshot is available for differencing.
    pub fn advance(&mut self, fresh: CounterSnapshot) -> bool {
        let first = self.first_sample;
        if !first {
            self.previous.collected_unix_ms = self.current.collected_unix_ms;
            self.previous.cores.clear();
            for (name, counters) in &self.current.cores {
                self.previous.cores.insert(name.clone(), *counters);
            }
        }

        self.current.cores.clear();
        self.current.cores.extend(fresh.cores);
        self.current.collected_unix_ms = fresh.collected_unix_ms;
        self.first_sample = false;
        !first
    }

    pub fn current(&self) -> &CounterSnapshot {
        &self.current
    }

    pub fn previous(&self) -> &CounterSnapshot {
        &self.previous
    }

    pub fn is_first_sample(&self) -> bool {
        self.first_sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(ts: u64, cores: &[(&str, u64, u64)]) -> CounterSnapshot {
        CounterSnapshot {
            cores: cores
                .iter()
                .map(|(n, w, t)| {
                    (
                        n.to_string(),
                        CoreCounters {
                            work_cycles: *w,
                            total_cycles: *t,
                        },
                    )
                })
                .collect(),
            collected_unix_ms: ts,
        }
    }

    #[test]
    fn first_advance_skips_previous() {
        let mut store = SnapshotStore::new();
        assert!(store.is_first_sample());
        assert!(!store.advance(snap(10, &[("iocore0", 1, 2)])));
        assert!(!store.is_first_sample());
        assert!(store.previous().is_empty());
        assert_eq!(store.current().collected_unix_ms, 10);
    }

    #[test]
    fn second_advance_rotates_current_into_previous() {
        let mut store = SnapshotStore::new();
        store.advance(snap(10, &[("iocore0", 1, 2)]));
        assert!(store.advance(snap(20, &[("iocore0", 5, 9)])));

        assert_eq!(store.previous().collected_unix_ms, 10);
        assert_eq!(store.previous().core("iocore0").unwrap().work_cycles, 1);
        assert_eq!(store.current().core("iocore0").unwrap().work_cycles, 5);
    }

    #[test]
    fn previous_is_independent_of_later_refreshes() {
        let mut store = SnapshotStore::new();
        store.advance(snap(10, &[("iocore0", 1, 2)]));
        store.advance(snap(20, &[("iocore0", 5, 9)]));
        store.advance(snap(30, &[("iocore1", 7, 7)]));

        assert!(store.current().core("iocore0").is_none());
        assert_eq!(store.previous().core("iocore0").unwrap().work_cycles, 5);
        assert_eq!(store.previous().collected_unix_ms, 20);
    }

    #[test]
    fn previous_only_holds_the_last_tick() {
        let mut store = SnapshotStore::new();
        store.advance(snap(10, &[("iocore0", 1, 2)]));
        store.advance(snap(20, &[("iocore1", 5, 9)]));
        store.advance(snap(30, &[("iocore0", 7, 7)]));

        assert!(store.previous().core("iocore0").is_none());
        assert!(store.previous().core("iocore1").is_some());
    }
}
