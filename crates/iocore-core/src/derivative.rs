//! Utilization from two counter snapshots.
//!
//! For every core present in both snapshots:
//! 1. delta of each counter, allowing for one `u64` wraparound,
//! 2. `100 * d(work) / d(total)`, zero when no cycles elapsed,
//! 3. clamped to `[0, 100]`,
//! 4. truncated (not rounded) to one decimal.
//!
//! Per-core values are then summed into `cpu/cpu_utilization`.

use std::collections::BTreeMap;

use crate::namespace::{AGGREGATE_CORE, CPU_UTILIZATION, core_key};
use crate::snapshot::{CoreCounters, CounterSnapshot};

/// Derived metric values keyed by the namespace tail (`iocore0/cpu_utilization`).
pub type DerivedValues = BTreeMap<String, f64>;

/// Counter increase from `prev` to `curr`.
///
/// When `curr < prev` the register wrapped once and the increase is
/// `(u64::MAX - prev) + curr + 1`, which is what modular subtraction yields.
pub fn counter_delta(prev: u64, curr: u64) -> u64 {
    curr.wrapping_sub(prev)
}

/// Busy share of elapsed cycles, in percent, clamped to `[0, 100]`.
pub fn utilization(work_delta: u64, total_delta: u64) -> f64 {
    if total_delta == 0 {
        return 0.0;
    }
    let util = 100.0 * work_delta as f64 / total_delta as f64;
    util.clamp(0.0, 100.0)
}

/// Truncate toward zero at the tenths digit: `33.26 -> 33.2`.
pub fn truncate_tenths(value: f64) -> f64 {
    (value * 10.0).trunc() / 10.0
}

/// Utilization of one core between two readings.
pub fn core_utilization(prev: &CoreCounters, curr: &CoreCounters) -> f64 {
    let work = counter_delta(prev.work_cycles, curr.work_cycles);
    let total = counter_delta(prev.total_cycles, curr.total_cycles);
    truncate_tenths(utilization(work, total))
}

/// Fill `out` with per-core utilization and the aggregate.
///
/// Cores missing from `previous` are skipped. The aggregate is the plain sum
/// of the per-core values and is always written. A core named like the
/// aggregate still counts toward the sum, but its own value is not published.
pub fn calc_derivatives(
    current: &CounterSnapshot,
    previous: &CounterSnapshot,
    out: &mut DerivedValues,
) {
    let mut total = 0.0;
    for (name, curr) in &current.cores {
        let Some(prev) = previous.core(name) else {
            log::debug!("{name}: no previous reading, skipping this tick");
            continue;
        };
        let util = core_utilization(prev, curr);
        total += util;
        if name == AGGREGATE_CORE {
            log::warn!("{name}: core shadowed by the aggregate key, per-core value {util} dropped");
            continue;
        }
        out.insert(core_key(name, CPU_UTILIZATION), util);
    }
    out.insert(core_key(AGGREGATE_CORE, CPU_UTILIZATION), total);
}
