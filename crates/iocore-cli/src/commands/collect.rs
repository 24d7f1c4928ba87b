use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use iocore_core::{IoCoreCollector, MetricSample};

/// Poll granularity while waiting out the interval, so Ctrl+C stays responsive.
const SLEEP_STEP: Duration = Duration::from_millis(50);

pub struct CollectCommandConfig<'a> {
    pub vhost_path: Option<&'a str>,
    pub config_path: Option<&'a str>,
    pub metrics: &'a [String],
    pub interval: &'a str,
    pub count: u64,
    pub json: bool,
    pub output_path: Option<&'a str>,
}

pub fn run(cfg: CollectCommandConfig<'_>) {
    let config = super::resolve_config(cfg.vhost_path, cfg.config_path);
    let requested = super::parse_metrics(cfg.metrics).unwrap_or_else(|e| {
        eprintln!("Invalid --metric {e}");
        std::process::exit(2);
    });
    let Some(interval) = super::parse_duration(cfg.interval) else {
        eprintln!("Invalid --interval value: {}", cfg.interval);
        std::process::exit(2);
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }

    let mut collector = IoCoreCollector::new();
    let mut last: Vec<MetricSample> = Vec::new();
    let mut cycle = 0u64;

    while running.load(Ordering::SeqCst) && (cfg.count == 0 || cycle < cfg.count) {
        if cycle > 0 && !sleep_while_running(interval, &running) {
            break;
        }
        cycle += 1;

        match collector.collect_from(&config, &requested) {
            Ok(samples) => {
                if cfg.json {
                    print_json_line(cycle, &samples);
                } else {
                    print_table(cycle, &samples);
                }
                last = samples;
            }
            Err(e) => {
                eprintln!("Collection failed: {e}");
                std::process::exit(1);
            }
        }
    }

    if let Some(path) = cfg.output_path {
        if let Err(e) = super::write_json(&last, path, "Metrics") {
            eprintln!("Error {e}");
            std::process::exit(1);
        }
    }
}

/// Sleep for `total`, returning `false` if interrupted.
fn sleep_while_running(total: Duration, running: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    while running.load(Ordering::SeqCst) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return true;
        }
        std::thread::sleep(remaining.min(SLEEP_STEP));
    }
    false
}

fn print_json_line(cycle: u64, samples: &[MetricSample]) {
    let line = serde_json::json!({
        "cycle": cycle,
        "metrics": samples,
    });
    println!("{line}");
}

fn print_table(cycle: u64, samples: &[MetricSample]) {
    let ts = samples.first().map(|s| s.timestamp_unix_ms).unwrap_or_default();
    println!("cycle {cycle}  (captured at {ts} ms)");
    if samples.is_empty() {
        println!("  no metrics");
        return;
    }
    for s in samples {
        println!("  {:<48} {:>8.1}", s.path(), s.value);
    }
}
