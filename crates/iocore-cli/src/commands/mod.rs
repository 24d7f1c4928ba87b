pub mod catalog;
pub mod collect;
pub mod policy;
pub mod serve;

use std::path::Path;
use std::time::Duration;

use iocore_core::{
    CollectorConfig, ConfigValues, IoCoreCollector, Namespace, VHOST_PATH_KEY, load_config_file,
};

/// Initialize `env_logger`; `RUST_LOG` takes precedence over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

/// Merge the optional config file with a `--vhost-path` override and resolve
/// the result against the collector's policy. Exits on failure.
pub fn resolve_config(vhost_path: Option<&str>, config_path: Option<&str>) -> CollectorConfig {
    let mut values = match config_path {
        Some(path) => load_config_file(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }),
        None => ConfigValues::new(),
    };
    if let Some(p) = vhost_path {
        values.insert(VHOST_PATH_KEY.to_string(), p.to_string());
    }

    IoCoreCollector::config_policy()
        .resolve(&values)
        .unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        })
}

/// Parse `--metric` arguments; the whole catalog when none are given.
pub fn parse_metrics(raw: &[String]) -> Result<Vec<Namespace>, String> {
    if raw.is_empty() {
        return Ok(IoCoreCollector::catalog_namespaces());
    }
    raw.iter()
        .map(|s| s.parse::<Namespace>().map_err(|e| format!("{s}: {e}")))
        .collect()
}

/// Parse a duration like "250ms", "2s", "5m" or "1h" (bare numbers are seconds).
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();

    let (numeric, multiplier) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3_600_000)
    } else {
        (s, 1000)
    };

    let value: u64 = numeric.trim().parse().ok()?;
    Some(Duration::from_millis(value.checked_mul(multiplier)?))
}

/// Serialize `value` as pretty JSON to `path`.
pub fn write_json<T: serde::Serialize>(value: &T, path: &str, label: &str) -> Result<(), String> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| format!("serializing {label}: {e}"))?;
    std::fs::write(path, json).map_err(|e| format!("writing {path}: {e}"))?;
    println!("{label} written to {path}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // parse_duration tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_duration_bare_number_is_seconds() {
        assert_eq!(parse_duration("3"), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("fast"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("-1s"), None);
    }

    // -----------------------------------------------------------------------
    // parse_metrics tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_metrics_defaults_to_catalog() {
        let ns = parse_metrics(&[]).unwrap();
        assert_eq!(ns, IoCoreCollector::catalog_namespaces());
    }

    #[test]
    fn test_parse_metrics_wildcard() {
        let ns = parse_metrics(&["/ibm/sysfs/iocore/*/cpu_utilization".to_string()]).unwrap();
        assert_eq!(ns.len(), 1);
        assert!(ns[0].is_wildcard());
    }

    #[test]
    fn test_parse_metrics_reports_bad_input() {
        let err = parse_metrics(&["//".to_string()]).unwrap_err();
        assert!(err.starts_with("//"));
    }

    // -----------------------------------------------------------------------
    // write_json tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_write_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let path = path.to_str().unwrap();
        write_json(&vec![1, 2, 3], path, "Numbers").unwrap();
        let back: Vec<i32> = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_write_json_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let err = write_json(&vec![1], path.to_str().unwrap(), "Numbers").unwrap_err();
        assert!(err.starts_with("writing "));
    }

    // -----------------------------------------------------------------------
    // resolve_config tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_resolve_config_override() {
        let cfg = resolve_config(Some("/tmp/vhost"), None);
        assert_eq!(cfg.vhost_path, std::path::PathBuf::from("/tmp/vhost"));
    }

    #[test]
    fn test_resolve_config_default() {
        let cfg = resolve_config(None, None);
        assert_eq!(cfg, CollectorConfig::default());
    }
}
