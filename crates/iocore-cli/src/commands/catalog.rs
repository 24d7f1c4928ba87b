use iocore_core::IoCoreCollector;

/// Print the metric catalog.
pub fn run(json: bool) {
    let types = IoCoreCollector::metric_types();
    if json {
        let value = serde_json::json!({
            "meta": IoCoreCollector::meta(),
            "metrics": types,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_default()
        );
        return;
    }

    let meta = IoCoreCollector::meta();
    println!("{} v{} (concurrency {})", meta.name, meta.version, meta.concurrency_count);
    println!();
    println!("{:<40} {:<8} DESCRIPTION", "NAMESPACE", "UNIT");
    for m in &types {
        let unit = if m.unit.is_empty() { "-" } else { m.unit.as_str() };
        println!("{:<40} {:<8} {}", m.namespace.to_string(), unit, m.description);
        for e in m.namespace.elements().iter().filter(|e| e.is_dynamic()) {
            println!("{:<40} {:<8}   * = {}: {}", "", "", e.name, e.description);
        }
    }
}
