use iocore_core::IoCoreCollector;

/// Print the config policy.
pub fn run(json: bool) {
    let policy = IoCoreCollector::config_policy();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&policy).unwrap_or_default()
        );
        return;
    }

    println!("Config policy for /{}", policy.namespace.join("/"));
    for rule in &policy.rules {
        println!(
            "  {:<12} string  required={:<5}  default={}",
            rule.key,
            rule.required,
            rule.default.as_deref().unwrap_or("(none)")
        );
    }
}
