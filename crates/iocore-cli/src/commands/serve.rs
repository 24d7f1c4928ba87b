pub fn run(host: &str, port: u16, vhost_path: Option<&str>, config_path: Option<&str>) {
    let config = super::resolve_config(vhost_path, config_path);

    let base = format!("http://{host}:{port}");
    println!("iocore server v{}", iocore_core::VERSION);
    println!("   {base}");
    println!("   reading {}", config.vhost_path.display());
    println!();
    println!("   Endpoints:");
    println!("     GET /          API index");
    println!("     GET /metrics   Run one collection cycle");
    println!("     GET /catalog   Metric types");
    println!("     GET /policy    Config options");
    println!("     GET /health    Outcome of the last cycle");
    println!();
    println!("   Examples:");
    println!("     curl {base}/metrics");
    println!("     curl '{base}/metrics?ns=/ibm/sysfs/iocore/*/cpu_utilization'");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(iocore_server::run_server(config, host, port)) {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
