//! CLI for iocore — sample vhost I/O core utilization from sysfs.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "iocore")]
#[command(about = "iocore — per-core vhost I/O core utilization from sysfs counters")]
#[command(version = iocore_core::VERSION)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the metrics this collector exposes
    Catalog {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the accepted configuration options and their defaults
    Policy {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run collection cycles and print the resulting metrics.
    /// The first cycle reports every core at 0% (no previous sample yet).
    Collect {
        /// Directory holding iocores_utilization and nr_iocores
        #[arg(long)]
        vhost_path: Option<String>,

        /// JSON file of config options (e.g. {"vhost_path": "/sys/class/vhost"})
        #[arg(long)]
        config: Option<String>,

        /// Namespace to collect (repeatable); default is the whole catalog
        #[arg(long = "metric")]
        metrics: Vec<String>,

        /// Delay between cycles (e.g. "500ms", "1s", "1m")
        #[arg(long, default_value = "1s")]
        interval: String,

        /// Number of cycles (0 = until Ctrl+C)
        #[arg(long, default_value = "2")]
        count: u64,

        /// Print one JSON line per cycle instead of a table
        #[arg(long)]
        json: bool,

        /// Write the last cycle's metrics as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Start an HTTP server that collects on request
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8043")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory holding iocores_utilization and nr_iocores
        #[arg(long)]
        vhost_path: Option<String>,

        /// JSON file of config options
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    commands::init_logging(cli.verbose);

    match cli.command {
        Commands::Catalog { json } => commands::catalog::run(json),
        Commands::Policy { json } => commands::policy::run(json),
        Commands::Collect {
            vhost_path,
            config,
            metrics,
            interval,
            count,
            json,
            output,
        } => commands::collect::run(commands::collect::CollectCommandConfig {
            vhost_path: vhost_path.as_deref(),
            config_path: config.as_deref(),
            metrics: &metrics,
            interval: &interval,
            count,
            json,
            output_path: output.as_deref(),
        }),
        Commands::Serve {
            port,
            host,
            vhost_path,
            config,
        } => commands::serve::run(&host, port, vhost_path.as_deref(), config.as_deref()),
    }
}
