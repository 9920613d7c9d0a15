//! Command-line interface definitions and parsing

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Watch local-server liveness and print routing decisions", long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ./edge.toml when present)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Health endpoint of the local server
    #[arg(short = 'u', long)]
    pub probe_url: Option<String>,

    /// Milliseconds between scheduled probes
    #[arg(short, long)]
    pub interval_ms: Option<u64>,

    /// Per-probe deadline in milliseconds
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// Domain routed locally while the server is alive (repeatable)
    #[arg(short, long = "allow")]
    pub allow: Vec<String>,

    /// Domain never routed locally (repeatable)
    #[arg(short, long = "deny")]
    pub deny: Vec<String>,

    /// Prefer the local server when both are usable
    #[arg(long)]
    pub prefer_local: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    pub print_example_config: bool,
}
