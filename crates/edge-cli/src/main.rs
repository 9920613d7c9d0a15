//! Edge Watch - prints routing decisions for a local server

use anyhow::Context;
use clap::Parser;
use tracing::info;

use edge_cli::{cli::Cli, config::WatchConfig, watch::run_watch};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_example_config {
        println!("{}", WatchConfig::example_config());
        return Ok(());
    }

    let config = WatchConfig::load(&cli).context("failed to load configuration")?;
    setup_logging(config.output.verbose);

    info!(
        probe_url = config.probe.url.as_deref().unwrap_or("<unset>"),
        "starting edge watch"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let mut stdout = std::io::stdout();
    run_watch(&config, &mut stdout, shutdown)
        .await
        .context("edge watch failed")?;

    info!("edge watch exited");
    Ok(())
}

/// Setup logging based on verbosity level. Logs go to stderr so stdout
/// carries only events.
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
