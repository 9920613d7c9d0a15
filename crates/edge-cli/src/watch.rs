//! Event watch loop
//!
//! Runs a web-only controller and prints every event as one JSON line until
//! the shutdown future resolves or the event channel closes.

use std::future::Future;
use std::io::Write;

use edge_core::EdgeEvent;
use edge_runtime::EdgeController;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::config::WatchConfig;
use crate::error::Result;

/// Render one event for output
pub fn render_event(event: &EdgeEvent, pretty: bool) -> Result<String> {
    let line = if pretty {
        serde_json::to_string_pretty(event)?
    } else {
        serde_json::to_string(event)?
    };
    Ok(line)
}

/// Initialize the controller and stream events to `out` until `shutdown`
pub async fn run_watch<W, S>(config: &WatchConfig, out: &mut W, shutdown: S) -> Result<()>
where
    W: Write,
    S: Future<Output = ()>,
{
    let controller = EdgeController::web_only();
    let mut events = controller.subscribe();
    controller.init(config.routing_options()).await?;

    tokio::pin!(shutdown);
    let outcome = loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break Ok(());
            }
            received = events.recv() => match received {
                Ok(event) => {
                    let line = render_event(&event, config.output.pretty_json)?;
                    if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
                        break Err(e.into());
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event output lagging"),
                Err(RecvError::Closed) => break Ok(()),
            }
        }
    };

    controller.destroy();
    outcome
}
