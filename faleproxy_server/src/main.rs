use std::{future::Future, sync::Arc};

use faleproxy_common::{error::Result, serve, state::Config};
use scorched::{logf, LogData, LogImportance};
use tokio::signal;

const APP_NAME: &str = "faleproxy";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = load_config()?;

    serve(config, stop_requested()).await?;

    logf!(Info, "Server stopped");

    Ok(())
}

/// Reads the RON config, writing the defaults on first run.
fn load_config() -> Result<Arc<Config>> {
    let path = confy::get_configuration_file_path(APP_NAME, None)?;
    logf!(Info, "Loading config from file: {}", path.display());

    let config: Config = confy::load(APP_NAME, None)?;
    Ok(Arc::new(config))
}

/// Resolves once Ctrl-C or, on unix, SIGTERM arrives.
async fn stop_requested() {
    let interrupt = wait_for("Ctrl+C", signal::ctrl_c());

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                logf!(Error, "Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }

    logf!(Info, "Stop requested, finishing open requests");
}

/// Waits for a signal. A listener that cannot be installed never fires.
async fn wait_for<F>(name: &str, signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        logf!(Error, "Cannot listen for {}: {}", name, e);
        std::future::pending::<()>().await;
    }
}
