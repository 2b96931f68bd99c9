pub mod api;
pub mod error;
pub mod links;
pub mod proxy;
pub mod rewriting;
pub mod state;

use std::{future::Future, sync::Arc};

use axum::Router;
use error::Result;
use proxy::pipeline::Pipeline;
use scorched::{logf, LogData, LogImportance};
use state::{APIState, Config};

/// Builds the router for the client page and the `/fetch` endpoint.
pub fn app(config: &Config) -> Result<Router> {
    let apistate = APIState {
        pipeline: Arc::new(Pipeline::from_config(config)?),
    };

    Ok(api::service::service(Arc::new(apistate)))
}

pub async fn serve<F>(config: Arc<Config>, graceful_shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.host).await?;

    logf!(
        Info,
        "Replacing \"{}\" with \"{}\", listening on http://{}",
        config.target_term,
        config.replacement_term,
        listener.local_addr()?
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    Ok(())
}
