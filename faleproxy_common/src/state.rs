use std::{net::SocketAddr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::proxy::pipeline::Pipeline;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// The listen address for the proxy server and its client page
    pub host: SocketAddr,
    /// The term to replace in the visible text of fetched pages, matched in any casing
    pub target_term: String,
    /// The term to put in its place. Its casing follows each replaced occurrence
    pub replacement_term: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: SocketAddr::from(([0, 0, 0, 0], 3001)),
            target_term: "Yale".to_string(),
            replacement_term: "Fale".to_string(),
        }
    }
}

#[derive(Clone)]
/// The state that is passed to the API routes
pub struct APIState {
    pub pipeline: Arc<Pipeline>,
}
