use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    Json,
};
use scorched::{logf, LogData, LogImportance};
use serde::Deserialize;

use crate::error::Result;
use crate::proxy::pipeline::Fetched;
use crate::state::APIState;

#[derive(Deserialize)]
pub struct FetchRequest {
    pub url: Option<String>,
}

#[debug_handler]
pub async fn post_fetch(
    State(state): State<Arc<APIState>>,
    payload: std::result::Result<Json<FetchRequest>, JsonRejection>,
) -> Result<Json<Fetched>> {
    // A body that is not a JSON object carries no URL either.
    let url = match payload {
        Ok(Json(FetchRequest { url })) => url,
        Err(rejection) => {
            logf!(Info, "Rejected fetch body: {}", rejection.body_text());
            None
        }
    };

    Ok(Json(state.pipeline.process(url.as_deref()).await?))
}
