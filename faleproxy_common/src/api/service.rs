use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use hyper::header::CONTENT_TYPE;
use tower_http::trace::TraceLayer;

use crate::state::APIState;

use super::fetch::post_fetch;

const INDEX_HTML: &str = include_str!("public/index.html");
const SCRIPT_JS: &str = include_str!("public/script.js");
const STYLES_CSS: &str = include_str!("public/styles.css");

pub fn service(state: Arc<APIState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/script.js", get(script))
        .route("/styles.css", get(styles))
        .route("/fetch", post(post_fetch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn script() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/javascript; charset=utf-8")],
        SCRIPT_JS,
    )
}

async fn styles() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    )
}
