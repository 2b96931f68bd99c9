//! Shared helpers for the endpoint tests

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use faleproxy_common::{app, state::Config};
use mockito::{Mock, ServerGuard};
use serde_json::Value;
use tower::ServiceExt;

pub const SAMPLE_HTML_WITH_YALE: &str = r##"<!DOCTYPE html>
<html>
<head>
    <title>Yale University Test Page</title>
    <style>.yale-blue { color: #00356b; }</style>
</head>
<body>
    <h1>Welcome to Yale University</h1>
    <p>Yale University is a private Ivy League research university in New Haven, Connecticut.</p>
    <p>Founded in 1701, YALE is the third-oldest institution of higher education in the United States.</p>
    <nav>
        <a href="https://www.yale.edu/about">About Yale</a>
        <a href="/admissions">Yale Admissions</a>
        <a href="faculty">Faculty</a>
        <a href="#section-2">Jump</a>
        <a href="javascript:void(0)">Nothing</a>
    </nav>
    <img src="https://www.yale.edu/images/logo.png" alt="Yale Logo">
    <script>const yale = "Yale";</script>
</body>
</html>
"##;

pub fn router() -> Router {
    app(&Config::default()).expect("default config builds")
}

pub async fn mock_page(server: &mut ServerGuard, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create_async()
        .await
}

/// Sends `body` to `POST /fetch` and returns the status with the decoded JSON response.
pub async fn post_fetch(body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/fetch")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request");

    let response = router().oneshot(request).await.expect("infallible router");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");

    (status, serde_json::from_slice(&bytes).expect("JSON body"))
}
