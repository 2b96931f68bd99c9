use std::sync::Arc;

use scorched::{logf, LogData, LogImportance};
use serde::Serialize;
use url::Url;

use crate::{
    error::ProxyError,
    links::{LinkDescriptor, LinkResolver},
    rewriting::{
        html::html_rewriter::HtmlRewriter,
        rewriter::{Rewritten, Rewriter},
        substitution::TermSubstitution,
    },
    state::Config,
};

/// A fetched and rewritten page, as sent back to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fetched {
    pub success: bool,
    pub content: String,
    pub title: String,
    pub original_url: String,
    pub links: Vec<LinkDescriptor>,
}

/// Fetches a page, rewrites its text and resolves its links. Holds no per-request state.
pub struct Pipeline<R = HtmlRewriter> {
    client: reqwest::Client,
    rewriter: Arc<R>,
}

impl Pipeline {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let substitution = TermSubstitution::new(&config.target_term, &config.replacement_term)?;

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .zstd(true)
            .build()?;

        Ok(Self::new(
            client,
            Arc::new(HtmlRewriter::new(Arc::new(substitution))),
        ))
    }
}

impl<R: Rewriter> Pipeline<R> {
    pub fn new(client: reqwest::Client, rewriter: Arc<R>) -> Self {
        Self { client, rewriter }
    }

    pub async fn process(&self, url: Option<&str>) -> Result<Fetched, ProxyError> {
        let (original_url, target) = parse_target(url)?;

        logf!(Info, "Fetching {}", target);

        let body = self
            .client
            .get(target.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let Rewritten { content, title } = self.rewriter.rewrite(&body)?;
        let links = LinkResolver::new(&target).collect(&content)?;

        logf!(
            Info,
            "Rewrote {} ({} bytes, {} links): {}",
            target,
            content.len(),
            links.len(),
            title
        );

        Ok(Fetched {
            success: true,
            content,
            title,
            original_url: original_url.to_string(),
            links,
        })
    }
}

/// Checks the submitted URL before anything is sent. Returns the trimmed input and its parse.
pub fn parse_target(url: Option<&str>) -> Result<(&str, Url), ProxyError> {
    let url = url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(ProxyError::MissingUrl)?;

    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "http" | "https" => Ok((url, parsed)),
        scheme => Err(ProxyError::UnsupportedScheme(scheme.to_string())),
    }
}
