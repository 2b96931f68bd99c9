//! Resolution of in-page hyperlinks against the URL the page was requested from.
//!
//! The client attaches a click interceptor to every link whose descriptor has `intercept` set. A
//! click emits `navigate(resolved_url)` instead of letting the sandboxed frame navigate natively.

use std::collections::HashSet;

use lol_html::{element, Settings};
use serde::Serialize;
use url::Url;

use crate::error::ProxyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkKind {
    /// `https://host/path`
    Absolute,
    /// `//host/path`
    ProtocolRelative,
    /// `/path`
    RootRelative,
    /// `path`, `../path`, `path?query`
    DocumentRelative,
    /// `#anchor`
    Fragment,
}

impl LinkKind {
    /// Fragment links only scroll the current page, refetching it gains nothing.
    pub fn intercepted(self) -> bool {
        self != LinkKind::Fragment
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDescriptor {
    pub original_href: String,
    pub resolved_url: String,
    pub kind: LinkKind,
    /// Whether the client should route clicks on this link back through the proxy.
    pub intercept: bool,
}

/// Resolves hrefs relative to one base URL. Build a new one for every rendered document.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    scheme: String,
    origin: String,
    directory: String,
    document: String,
}

impl LinkResolver {
    pub fn new(base: &Url) -> Self {
        let path = base.path();
        let directory = match path.rfind('/') {
            Some(index) => &path[..=index],
            None => "/",
        };

        let mut document = base.clone();
        document.set_fragment(None);

        Self {
            scheme: base.scheme().to_string(),
            origin: base.origin().ascii_serialization(),
            directory: directory.to_string(),
            document: document.into(),
        }
    }

    /// Returns `None` for hrefs that must be left alone: empty, `javascript:` and other
    /// non-navigational schemes.
    pub fn resolve(&self, href: &str) -> Option<LinkDescriptor> {
        if href.is_empty() {
            return None;
        }

        let trimmed = href.trim_start();
        let (kind, resolved_url) = if has_prefix_ignore_case(trimmed, "http://")
            || has_prefix_ignore_case(trimmed, "https://")
        {
            (LinkKind::Absolute, trimmed.to_string())
        } else if trimmed.starts_with("//") {
            (LinkKind::ProtocolRelative, format!("{}:{}", self.scheme, trimmed))
        } else if trimmed.starts_with('/') {
            (LinkKind::RootRelative, format!("{}{}", self.origin, trimmed))
        } else if trimmed.starts_with('#') {
            (LinkKind::Fragment, format!("{}{}", self.document, trimmed))
        } else if explicit_scheme(trimmed).is_some() {
            return None;
        } else {
            (
                LinkKind::DocumentRelative,
                format!("{}{}{}", self.origin, self.directory, trimmed),
            )
        };

        Some(LinkDescriptor {
            original_href: href.to_string(),
            resolved_url,
            kind,
            intercept: kind.intercepted(),
        })
    }

    /// Collects one descriptor per distinct `<a href>` in `html`, in document order.
    pub fn collect(&self, html: &str) -> Result<Vec<LinkDescriptor>, ProxyError> {
        let mut links = Vec::new();
        let mut seen = HashSet::new();

        let mut rewriter = lol_html::HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![element!("a[href]", |el| {
                    let Some(href) = el.get_attribute("href") else {
                        return Ok(());
                    };
                    // Attribute values come back raw; the browser sees them decoded.
                    let href = html_escape::decode_html_entities(&href).into_owned();

                    if let Some(link) = self.resolve(&href) {
                        if seen.insert(href) {
                            links.push(link);
                        }
                    }

                    Ok(())
                })],
                ..Settings::default()
            },
            |_: &[u8]| {},
        );

        rewriter.write(html.as_bytes())?;

        rewriter.end()?;

        Ok(links)
    }
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// The scheme of `href` when it starts with one, e.g. `mailto` or `javascript`.
fn explicit_scheme(href: &str) -> Option<&str> {
    let (scheme, _) = href.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    valid.then_some(scheme)
}
