use std::{cell::RefCell, sync::Arc};

use lol_html::{
    doc_text, element,
    html_content::{ContentType, TextChunk, TextType},
    text, Settings,
};

use crate::{
    error::ProxyError,
    rewriting::{
        rewriter::{Rewriter, Rewritten},
        substitution::TermSubstitution,
    },
};

pub const DEFAULT_TITLE: &str = "No title";

/// Rewrites the visible text of an HTML document, leaving markup and attributes untouched.
pub struct HtmlRewriter {
    substitution: Arc<TermSubstitution>,
}

/// Whether a text chunk of this kind is rendered as page text.
///
/// Script data and raw text (`<style>`, `<xmp>`, `<iframe>`, ...) are code or never displayed.
fn is_visible(text_type: TextType) -> bool {
    matches!(
        text_type,
        TextType::Data | TextType::RCData | TextType::PlainText | TextType::CDataSection
    )
}

#[derive(Default)]
struct TitleCapture {
    raw: Option<String>,
    capturing: bool,
}

impl HtmlRewriter {
    pub fn new(substitution: Arc<TermSubstitution>) -> Self {
        Self { substitution }
    }

    /// Buffers the chunks of one text node and substitutes the node once it is complete, so an
    /// occurrence split across chunks is still found.
    fn visit_text(&self, chunk: &mut TextChunk, pending: &mut String) {
        if !is_visible(chunk.text_type()) {
            return;
        }

        pending.push_str(chunk.as_str());

        if chunk.last_in_text_node() {
            // Chunks carry raw source text, so the result is inserted as markup.
            let rewritten = self.substitution.apply_source(pending);
            chunk.replace(&rewritten, ContentType::Html);
            pending.clear();
        } else {
            chunk.remove();
        }
    }

    fn title(&self, raw: Option<String>) -> String {
        // Substituted the same way as the body, so the title matches what the page shows.
        raw.map(|raw| {
            let rewritten = self.substitution.apply_source(&raw);
            html_escape::decode_html_entities(&rewritten)
                .trim()
                .to_string()
        })
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }
}

impl Rewriter for HtmlRewriter {
    fn rewrite(&self, input: &str) -> Result<Rewritten, ProxyError> {
        self.rewrite_chunks([input.as_bytes()])
    }
}

impl HtmlRewriter {
    /// Runs one rewrite pass over a document that arrives in pieces.
    pub fn rewrite_chunks<'a>(
        &self,
        input: impl IntoIterator<Item = &'a [u8]>,
    ) -> Result<Rewritten, ProxyError> {
        let mut output = Vec::new();
        let pending = RefCell::new(String::new());
        let title = RefCell::new(TitleCapture::default());

        let mut rewriter = lol_html::HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    element!("title", |_| {
                        let mut title = title.borrow_mut();
                        // Only the first title counts.
                        title.capturing = title.raw.is_none();
                        if title.capturing {
                            title.raw = Some(String::new());
                        }

                        Ok(())
                    }),
                    text!("title", |chunk| {
                        let mut title = title.borrow_mut();
                        if title.capturing {
                            if let Some(raw) = title.raw.as_mut() {
                                raw.push_str(chunk.as_str());
                            }
                        }

                        Ok(())
                    }),
                ],
                document_content_handlers: vec![doc_text!(|chunk| {
                    self.visit_text(chunk, &mut pending.borrow_mut());

                    Ok(())
                })],
                ..Settings::default()
            },
            |c: &[u8]| output.extend_from_slice(c),
        );

        for chunk in input {
            rewriter.write(chunk)?;
        }

        rewriter.end()?;

        Ok(Rewritten {
            content: String::from_utf8(output)?,
            title: self.title(title.into_inner().raw),
        })
    }
}
