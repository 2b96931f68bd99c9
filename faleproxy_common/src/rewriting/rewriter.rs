use crate::error::ProxyError;

/// The output of one rewrite pass over a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub content: String,
    pub title: String,
}

pub trait Rewriter {
    fn rewrite(&self, input: &str) -> Result<Rewritten, ProxyError>;
}
