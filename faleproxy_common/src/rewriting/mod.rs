pub mod html;
pub mod rewriter;
pub mod substitution;
