pub mod html_rewriter;
