//! Whitespace and markup minification of the final HTML.

use crate::error::TransformStageError;

/// Stage name used in configuration and errors.
pub const NAME: &str = "minify";

/// Minifies an HTML fragment.
pub fn apply(html: &str) -> Result<String, TransformStageError> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;

    let bytes = minify_html::minify(html.as_bytes(), &cfg);
    String::from_utf8(bytes).map_err(|err| TransformStageError::new(NAME, err.to_string()))
}
