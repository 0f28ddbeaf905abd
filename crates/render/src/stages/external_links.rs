//! `target` and `rel` for links leaving the site.

use crate::hast::{Node, visit_elements_mut};
use serde::{Deserialize, Serialize};

/// Stage name used in configuration and errors.
pub const NAME: &str = "external-links";

/// Options for the external links stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalLinkOptions {
    /// Value for `target`; `None` leaves it unset.
    pub target: Option<String>,
    /// Tokens merged into `rel`.
    pub rel: Vec<String>,
}

impl Default for ExternalLinkOptions {
    fn default() -> Self {
        Self {
            target: Some("_blank".to_string()),
            rel: vec!["nofollow".to_string(), "noopener".to_string(), "noreferrer".to_string()],
        }
    }
}

/// Whether `href` points off-site: absolute `http(s)` or protocol-relative.
pub fn is_external(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Decorates every external `a` element.
pub fn apply(nodes: &mut [Node], options: &ExternalLinkOptions) {
    visit_elements_mut(nodes, &mut |el| {
        if !el.is("a") || !el.attr("href").is_some_and(is_external) {
            return;
        }
        if let Some(target) = &options.target {
            el.set_attr("target", target);
        }
        if options.rel.is_empty() {
            return;
        }
        let mut rel: Vec<String> = el
            .attr("rel")
            .unwrap_or("")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        for token in &options.rel {
            if !rel.contains(token) {
                rel.push(token.clone());
            }
        }
        el.set_attr("rel", rel.join(" "));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hast::{Element, to_html};

    fn link(href: &str) -> Node {
        Element::new("a").with_attr("href", href).with_text("x").into()
    }

    #[test]
    fn detects_external_hrefs() {
        assert!(is_external("https://example.com"));
        assert!(is_external("HTTP://example.com"));
        assert!(is_external("//cdn.example.com/a.js"));
        assert!(!is_external("/posts/a"));
        assert!(!is_external("#intro"));
        assert!(!is_external("mailto:me@example.com"));
    }

    #[test]
    fn decorates_only_external_links() {
        let mut nodes = vec![link("https://example.com"), link("/about")];
        apply(&mut nodes, &ExternalLinkOptions::default());
        assert_eq!(
            to_html(&nodes),
            r#"<a href="https://example.com" target="_blank" rel="nofollow noopener noreferrer">x</a><a href="/about">x</a>"#
        );
    }

    #[test]
    fn merges_existing_rel_tokens() {
        let mut nodes: Vec<Node> = vec![
            Element::new("a")
                .with_attr("href", "https://example.com")
                .with_attr("rel", "me noopener")
                .into(),
        ];
        let options = ExternalLinkOptions {
            target: None,
            rel: vec!["noopener".into(), "external".into()],
        };
        apply(&mut nodes, &options);
        assert_eq!(
            to_html(&nodes),
            r#"<a href="https://example.com" rel="me noopener external"></a>"#
        );
    }
}
