//! Self-links on headings.

use crate::hast::{Element, Node, visit_elements_mut};
use serde::{Deserialize, Serialize};

/// Stage name used in configuration and errors.
pub const NAME: &str = "autolink-headings";

/// Where the self-link goes relative to the heading content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutolinkBehavior {
    /// Insert an icon link before the content.
    Prepend,
    /// Insert an icon link after the content.
    Append,
    /// Wrap the heading content in the link.
    #[default]
    Wrap,
}

/// Options for the autolink stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutolinkOptions {
    /// Link placement.
    pub behavior: AutolinkBehavior,
    /// Optional class for the generated anchor.
    pub class_name: Option<String>,
}

/// Links every heading that has an id to its own anchor.
pub fn apply(nodes: &mut [Node], options: &AutolinkOptions) {
    visit_elements_mut(nodes, &mut |el| {
        if el.heading_depth().is_none() {
            return;
        }
        let Some(id) = el.attr("id").map(str::to_string) else {
            return;
        };
        link_heading(el, &id, options);
    });
}

fn link_heading(heading: &mut Element, id: &str, options: &AutolinkOptions) {
    let mut anchor = Element::new("a").with_attr("href", format!("#{id}"));
    if let Some(class) = &options.class_name {
        anchor.set_attr("class", class);
    }

    match options.behavior {
        AutolinkBehavior::Wrap => {
            // Nested anchors are invalid HTML.
            if heading.contains_tag("a") {
                return;
            }
            anchor.children = std::mem::take(&mut heading.children);
            heading.children.push(anchor.into());
        }
        AutolinkBehavior::Prepend | AutolinkBehavior::Append => {
            anchor.set_attr("aria-hidden", "true");
            anchor.set_attr("tabindex", "-1");
            anchor
                .children
                .push(Element::new("span").with_attr("class", "icon icon-link").into());
            if options.behavior == AutolinkBehavior::Prepend {
                heading.children.insert(0, anchor.into());
            } else {
                heading.children.push(anchor.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hast::to_html;

    fn headings() -> Vec<Node> {
        vec![
            Element::new("h2").with_attr("id", "intro").with_text("Intro").into(),
            Element::new("h3").with_text("No id").into(),
        ]
    }

    #[test]
    fn wraps_content_by_default() {
        let mut nodes = headings();
        apply(&mut nodes, &AutolinkOptions::default());
        assert_eq!(
            to_html(&nodes),
            r##"<h2 id="intro"><a href="#intro">Intro</a></h2><h3>No id</h3>"##
        );
    }

    #[test]
    fn prepend_adds_icon_link() {
        let mut nodes = headings();
        let options = AutolinkOptions {
            behavior: AutolinkBehavior::Prepend,
            class_name: Some("anchor".into()),
        };
        apply(&mut nodes, &options);
        assert_eq!(
            to_html(&nodes[..1]),
            r##"<h2 id="intro"><a href="#intro" class="anchor" aria-hidden="true" tabindex="-1"><span class="icon icon-link"></span></a>Intro</h2>"##
        );
    }

    #[test]
    fn headings_with_links_are_not_wrapped() {
        let mut nodes: Vec<Node> = vec![
            Element::new("h2")
                .with_attr("id", "docs")
                .with_children(vec![Element::new("a").with_attr("href", "/d").with_text("Docs").into()])
                .into(),
        ];
        apply(&mut nodes, &AutolinkOptions::default());
        assert_eq!(to_html(&nodes), r#"<h2 id="docs"><a href="/d">Docs</a></h2>"#);
    }
}
