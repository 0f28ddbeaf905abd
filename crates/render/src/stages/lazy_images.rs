//! Deferred loading for images.

use crate::hast::{Node, visit_elements_mut};

/// Stage name used in configuration and errors.
pub const NAME: &str = "lazy-images";

/// Marks every `img` as lazily loaded and asynchronously decoded.
///
/// Attributes written by the author (for instance `loading="eager"` on an
/// MDX image) win.
pub fn apply(nodes: &mut [Node]) {
    visit_elements_mut(nodes, &mut |el| {
        if !el.is("img") {
            return;
        }
        if el.attr("loading").is_none() {
            el.set_attr("loading", "lazy");
        }
        if el.attr("decoding").is_none() {
            el.set_attr("decoding", "async");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hast::{Element, to_html};

    #[test]
    fn adds_loading_hints() {
        let mut nodes: Vec<Node> = vec![
            Element::new("p")
                .with_children(vec![Element::new("img").with_attr("src", "/a.png").into()])
                .into(),
            Element::new("img")
                .with_attr("src", "/hero.png")
                .with_attr("loading", "eager")
                .into(),
        ];
        apply(&mut nodes);
        assert_eq!(
            to_html(&nodes),
            r#"<p><img src="/a.png" loading="lazy" decoding="async"></p><img src="/hero.png" loading="eager" decoding="async">"#
        );
    }
}
