//! Minimal HTML syntax tree shared by every tree stage.
//!
//! Markdown is lowered into this tree once; stages then rewrite elements in
//! place and the final tree is serialized back to an HTML string.

/// A node in the HTML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Text, escaped on output.
    Text(String),
    /// Trusted HTML emitted verbatim (raw HTML blocks from Markdown sources).
    Raw(String),
}

impl Node {
    /// Shorthand for a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Returns the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the element mutably if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An HTML element. Attribute order is preserved for deterministic output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Tag name, case preserved (MDX components keep their capitalisation).
    pub tag: String,
    /// Attributes in insertion order.
    pub attrs: Vec<(String, String)>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style children setter.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Builder-style single text child.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children = vec![Node::Text(text.into())];
        self
    }

    /// Returns the attribute value if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets or replaces an attribute.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(idx).1)
    }

    /// Whether the tag matches (ASCII case-insensitive).
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Heading depth for `h1`..`h6`.
    pub fn heading_depth(&self) -> Option<u8> {
        let bytes = self.tag.as_bytes();
        match bytes {
            [b'h' | b'H', d @ b'1'..=b'6'] => Some(d - b'0'),
            _ => None,
        }
    }

    /// Iterates the whitespace-separated classes.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Whether the element carries the class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Adds a class unless already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let value = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr("class", value);
    }

    /// Replaces every class starting with `prefix` by `replacement` (or drops them).
    pub fn replace_class_prefix(&mut self, prefix: &str, replacement: Option<&str>) {
        let mut classes: Vec<String> = self
            .classes()
            .filter(|c| !c.starts_with(prefix))
            .map(str::to_string)
            .collect();
        if let Some(replacement) = replacement {
            classes.insert(0, replacement.to_string());
        }
        if classes.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", classes.join(" "));
        }
    }

    /// Concatenated descendant text.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Whether any descendant is an element with the given tag.
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.children.iter().any(|child| match child {
            Node::Element(el) => el.is(tag) || el.contains_tag(tag),
            Node::Raw(raw) => {
                let lower = raw.to_ascii_lowercase();
                lower.contains(&format!("<{tag} ")) || lower.contains(&format!("<{tag}>"))
            }
            Node::Text(_) => false,
        })
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Raw(_) => {}
        }
    }
}

/// Visits every element in document order, parents before children.
pub fn visit_elements_mut<F>(nodes: &mut [Node], visit: &mut F)
where
    F: FnMut(&mut Element),
{
    for node in nodes {
        if let Node::Element(el) = node {
            visit(el);
            visit_elements_mut(&mut el.children, visit);
        }
    }
}

/// Visits every element in document order, parents before children.
pub fn visit_elements<'a, F>(nodes: &'a [Node], visit: &mut F)
where
    F: FnMut(&'a Element),
{
    for node in nodes {
        if let Node::Element(el) = node {
            visit(el);
            visit_elements(&el.children, visit);
        }
    }
}

/// Merges adjacent text nodes throughout the tree.
pub fn normalize_text(nodes: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            Node::Text(next) => {
                if let Some(Node::Text(prev)) = merged.last_mut() {
                    prev.push_str(&next);
                    continue;
                }
                merged.push(Node::Text(next));
            }
            Node::Element(mut el) => {
                normalize_text(&mut el.children);
                merged.push(Node::Element(el));
            }
            raw => merged.push(raw),
        }
    }
    *nodes = merged;
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const BOOLEAN_ATTRS: &[&str] = &[
    "checked",
    "disabled",
    "hidden",
    "open",
    "data-footnotes",
    "data-footnote-ref",
    "data-footnote-backref",
];

/// Serializes nodes to an HTML string.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
            Node::Raw(raw) => out.push_str(raw),
            Node::Element(el) => write_element(el, out),
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        if value.is_empty() && BOOLEAN_ATTRS.contains(&name.as_str()) {
            continue;
        }
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.iter().any(|v| el.is(v)) {
        return;
    }

    write_nodes(&el.children, out);
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_nested_elements_with_escaping() {
        let tree = vec![
            Element::new("p")
                .with_attr("class", "lead")
                .with_children(vec![
                    Node::text("a < b & c "),
                    Element::new("a").with_attr("href", "/x").with_text("link").into(),
                ])
                .into(),
        ];
        assert_eq!(
            to_html(&tree),
            r#"<p class="lead">a &lt; b &amp; c <a href="/x">link</a></p>"#
        );
    }

    #[test]
    fn void_and_boolean_attributes() {
        let tree = vec![
            Element::new("input")
                .with_attr("type", "checkbox")
                .with_attr("disabled", "")
                .into(),
            Element::new("img").with_attr("alt", "").into(),
        ];
        assert_eq!(to_html(&tree), r#"<input type="checkbox" disabled><img alt="">"#);
    }

    #[test]
    fn class_helpers() {
        let mut el = Element::new("code").with_attr("class", "language-js:app.js extra");
        assert!(el.has_class("extra"));
        el.replace_class_prefix("language-", Some("language-js"));
        assert_eq!(el.attr("class"), Some("language-js extra"));
        el.add_class("extra");
        el.add_class("code-highlight");
        assert_eq!(el.attr("class"), Some("language-js extra code-highlight"));
    }

    #[test]
    fn heading_depth_only_for_h1_to_h6() {
        assert_eq!(Element::new("h3").heading_depth(), Some(3));
        assert_eq!(Element::new("h7").heading_depth(), None);
        assert_eq!(Element::new("hr").heading_depth(), None);
    }

    #[test]
    fn normalize_merges_text_runs() {
        let mut nodes = vec![
            Node::text("[@"),
            Node::text("doe2020]"),
            Element::new("em")
                .with_children(vec![Node::text("a"), Node::text("b")])
                .into(),
        ];
        normalize_text(&mut nodes);
        assert_eq!(nodes[0], Node::text("[@doe2020]"));
        assert_eq!(nodes[1].as_element().unwrap().children, vec![Node::text("ab")]);
    }
}
