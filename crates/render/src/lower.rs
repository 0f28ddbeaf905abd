//! Lowers a markdown-rs MDAST into the HTML tree.

use crate::hast::{Element, Node};
use inkpost_core::{anchor_base, extract_custom_id};
use markdown::mdast::{self, AlignKind, AttributeContent, AttributeValue, Node as Md};
use std::collections::HashMap;

/// Converts a parsed document into HTML tree nodes.
///
/// Link and image references are resolved against the document's
/// definitions; GFM footnotes are collected into a trailing
/// `section.footnotes` in order of first reference.
pub fn lower(root: &Md) -> Vec<Node> {
    let mut lowering = Lowering::default();
    collect_definitions(root, &mut lowering.definitions);

    let mut nodes = lowering.node(root, false);
    if let Some(section) = lowering.footnote_section() {
        nodes.push(section.into());
    }
    nodes
}

#[derive(Default)]
struct Lowering {
    definitions: HashMap<String, (String, Option<String>)>,
    footnote_order: Vec<String>,
    footnote_defs: HashMap<String, Vec<Node>>,
    footnote_ref_counts: HashMap<String, usize>,
}

fn collect_definitions(node: &Md, out: &mut HashMap<String, (String, Option<String>)>) {
    if let Md::Definition(def) = node {
        out.entry(def.identifier.to_lowercase())
            .or_insert_with(|| (def.url.clone(), def.title.clone()));
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, out);
        }
    }
}

fn element(tag: &str, children: Vec<Node>) -> Node {
    Element::new(tag).with_children(children).into()
}

impl Lowering {
    fn children(&mut self, children: &[Md], tight: bool) -> Vec<Node> {
        children
            .iter()
            .flat_map(|child| self.node(child, tight))
            .collect()
    }

    /// Lowers one node. `tight` is set for direct children of tight list items,
    /// whose paragraphs are unwrapped.
    fn node(&mut self, node: &Md, tight: bool) -> Vec<Node> {
        let lowered: Node = match node {
            Md::Root(root) => return self.children(&root.children, false),
            Md::Paragraph(para) => {
                let children = self.children(&para.children, false);
                if tight {
                    return children;
                }
                element("p", children)
            }
            Md::Text(text) => Node::text(&text.value),
            Md::Heading(heading) => self.heading(heading),
            Md::Emphasis(em) => element("em", self.children(&em.children, false)),
            Md::Strong(strong) => element("strong", self.children(&strong.children, false)),
            Md::Delete(del) => element("del", self.children(&del.children, false)),
            Md::InlineCode(code) => Element::new("code").with_text(&code.value).into(),
            Md::Break(_) => Element::new("br").into(),
            Md::ThematicBreak(_) => Element::new("hr").into(),
            Md::Blockquote(quote) => element("blockquote", self.children(&quote.children, false)),
            Md::List(list) => self.list(list),
            Md::ListItem(item) => self.list_item(item, !item.spread),
            Md::Code(code) => code_block(code),
            Md::Math(math) => Element::new("div")
                .with_attr("class", "math math-display")
                .with_text(&math.value)
                .into(),
            Md::InlineMath(math) => Element::new("span")
                .with_attr("class", "math math-inline")
                .with_text(&math.value)
                .into(),
            Md::Link(link) => {
                let mut a = Element::new("a").with_attr("href", &link.url);
                if let Some(title) = &link.title {
                    a.set_attr("title", title);
                }
                a.with_children(self.children(&link.children, false)).into()
            }
            Md::LinkReference(link) => {
                let children = self.children(&link.children, false);
                match self.definitions.get(&link.identifier.to_lowercase()) {
                    Some((url, title)) => {
                        let mut a = Element::new("a").with_attr("href", url);
                        if let Some(title) = title {
                            a.set_attr("title", title);
                        }
                        a.with_children(children).into()
                    }
                    None => {
                        let mut nodes = vec![Node::text("[")];
                        nodes.extend(children);
                        nodes.push(Node::text("]"));
                        return nodes;
                    }
                }
            }
            Md::Image(img) => image(&img.url, &img.alt, img.title.as_deref()),
            Md::ImageReference(img) => match self.definitions.get(&img.identifier.to_lowercase()) {
                Some((url, title)) => image(url, &img.alt, title.as_deref()),
                None => Node::text(format!("![{}]", img.alt)),
            },
            Md::Table(table) => self.table(table),
            Md::Html(html) => Node::Raw(html.value.clone()),
            Md::FootnoteReference(fnref) => self.footnote_reference(&fnref.identifier),
            Md::FootnoteDefinition(def) => {
                let children = self.children(&def.children, false);
                self.footnote_defs
                    .entry(def.identifier.to_lowercase())
                    .or_insert(children);
                return Vec::new();
            }
            Md::MdxJsxFlowElement(el) => {
                return self.jsx(el.name.as_deref(), &el.attributes, &el.children);
            }
            Md::MdxJsxTextElement(el) => {
                return self.jsx(el.name.as_deref(), &el.attributes, &el.children);
            }
            Md::MdxjsEsm(_) | Md::MdxFlowExpression(_) | Md::MdxTextExpression(_) => {
                log::debug!("dropping MDX script node at {:?}", node.position());
                return Vec::new();
            }
            Md::Yaml(_) | Md::Toml(_) | Md::Definition(_) => return Vec::new(),
            _ => {
                log::warn!("Unhandled markdown node type: {:?}", node);
                return Vec::new();
            }
        };
        vec![lowered]
    }

    fn heading(&mut self, heading: &mdast::Heading) -> Node {
        let mut children = self.children(&heading.children, false);
        let mut el = Element::new(format!("h{}", heading.depth));
        if let Some(id) = strip_custom_id(&mut children) {
            el.set_attr("id", id);
        }
        el.with_children(children).into()
    }

    fn list(&mut self, list: &mdast::List) -> Node {
        let loose = list.spread
            || list
                .children
                .iter()
                .any(|item| matches!(item, Md::ListItem(li) if li.spread));

        let mut el = Element::new(if list.ordered { "ol" } else { "ul" });
        if list.ordered
            && let Some(start) = list.start.filter(|start| *start != 1)
        {
            el.set_attr("start", start.to_string());
        }
        let is_task_list = list
            .children
            .iter()
            .any(|item| matches!(item, Md::ListItem(li) if li.checked.is_some()));
        if is_task_list {
            el.set_attr("class", "contains-task-list");
        }

        let items = list
            .children
            .iter()
            .map(|child| match child {
                Md::ListItem(item) => self.list_item(item, !loose),
                other => element("li", self.node(other, false)),
            })
            .collect();
        el.with_children(items).into()
    }

    fn list_item(&mut self, item: &mdast::ListItem, tight: bool) -> Node {
        let mut li = Element::new("li");
        let mut children = self.children(&item.children, tight);

        if let Some(checked) = item.checked {
            li.set_attr("class", "task-list-item");
            let mut input = Element::new("input")
                .with_attr("type", "checkbox")
                .with_attr("disabled", "");
            if checked {
                input.set_attr("checked", "");
            }
            let prefix = [input.into(), Node::text(" ")];
            // In loose items the checkbox belongs inside the first paragraph.
            match children.first_mut().and_then(Node::as_element_mut) {
                Some(p) if p.is("p") => {
                    p.children.splice(0..0, prefix);
                }
                _ => {
                    children.splice(0..0, prefix);
                }
            }
        }

        li.with_children(children).into()
    }

    fn table(&mut self, table: &mdast::Table) -> Node {
        let mut head = Vec::new();
        let mut body = Vec::new();
        for (row_idx, row) in table.children.iter().enumerate() {
            let Md::TableRow(row) = row else { continue };
            let tag = if row_idx == 0 { "th" } else { "td" };
            let cells = row
                .children
                .iter()
                .enumerate()
                .filter_map(|(col, cell)| match cell {
                    Md::TableCell(cell) => {
                        let mut el = Element::new(tag);
                        match table.align.get(col) {
                            Some(AlignKind::Left) => el.set_attr("align", "left"),
                            Some(AlignKind::Right) => el.set_attr("align", "right"),
                            Some(AlignKind::Center) => el.set_attr("align", "center"),
                            _ => {}
                        }
                        Some(el.with_children(self.children(&cell.children, false)).into())
                    }
                    _ => None,
                })
                .collect();
            let tr = element("tr", cells);
            if row_idx == 0 {
                head.push(tr);
            } else {
                body.push(tr);
            }
        }

        let mut sections = vec![element("thead", head)];
        if !body.is_empty() {
            sections.push(element("tbody", body));
        }
        element("table", sections)
    }

    fn footnote_reference(&mut self, identifier: &str) -> Node {
        let key = identifier.to_lowercase();
        if !self.footnote_order.contains(&key) {
            self.footnote_order.push(key.clone());
        }
        let ordinal = self
            .footnote_order
            .iter()
            .position(|k| *k == key)
            .map_or(1, |idx| idx + 1);
        let count = self.footnote_ref_counts.entry(key.clone()).or_insert(0);
        *count += 1;

        let safe = anchor_base(&key);
        let ref_id = if *count == 1 {
            format!("user-content-fnref-{safe}")
        } else {
            format!("user-content-fnref-{safe}-{count}")
        };
        let link = Element::new("a")
            .with_attr("href", format!("#user-content-fn-{safe}"))
            .with_attr("id", ref_id)
            .with_attr("data-footnote-ref", "")
            .with_attr("aria-describedby", "footnote-label")
            .with_text(ordinal.to_string());
        element("sup", vec![link.into()])
    }

    fn footnote_section(&mut self) -> Option<Element> {
        let items: Vec<Node> = self
            .footnote_order
            .iter()
            .filter_map(|key| {
                let mut children = self.footnote_defs.remove(key)?;
                let safe = anchor_base(key);
                let backref = Element::new("a")
                    .with_attr("href", format!("#user-content-fnref-{safe}"))
                    .with_attr("data-footnote-backref", "")
                    .with_attr("class", "data-footnote-backref")
                    .with_text("↩");
                match children.last_mut().and_then(Node::as_element_mut) {
                    Some(p) if p.is("p") => {
                        p.children.push(Node::text(" "));
                        p.children.push(backref.into());
                    }
                    _ => children.push(backref.into()),
                }
                Some(
                    Element::new("li")
                        .with_attr("id", format!("user-content-fn-{safe}"))
                        .with_children(children)
                        .into(),
                )
            })
            .collect();

        if items.is_empty() {
            return None;
        }

        let label = Element::new("h2")
            .with_attr("id", "footnote-label")
            .with_attr("class", "sr-only")
            .with_text("Footnotes");
        Some(
            Element::new("section")
                .with_attr("class", "footnotes")
                .with_attr("data-footnotes", "")
                .with_children(vec![label.into(), element("ol", items)]),
        )
    }

    fn jsx(&mut self, name: Option<&str>, attributes: &[AttributeContent], children: &[Md]) -> Vec<Node> {
        let children = self.children(children, false);
        // Fragments splice their children into the parent.
        let Some(name) = name else {
            return children;
        };

        let mut el = Element::new(name);
        for attr in attributes {
            match attr {
                AttributeContent::Property(prop) => match &prop.value {
                    Some(AttributeValue::Literal(value)) => el.set_attr(&prop.name, value),
                    None => el.set_attr(&prop.name, ""),
                    Some(AttributeValue::Expression(expr)) => {
                        log::debug!(
                            "dropping expression attribute {}={{{}}} on <{}>",
                            prop.name,
                            expr.value,
                            name
                        );
                    }
                },
                AttributeContent::Expression(_) => {
                    log::debug!("dropping spread attribute on <{}>", name);
                }
            }
        }
        vec![el.with_children(children).into()]
    }
}

fn code_block(code: &mdast::Code) -> Node {
    let mut el = Element::new("code");
    if let Some(lang) = code.lang.as_deref().filter(|l| !l.is_empty()) {
        el.set_attr("class", format!("language-{lang}"));
    }
    if let Some(meta) = code.meta.as_deref().filter(|m| !m.is_empty()) {
        el.set_attr("data-meta", meta);
    }
    let mut text = code.value.clone();
    if !text.is_empty() {
        text.push('\n');
    }
    element("pre", vec![el.with_text(text).into()])
}

fn image(url: &str, alt: &str, title: Option<&str>) -> Node {
    let mut img = Element::new("img").with_attr("src", url).with_attr("alt", alt);
    if let Some(title) = title {
        img.set_attr("title", title);
    }
    img.into()
}

/// Removes a trailing `{#id}` from the last text descendant of heading content.
fn strip_custom_id(children: &mut [Node]) -> Option<String> {
    match children.last_mut()? {
        Node::Text(text) => {
            let (stripped, id) = extract_custom_id(text);
            let id = id?.to_string();
            *text = stripped.to_string();
            Some(id)
        }
        Node::Element(el) if !el.is("code") => strip_custom_id(&mut el.children),
        _ => None,
    }
}
