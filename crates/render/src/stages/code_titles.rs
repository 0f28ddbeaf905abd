//! File titles for fenced code blocks.
//!
//! ```` ```ts:src/app.ts ```` (or `title="src/app.ts"` in the fence meta)
//! becomes a `div.remark-code-title` placed right before the `pre`, and the
//! code keeps a plain `language-ts` class so highlighting still applies.

use super::{code_language, code_of_pre};
use crate::hast::{Element, Node};
use inkpost_core::CodeInfo;

/// Stage name used in configuration and errors.
pub const NAME: &str = "code-titles";

/// Class of the inserted title element.
pub const TITLE_CLASS: &str = "remark-code-title";

/// Inserts title elements before every titled code block.
pub fn apply(nodes: &mut Vec<Node>) {
    let mut idx = 0;
    while idx < nodes.len() {
        if let Some(title) = nodes[idx].as_element_mut().and_then(take_title) {
            let div = Element::new("div")
                .with_attr("class", TITLE_CLASS)
                .with_text(title);
            nodes.insert(idx, div.into());
            idx += 2;
            continue;
        }
        if let Node::Element(el) = &mut nodes[idx] {
            apply(&mut el.children);
        }
        idx += 1;
    }
}

fn take_title(pre: &mut Element) -> Option<String> {
    let code = code_of_pre(pre)?;
    let info = CodeInfo::parse(code_language(code), code.attr("data-meta"));
    let title = info.title?;

    let class = info.language.map(|lang| format!("language-{lang}"));
    code.replace_class_prefix("language-", class.as_deref());
    match info.meta {
        Some(meta) => code.set_attr("data-meta", meta),
        None => {
            code.remove_attr("data-meta");
        }
    }
    Some(title)
}
