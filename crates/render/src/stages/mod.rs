//! Tree and text stages run by the pipeline.

pub mod autolink;
pub mod citation;
pub mod code_titles;
pub mod external_links;
pub mod heading_ids;
pub mod highlight;
pub mod lazy_images;
pub mod math;
pub mod minify;

use crate::hast::Element;

/// Language written on a `code` element as `class="language-…"`.
pub(crate) fn code_language(code: &Element) -> Option<&str> {
    code.classes()
        .find_map(|class| class.strip_prefix("language-"))
        .filter(|lang| !lang.is_empty())
}

/// The `code` child of a `pre` block, if this element is one.
pub(crate) fn code_of_pre(pre: &mut Element) -> Option<&mut Element> {
    if !pre.is("pre") {
        return None;
    }
    pre.children
        .iter_mut()
        .find_map(|child| child.as_element_mut().filter(|el| el.is("code")))
}
