//! Assigns a unique anchor id to every heading.

use crate::hast::{Node, visit_elements, visit_elements_mut};
use inkpost_core::Slugger;

/// Stage name used in configuration and errors.
pub const NAME: &str = "heading-ids";

/// Gives every `h1`..`h6` without an id one derived from its text.
///
/// Ids already present (written as `{#id}` in the source) are reserved
/// first, so generated ids never collide with them.
pub fn apply(nodes: &mut [Node]) {
    let mut slugger = Slugger::new();

    visit_elements(nodes, &mut |el| {
        if el.heading_depth().is_some()
            && let Some(id) = el.attr("id")
            && !slugger.reserve(id)
        {
            log::warn!("duplicate explicit heading id `{id}`");
        }
    });

    visit_elements_mut(nodes, &mut |el| {
        if el.heading_depth().is_some() && el.attr("id").is_none() {
            let id = slugger.next_slug(&el.text_content());
            el.set_attr("id", id);
        }
    });
}
