//! Minimal selector matching for mount-point and resource lookups.
//!
//! Supported forms: `tag`, `#id`, `.class`, `tag#id`, `tag.class`.
//! Combinators, attribute selectors, and selector lists are intentionally
//! out of scope; hosts address mount points by id or tag in practice.

use crate::node::Node;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Selector {
    tag: Option<String>,
    id: Option<String>,
    class: Option<String>,
}

impl Selector {
    pub(crate) fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let (tag, rest) = match input.find(['#', '.']) {
            Some(0) => (None, input),
            Some(pos) => (Some(input[..pos].to_ascii_lowercase()), &input[pos..]),
            None => (Some(input.to_ascii_lowercase()), ""),
        };

        let mut id = None;
        let mut class = None;
        if let Some(name) = rest.strip_prefix('#') {
            if name.is_empty() || name.contains(['#', '.']) {
                return None;
            }
            id = Some(name.to_string());
        } else if let Some(name) = rest.strip_prefix('.') {
            if name.is_empty() || name.contains(['#', '.']) {
                return None;
            }
            class = Some(name.to_string());
        } else if !rest.is_empty() {
            return None;
        }

        Some(Self { tag, id, class })
    }

    pub(crate) fn matches(&self, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !node.tag_is(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(class) = &self.class {
            let listed = node
                .attr("class")
                .is_some_and(|v| v.split_ascii_whitespace().any(|t| t == class));
            if !listed {
                return false;
            }
        }
        true
    }
}
