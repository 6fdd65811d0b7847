//! External resource tag reconciliation.
//!
//! Tags live in the document's shared head area, not under the mount point,
//! so they are reconciled by semantic identity instead of tree position:
//! text content for inline (`style`) tags, `href` for linked (`link`) tags.
//! Only tags this interpreter created are ever swept; anything that was on
//! the page beforehand is left alone.

use core_types::ExternalTagKind;
use dom::{Document, Id, Node};
use std::collections::HashSet;

pub(crate) struct ExternalTagSet {
    kind: ExternalTagKind,
    /// Tags created by the interpreter (the ownership flag).
    owned: HashSet<Id>,
    /// Tags asserted since the last sweep.
    wanted: Vec<Id>,
}

impl ExternalTagSet {
    pub fn new(kind: ExternalTagKind) -> Self {
        Self {
            kind,
            owned: HashSet::new(),
            wanted: Vec::new(),
        }
    }

    /// Assert one tag: reuse a document tag with the same semantic key, or
    /// create an owned one in the head. An empty key is a logged no-op.
    pub fn apply(&mut self, doc: &mut Document, text: &str, attrs: &[(String, String)]) {
        let key = match self.kind {
            ExternalTagKind::Inline => text.to_string(),
            ExternalTagKind::Linked => attrs
                .iter()
                .find(|(name, _)| name == "href")
                .map(|(_, value)| value.clone())
                .unwrap_or_default(),
        };
        if key.is_empty() {
            log::warn!(
                target: "render_vm.external",
                "{} tag ignored due to empty key",
                self.kind.tag_name()
            );
            return;
        }

        for id in doc.elements_named(self.kind.tag_name()) {
            if self.key_of(doc, id) == key {
                self.wanted.push(id);
                return;
            }
        }

        let mut tag = Node::element(self.kind.tag_name());
        for (name, value) in attrs {
            tag.set_attr(None, name, value.clone());
        }
        if !text.is_empty() {
            if let Some(children) = tag.children_mut() {
                children.push(Node::text(text));
            }
        }
        let head = doc.ensure_head();
        if let Some(id) = doc.append_child(head, tag) {
            log::trace!(target: "render_vm.external", "created {} tag @{}", self.kind.tag_name(), id.0);
            self.owned.insert(id);
            self.wanted.push(id);
        }
    }

    /// Remove every owned tag not asserted since the last sweep, then reset
    /// the wanted set for the next cycle.
    pub fn sweep(&mut self, doc: &mut Document) {
        for id in doc.elements_named(self.kind.tag_name()) {
            if !self.owned.contains(&id) || self.wanted.contains(&id) {
                continue;
            }
            log::trace!(target: "render_vm.external", "removing {} tag @{}", self.kind.tag_name(), id.0);
            doc.remove_node(id);
            self.owned.remove(&id);
        }
        self.wanted.clear();
    }

    pub fn owns(&self, id: Id) -> bool {
        self.owned.contains(&id)
    }

    fn key_of(&self, doc: &Document, id: Id) -> String {
        match self.kind {
            ExternalTagKind::Inline => doc.deep_text(id),
            ExternalTagKind::Linked => doc
                .get(id)
                .and_then(|node| node.attr("href"))
                .unwrap_or_default()
                .to_string(),
        }
    }
}
