use crate::markup;
use crate::node::{Id, Node};
use crate::query::Selector;

/// A live document tree.
///
/// Owns the node hierarchy and the id allocator. Ids are assigned when a
/// subtree is attached and stay valid until the node is removed or replaced;
/// a replaced slot gets a fresh id, so a dangling id simply stops resolving.
#[derive(Debug)]
pub struct Document {
    root: Node,
    next_id: u32,
}

impl Document {
    pub fn new() -> Self {
        let mut root = Node::document();
        root.set_id(Id(1));
        Self { root, next_id: 2 }
    }

    /// Parse `src` leniently and build a document from it.
    pub fn from_markup(src: &str) -> Self {
        let mut doc = Self::new();
        let mut children = markup::parse_markup(src);
        for child in &mut children {
            assign_ids(child, &mut doc.next_id);
        }
        *doc.root.children_mut().expect("document root has children") = children;
        doc
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_id(&self) -> Id {
        self.root.id()
    }

    pub fn get(&self, id: Id) -> Option<&Node> {
        find_node(&self.root, id)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut Node> {
        find_node_mut(&mut self.root, id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.get(id).is_some()
    }

    pub fn parent_of(&self, id: Id) -> Option<Id> {
        find_parent(&self.root, id).map(Node::id)
    }

    pub fn first_child_of(&self, id: Id) -> Option<Id> {
        self.get(id)?.children()?.first().map(Node::id)
    }

    pub fn next_sibling_of(&self, id: Id) -> Option<Id> {
        let parent = find_parent(&self.root, id)?;
        let children = parent.children()?;
        let idx = children.iter().position(|c| c.id() == id)?;
        children.get(idx + 1).map(Node::id)
    }

    /// Attach `node` (and its subtree) as the last child of `parent`.
    /// Returns the id assigned to `node`, or None if `parent` cannot hold
    /// children or does not resolve.
    pub fn append_child(&mut self, parent: Id, mut node: Node) -> Option<Id> {
        assign_ids(&mut node, &mut self.next_id);
        let new_id = node.id();
        let parent = find_node_mut(&mut self.root, parent)?;
        parent.children_mut()?.push(node);
        Some(new_id)
    }

    /// Replace the node at `target`'s tree slot with `node`, which receives a
    /// fresh id. The old subtree is dropped.
    pub fn replace_node(&mut self, target: Id, mut node: Node) -> Option<Id> {
        assign_ids(&mut node, &mut self.next_id);
        let new_id = node.id();
        let parent = find_parent_mut(&mut self.root, target)?;
        let children = parent.children_mut()?;
        let idx = children.iter().position(|c| c.id() == target)?;
        children[idx] = node;
        Some(new_id)
    }

    /// Remove every sibling after `id` under its parent. Returns how many
    /// nodes were pruned, or None if `id` has no parent.
    pub fn remove_siblings_after(&mut self, id: Id) -> Option<usize> {
        let parent = find_parent_mut(&mut self.root, id)?;
        let children = parent.children_mut()?;
        let idx = children.iter().position(|c| c.id() == id)?;
        let pruned = children.len() - idx - 1;
        children.truncate(idx + 1);
        Some(pruned)
    }

    /// Detach the node at `id` (with its subtree) from the document.
    pub fn remove_node(&mut self, id: Id) -> bool {
        let Some(parent) = find_parent_mut(&mut self.root, id) else {
            return false;
        };
        let Some(children) = parent.children_mut() else {
            return false;
        };
        let Some(idx) = children.iter().position(|c| c.id() == id) else {
            return false;
        };
        children.remove(idx);
        true
    }

    /// Replace the children of `parent` wholesale (inner-markup semantics).
    pub fn set_children(&mut self, parent: Id, children: Vec<Node>) -> bool {
        let mut assigned = children;
        for child in &mut assigned {
            assign_ids(child, &mut self.next_id);
        }
        let Some(parent) = find_node_mut(&mut self.root, parent) else {
            return false;
        };
        match parent.children_mut() {
            Some(slot) => {
                *slot = assigned;
                true
            }
            None => false,
        }
    }

    /// First node matching the selector, in document order.
    pub fn query(&self, selector: &str) -> Option<Id> {
        let sel = Selector::parse(selector)?;
        find_match(&self.root, &sel).map(Node::id)
    }

    /// All elements with the given tag name, in document order.
    pub fn elements_named(&self, tag: &str) -> Vec<Id> {
        let mut out = Vec::new();
        collect_named(&self.root, tag, &mut out);
        out
    }

    /// Concatenated text content of the subtree at `id`.
    pub fn deep_text(&self, id: Id) -> String {
        let mut out = String::new();
        if let Some(node) = self.get(id) {
            collect_text(node, &mut out);
        }
        out
    }

    /// The document's shared resource area: the first `head` element,
    /// created under `html` (or the root) when missing.
    pub fn ensure_head(&mut self) -> Id {
        if let Some(head) = self.query("head") {
            return head;
        }
        let parent = self.query("html").unwrap_or_else(|| self.root_id());
        self.append_child(parent, Node::element("head"))
            .expect("document root accepts children")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn assign_ids(node: &mut Node, next: &mut u32) {
    if node.id() == Id::UNSET {
        node.set_id(Id(*next));
        *next = next.wrapping_add(1);
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            assign_ids(child, next);
        }
    }
}

fn find_node(node: &Node, id: Id) -> Option<&Node> {
    if node.id() == id {
        return Some(node);
    }
    for child in node.children().unwrap_or_default() {
        if let Some(found) = find_node(child, id) {
            return Some(found);
        }
    }
    None
}

fn find_node_mut(node: &mut Node, id: Id) -> Option<&mut Node> {
    if node.id() == id {
        return Some(node);
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            if let Some(found) = find_node_mut(child, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_parent(node: &Node, id: Id) -> Option<&Node> {
    let children = node.children()?;
    if children.iter().any(|c| c.id() == id) {
        return Some(node);
    }
    for child in children {
        if let Some(found) = find_parent(child, id) {
            return Some(found);
        }
    }
    None
}

fn find_parent_mut(node: &mut Node, id: Id) -> Option<&mut Node> {
    let direct = node
        .children()
        .is_some_and(|cs| cs.iter().any(|c| c.id() == id));
    if direct {
        return Some(node);
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            if let Some(found) = find_parent_mut(child, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_match<'a>(node: &'a Node, sel: &Selector) -> Option<&'a Node> {
    if sel.matches(node) {
        return Some(node);
    }
    for child in node.children().unwrap_or_default() {
        if let Some(found) = find_match(child, sel) {
            return Some(found);
        }
    }
    None
}

fn collect_named(node: &Node, tag: &str, out: &mut Vec<Id>) {
    if node.tag_is(tag) {
        out.push(node.id());
    }
    for child in node.children().unwrap_or_default() {
        collect_named(child, tag, out);
    }
}

fn collect_text(node: &Node, out: &mut String) {
    if let Node::Text { text, .. } = node {
        out.push_str(text);
    }
    for child in node.children().unwrap_or_default() {
        collect_text(child, out);
    }
}
