use serde_json::Value;

pub type NodeId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Id(pub NodeId);

impl Id {
    /// Reserved sentinel for "not yet attached to a document".
    pub const UNSET: Id = Id(0);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Clone, Debug)]
pub enum Node {
    Document {
        id: Id,
        children: Vec<Node>,
    },
    Element {
        id: Id,
        name: String,
        namespace: Option<String>,
        attributes: Vec<Attr>,
        /// Host-object fields with no attribute form, set via the property
        /// opcode. Opaque to the tree; last write wins.
        properties: Vec<(String, Value)>,
        children: Vec<Node>,
    },
    Text {
        id: Id,
        text: String,
    },
    Comment {
        id: Id,
        text: String,
    },
}

impl Node {
    pub fn document() -> Self {
        Node::Document {
            id: Id::UNSET,
            children: Vec::new(),
        }
    }

    pub fn element(name: impl Into<String>) -> Self {
        Node::Element {
            id: Id::UNSET,
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn element_ns(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Node::Element {
            id: Id::UNSET,
            name: name.into(),
            namespace: Some(namespace.into()),
            attributes: Vec::new(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text {
            id: Id::UNSET,
            text: text.into(),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Node::Comment {
            id: Id::UNSET,
            text: text.into(),
        }
    }

    pub fn id(&self) -> Id {
        match self {
            Node::Document { id, .. }
            | Node::Element { id, .. }
            | Node::Text { id, .. }
            | Node::Comment { id, .. } => *id,
        }
    }

    pub(crate) fn set_id(&mut self, new_id: Id) {
        match self {
            Node::Document { id, .. }
            | Node::Element { id, .. }
            | Node::Text { id, .. }
            | Node::Comment { id, .. } => *id = new_id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document { .. } => NodeKind::Document,
            Node::Element { .. } => NodeKind::Element,
            Node::Text { .. } => NodeKind::Text,
            Node::Comment { .. } => NodeKind::Comment,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element { .. })
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Document { children, .. } | Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children, .. } | Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Element tag name, if this is an element.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Node::Element { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// ASCII case-insensitive tag comparison (element names are not
    /// canonicalized on input).
    pub fn tag_is(&self, tag: &str) -> bool {
        self.name().is_some_and(|n| n.eq_ignore_ascii_case(tag))
    }

    pub fn attributes(&self) -> Option<&[Attr]> {
        match self {
            Node::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    /// Set an attribute, overwriting an existing one with the same
    /// name + namespace. Returns false for non-elements.
    pub fn set_attr(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        value: impl Into<String>,
    ) -> bool {
        let Node::Element { attributes, .. } = self else {
            return false;
        };
        let value = value.into();
        for attr in attributes.iter_mut() {
            if attr.name == name && attr.namespace.as_deref() == namespace {
                attr.value = value;
                return true;
            }
        }
        attributes.push(Attr {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            value,
        });
        true
    }

    /// Drop every attribute whose name fails the predicate.
    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str) -> bool) -> bool {
        let Node::Element { attributes, .. } = self else {
            return false;
        };
        attributes.retain(|a| keep(&a.name));
        true
    }

    pub fn properties(&self) -> Option<&[(String, Value)]> {
        match self {
            Node::Element { properties, .. } => Some(properties),
            _ => None,
        }
    }

    pub fn set_property(&mut self, name: &str, value: Value) -> bool {
        let Node::Element { properties, .. } = self else {
            return false;
        };
        for (k, v) in properties.iter_mut() {
            if k == name {
                *v = value;
                return true;
            }
        }
        properties.push((name.to_string(), value));
        true
    }

    pub fn text_content(&self) -> Option<&str> {
        match self {
            Node::Text { text, .. } | Node::Comment { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn set_text_content(&mut self, content: impl Into<String>) -> bool {
        match self {
            Node::Text { text, .. } | Node::Comment { text, .. } => {
                *text = content.into();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attr_overwrites_same_name_and_namespace() {
        let mut el = Node::element("div");
        assert!(el.set_attr(None, "class", "a"));
        assert!(el.set_attr(None, "class", "b"));
        assert!(el.set_attr(Some("urn:x"), "class", "c"));
        assert_eq!(el.attributes().unwrap().len(), 2);
        assert_eq!(el.attr("class"), Some("b"));
    }

    #[test]
    fn attr_helpers_reject_non_elements() {
        let mut t = Node::text("hi");
        assert!(!t.set_attr(None, "id", "x"));
        assert!(!t.retain_attrs(|_| true));
        assert_eq!(t.attr("id"), None);
    }

    #[test]
    fn property_overwrite_is_in_place() {
        let mut el = Node::element("input");
        el.set_property("value", Value::from("one"));
        el.set_property("value", Value::from("two"));
        let props = el.properties().unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].1, Value::from("two"));
    }

    #[test]
    fn tag_is_ignores_ascii_case() {
        let el = Node::element("DIV");
        assert!(el.tag_is("div"));
        assert!(!el.tag_is("span"));
    }
}
