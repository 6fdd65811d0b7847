pub type CallbackId = u32;

/// Capture/passive flags that make otherwise-identical listeners distinct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventFlags {
    pub capture: bool,
    pub passive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalTagKind {
    /// Style-like tag carrying its payload as text content.
    Inline,
    /// Link-like tag referencing an external resource by URL.
    Linked,
}

impl ExternalTagKind {
    /// Element name used in the document for tags of this kind.
    pub fn tag_name(self) -> &'static str {
        match self {
            ExternalTagKind::Inline => "style",
            ExternalTagKind::Linked => "link",
        }
    }
}
