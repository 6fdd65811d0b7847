use dom::Id;
use std::fmt;
use wire::DecodeError;

/// Fatal interpreter faults. Any of these aborts the remainder of the
/// current instruction buffer; mutations already applied stay in the tree
/// and recovery is a host-issued resynchronizing stream.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The instruction stream itself is unreadable.
    Decode(DecodeError),
    /// An opcode outside the closed set.
    UnknownOpcode { opcode: u8, offset: usize },
    /// The opcode needs a selected node and none is set.
    NoCursor { opcode: &'static str },
    /// The opcode needs a resolved cursor but a move is still pending.
    PendingMoveUnresolved { opcode: &'static str },
    /// A pending move had to be executed but the target node does not exist.
    MissingMoveTarget { opcode: &'static str },
    /// The cursor node has no parent to ascend or append to.
    NoParent { opcode: &'static str },
    /// The opcode needs an element cursor (or a cursor that holds children).
    NotAnElement { opcode: &'static str },
    /// The cursor (or mount) id no longer resolves in the document.
    StaleCursor { id: Id },
    /// Mount-point selector matched nothing on first use.
    MountPointNotFound { selector: String },
    /// External-tag attr string count must be even (name/value pairs).
    AttrStringsOdd { count: u8 },
    /// SetProperty operand was not valid JSON.
    BadPropertyValue { name: String, detail: String },
    /// Serialized event envelope exceeds the outbound buffer.
    EnvelopeOverflow { size: usize, capacity: usize },
    /// Callback opcode reached with no registered callback handler.
    NoCallbackHandler,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Decode(e) => write!(f, "instruction stream corrupt: {e}"),
            RenderError::UnknownOpcode { opcode, offset } => {
                write!(f, "unknown opcode {opcode} at offset {offset}")
            }
            RenderError::NoCursor { opcode } => {
                write!(f, "{opcode}: no node is selected")
            }
            RenderError::PendingMoveUnresolved { opcode } => {
                write!(f, "{opcode}: pending move has not been resolved")
            }
            RenderError::MissingMoveTarget { opcode } => {
                write!(f, "{opcode}: pending move target node does not exist")
            }
            RenderError::NoParent { opcode } => {
                write!(f, "{opcode}: selected node has no parent")
            }
            RenderError::NotAnElement { opcode } => {
                write!(f, "{opcode}: selected node is not an element")
            }
            RenderError::StaleCursor { id } => {
                write!(f, "selected node @{} no longer exists in the document", id.0)
            }
            RenderError::MountPointNotFound { selector } => {
                write!(f, "mount point selector not found: {selector}")
            }
            RenderError::AttrStringsOdd { count } => {
                write!(f, "external tag attr string count is odd: {count}")
            }
            RenderError::BadPropertyValue { name, detail } => {
                write!(f, "property {name:?} value is not valid JSON: {detail}")
            }
            RenderError::EnvelopeOverflow { size, capacity } => {
                write!(
                    f,
                    "event envelope of {size} bytes exceeds the {capacity}-byte outbound buffer"
                )
            }
            RenderError::NoCallbackHandler => {
                write!(f, "callback instruction with no registered callback handler")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for RenderError {
    fn from(e: DecodeError) -> Self {
        RenderError::Decode(e)
    }
}
