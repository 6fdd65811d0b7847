use crate::event::{ActiveEvent, EventBuffer, EventScope};
use crate::external::ExternalTagSet;
use crate::listeners::ListenerTable;
use core_types::{CallbackId, EventFlags, ExternalTagKind};
use dom::Id;
use std::collections::HashSet;
use tools::Utf8Accumulator;

/// Deferred traversal intent, resolved by the next materialization opcode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PendingMove {
    #[default]
    None,
    FirstChild,
    NextSibling,
}

/// Identity of a listener registration on one virtual-tree position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub event_type: String,
    pub flags: EventFlags,
}

pub(crate) type EventHandlerFn = Box<dyn FnMut(EventScope<'_>)>;
pub(crate) type CallbackHandlerFn = Box<dyn FnMut(CallbackId, Option<Id>)>;

/// Everything that persists across interpreter invocations.
///
/// Constructed once per VM and never implicitly reset: a render pass split
/// across several buffers relies on cursor, pending move, marker sets, and
/// the markup accumulator carrying over between `apply` calls. Only explicit
/// clear opcodes and sweep opcodes reset their respective pieces.
pub(crate) struct RenderState {
    pub cursor: Option<Id>,
    pub pending: PendingMove,
    /// Remembered mount node; selectors are only consulted the first time.
    pub mount: Option<Id>,

    /// Attribute names asserted on the current node scope this pass.
    pub attr_names: HashSet<String>,
    /// Listener keys asserted on the current node scope this pass.
    pub event_keys: HashSet<EventKey>,

    pub listeners: ListenerTable,
    pub inline_tags: ExternalTagSet,
    pub linked_tags: ExternalTagSet,

    /// Inner-markup bytes buffered across BufferInnerMarkup instructions.
    pub markup: Utf8Accumulator,

    pub active_event: Option<ActiveEvent>,
    pub event_buffer: EventBuffer,
    pub event_handler: Option<EventHandlerFn>,
    pub callback_handler: Option<CallbackHandlerFn>,
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            cursor: None,
            pending: PendingMove::None,
            mount: None,
            attr_names: HashSet::new(),
            event_keys: HashSet::new(),
            listeners: ListenerTable::default(),
            inline_tags: ExternalTagSet::new(ExternalTagKind::Inline),
            linked_tags: ExternalTagSet::new(ExternalTagKind::Linked),
            markup: Utf8Accumulator::new(),
            active_event: None,
            event_buffer: EventBuffer::new(),
            event_handler: None,
            callback_handler: None,
        }
    }

    /// Begin a fresh per-node scope: both marker sets start empty.
    pub fn reset_markers(&mut self) {
        self.attr_names.clear();
        self.event_keys.clear();
    }
}
