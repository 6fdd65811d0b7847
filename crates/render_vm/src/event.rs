//! Bridge from live document events back to the host.
//!
//! Each matching listener produces one envelope in the fixed outbound
//! buffer and one synchronous call of the registered event handler. While
//! the handler runs, the event is held in the active-event slot so the
//! prevent-default / stop-propagation proxies have something to act on.

use crate::error::RenderError;
use crate::state::RenderState;
use core_types::EventFlags;
use dom::{Document, Id, Node};
use serde::Serialize;
use serde_json::{Map, Value};

/// Outbound buffer capacity, including the 4-byte length prefix.
pub const EVENT_BUFFER_CAPACITY: usize = 16384;

/// Fixed-capacity outbound buffer: a 4-byte big-endian length prefix
/// followed by the UTF-8 JSON envelope. Reused for every event; the host
/// must consume it inside the synchronous handler call.
pub struct EventBuffer {
    bytes: Box<[u8]>,
    payload_len: usize,
}

impl EventBuffer {
    pub(crate) fn new() -> Self {
        Self {
            bytes: vec![0u8; EVENT_BUFFER_CAPACITY].into_boxed_slice(),
            payload_len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Length prefix plus payload.
    pub fn envelope(&self) -> &[u8] {
        &self.bytes[..4 + self.payload_len]
    }

    /// The JSON payload alone.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[4..4 + self.payload_len]
    }

    /// Oversized envelopes fail without touching the buffer; truncation
    /// would hand the host unparseable JSON.
    pub(crate) fn write(&mut self, payload: &[u8]) -> Result<(), RenderError> {
        if payload.len() + 4 > self.bytes.len() {
            return Err(RenderError::EnvelopeOverflow {
                size: payload.len() + 4,
                capacity: self.bytes.len(),
            });
        }
        self.bytes[..4].copy_from_slice(&(payload.len() as u32).to_be_bytes());
        self.bytes[4..4 + payload.len()].copy_from_slice(payload);
        self.payload_len = payload.len();
        Ok(())
    }
}

/// A live document event as delivered by the hosting environment.
///
/// `detail` carries the environment's event fields; only primitive-valued
/// entries survive into the envelope summary.
#[derive(Clone, Debug)]
pub struct DomEvent {
    pub event_type: String,
    pub detail: Map<String, Value>,
}

impl DomEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            detail: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail.insert(name.into(), value.into());
        self
    }
}

/// The event currently being delivered to the host.
#[derive(Clone, Debug)]
pub struct ActiveEvent {
    pub(crate) target: Id,
    pub(crate) current_target: Id,
    pub(crate) event_type: String,
    pub(crate) flags: EventFlags,
    pub(crate) default_prevented: bool,
    pub(crate) propagation_stopped: bool,
}

impl ActiveEvent {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn current_target(&self) -> Id {
        self.current_target
    }

    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// What the registered event handler is handed for one delivery: the
/// outbound buffer plus proxies over the active event.
pub struct EventScope<'a> {
    pub(crate) buffer: &'a EventBuffer,
    pub(crate) active: &'a mut ActiveEvent,
}

impl EventScope<'_> {
    pub fn envelope(&self) -> &[u8] {
        self.buffer.envelope()
    }

    pub fn payload(&self) -> &[u8] {
        self.buffer.payload()
    }

    pub fn event_type(&self) -> &str {
        self.active.event_type()
    }

    pub fn target(&self) -> Id {
        self.active.target()
    }

    pub fn current_target(&self) -> Id {
        self.active.current_target()
    }

    pub fn prevent_default(&mut self) {
        self.active.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.active.propagation_stopped = true;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    /// How many listeners were delivered to.
    pub delivered: usize,
}

#[derive(Serialize)]
struct Envelope<'a> {
    position_id: &'a str,
    event_type: &'a str,
    capture: bool,
    passive: bool,
    event_summary: Value,
}

/// Deliver `event` fired on `target`: capture phase from the root down,
/// then bubbling from the target up, honoring stop-propagation.
pub(crate) fn dispatch(
    state: &mut RenderState,
    doc: &Document,
    target: Id,
    event: &DomEvent,
) -> Result<DispatchOutcome, RenderError> {
    let Some(target_node) = doc.get(target) else {
        return Err(RenderError::StaleCursor { id: target });
    };

    // Ancestor chain, target first.
    let mut chain = vec![target];
    let mut cur = target;
    while let Some(parent) = doc.parent_of(cur) {
        chain.push(parent);
        cur = parent;
    }

    let summary = build_summary(event, target_node);
    let mut outcome = DispatchOutcome::default();

    for &node in chain.iter().rev() {
        if deliver_phase(state, node, target, true, event, &summary, &mut outcome)? {
            return Ok(outcome);
        }
    }
    for &node in chain.iter() {
        if deliver_phase(state, node, target, false, event, &summary, &mut outcome)? {
            return Ok(outcome);
        }
    }

    Ok(outcome)
}

/// Deliver to all listeners on `node` registered for this phase. Returns
/// true if propagation was stopped.
fn deliver_phase(
    state: &mut RenderState,
    node: Id,
    target: Id,
    capture_phase: bool,
    event: &DomEvent,
    summary: &Value,
    outcome: &mut DispatchOutcome,
) -> Result<bool, RenderError> {
    let handlers: Vec<_> = state.listeners.handlers_at(node).to_vec();
    let mut stopped = false;

    for handler in handlers {
        let Some((position_id, key)) = state.listeners.resolve(handler).cloned() else {
            continue;
        };
        if key.event_type != event.event_type || key.flags.capture != capture_phase {
            continue;
        }

        let envelope = Envelope {
            position_id: &position_id,
            event_type: &key.event_type,
            capture: key.flags.capture,
            passive: key.flags.passive,
            event_summary: summary.clone(),
        };
        // Strings, bools, and a Value: this serialization cannot fail.
        let payload = serde_json::to_vec(&envelope).expect("envelope JSON");
        state.event_buffer.write(&payload)?;

        log::trace!(
            target: "render_vm.event",
            "delivering {} at @{} (position {position_id}, capture {capture_phase})",
            event.event_type,
            node.0,
        );

        state.active_event = Some(ActiveEvent {
            target,
            current_target: node,
            event_type: event.event_type.clone(),
            flags: key.flags,
            default_prevented: false,
            propagation_stopped: false,
        });
        if let Some(mut handler_fn) = state.event_handler.take() {
            if let Some(active) = state.active_event.as_mut() {
                handler_fn(EventScope {
                    buffer: &state.event_buffer,
                    active,
                });
            }
            state.event_handler = Some(handler_fn);
        }
        if let Some(active) = state.active_event.take() {
            outcome.default_prevented |= active.default_prevented;
            stopped |= active.propagation_stopped;
        }
        outcome.delivered += 1;
    }

    Ok(stopped)
}

/// Flat projection of the event's primitive fields, plus a `target` object
/// projecting the target node's primitives. Structured detail fields are
/// dropped.
fn build_summary(event: &DomEvent, target: &Node) -> Value {
    let mut summary = Map::new();
    summary.insert("type".to_string(), Value::from(event.event_type.clone()));
    for (name, value) in &event.detail {
        if value.is_boolean() || value.is_number() || value.is_string() {
            summary.insert(name.clone(), value.clone());
        }
    }

    let mut target_obj = Map::new();
    match target {
        Node::Element {
            name,
            attributes,
            properties,
            ..
        } => {
            target_obj.insert(
                "tagName".to_string(),
                Value::from(name.to_ascii_uppercase()),
            );
            for attr in attributes {
                target_obj.insert(attr.name.clone(), Value::from(attr.value.clone()));
            }
            for (name, value) in properties {
                if value.is_boolean() || value.is_number() || value.is_string() {
                    target_obj.insert(name.clone(), value.clone());
                }
            }
        }
        node => {
            if let Some(text) = node.text_content() {
                target_obj.insert("textContent".to_string(), Value::from(text.to_string()));
            }
        }
    }
    summary.insert("target".to_string(), Value::Object(target_obj));

    Value::Object(summary)
}
