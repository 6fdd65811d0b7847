//! The instruction loop and cursor state machine.
//!
//! The loop owns nothing but the decode cursor; everything else lives in
//! [`RenderState`] so a stream cut off at a buffer boundary resumes exactly
//! where it stopped on the next `apply` call. Movement opcodes only record
//! intent; the next materialization opcode resolves it against the tree,
//! reusing nodes when they match and replacing them in place when they
//! don't.

use crate::error::RenderError;
use crate::event::{self, ActiveEvent, DispatchOutcome, DomEvent, EventBuffer, EventScope};
use crate::state::{EventKey, PendingMove, RenderState};
use core_types::{CallbackId, EventFlags, ExternalTagKind};
use dom::{Document, Id, Node};
use wire::{Reader, op};

/// The rendering VM: applies binary edit streams to a document and bridges
/// document events back to the host.
pub struct RenderVm {
    state: RenderState,
}

impl RenderVm {
    pub fn new() -> Self {
        Self {
            state: RenderState::new(),
        }
    }

    /// Interpret one instruction buffer against `doc`.
    ///
    /// Stops at the End opcode or when the buffer is exhausted at an
    /// instruction boundary; state carries over to the next call either
    /// way. On error the remainder of the buffer is abandoned and any
    /// mutations already made stay in the tree.
    pub fn apply(&mut self, doc: &mut Document, buf: &[u8]) -> Result<(), RenderError> {
        let mut r = Reader::new(buf);
        loop {
            if r.at_end() {
                log::trace!(target: "render_vm.interp", "buffer exhausted at offset {}", r.offset());
                return Ok(());
            }
            let opcode = r.read_u8()?;
            log::trace!(target: "render_vm.interp", "opcode {opcode} ({})", op::name(opcode));

            match opcode {
                op::END => return Ok(()),

                op::CLEAR_SELECTED_NODE => {
                    self.state.cursor = None;
                    self.state.pending = PendingMove::None;
                }

                op::SELECT_BY_QUERY => {
                    let selector = r.read_string()?;
                    self.state.cursor = doc.query(&selector);
                    self.state.pending = PendingMove::None;
                }

                op::SELECT_MOUNT_POINT => self.op_select_mount_point(doc, &mut r)?,

                op::MOVE_TO_FIRST_CHILD => {
                    self.op_move(doc, PendingMove::FirstChild, "MoveToFirstChild")?
                }
                op::MOVE_TO_NEXT_SIBLING => {
                    self.op_move(doc, PendingMove::NextSibling, "MoveToNextSibling")?
                }
                op::MOVE_TO_PARENT => self.op_move_to_parent(doc)?,

                op::SET_ELEMENT => {
                    let tag = r.read_string()?;
                    self.state.reset_markers();
                    self.materialize(doc, NodeSpec::Element { tag, ns: None }, "SetElement")?;
                }
                op::SET_ELEMENT_NAMESPACED => {
                    let tag = r.read_string()?;
                    let ns = r.read_string()?;
                    self.state.reset_markers();
                    self.materialize(
                        doc,
                        NodeSpec::Element { tag, ns: Some(ns) },
                        "SetElementNamespaced",
                    )?;
                }
                op::SET_TEXT => {
                    let content = r.read_string()?;
                    self.materialize(doc, NodeSpec::Text(content), "SetText")?;
                }
                op::SET_COMMENT => {
                    let content = r.read_string()?;
                    self.materialize(doc, NodeSpec::Comment(content), "SetComment")?;
                }

                op::SET_ATTR => self.op_set_attr(doc, &mut r, false)?,
                op::SET_ATTR_NAMESPACED => self.op_set_attr(doc, &mut r, true)?,
                op::REMOVE_OTHER_ATTRS => self.op_remove_other_attrs(doc)?,

                op::SET_EVENT_LISTENER => self.op_set_event_listener(&mut r)?,
                op::REMOVE_OTHER_EVENT_LISTENERS => {
                    let position_id = r.read_string()?;
                    let cursor = self.require_resolved("RemoveOtherEventListeners")?;
                    let removed = self.state.listeners.sweep_position(
                        cursor,
                        &position_id,
                        &self.state.event_keys,
                    );
                    if removed > 0 {
                        log::trace!(
                            target: "render_vm.interp",
                            "swept {removed} listeners at position {position_id}"
                        );
                    }
                }

                op::BUFFER_INNER_MARKUP => {
                    let chunk = r.read_bytes()?;
                    self.state.markup.push(chunk);
                }
                op::SET_INNER_MARKUP => self.op_set_inner_markup(doc, &mut r)?,

                op::SET_PROPERTY => self.op_set_property(doc, &mut r)?,

                op::SET_EXTERNAL_INLINE_TAG => {
                    self.op_set_external_tag(doc, &mut r, ExternalTagKind::Inline)?
                }
                op::SET_EXTERNAL_LINKED_TAG => {
                    self.op_set_external_tag(doc, &mut r, ExternalTagKind::Linked)?
                }
                op::REMOVE_OTHER_EXTERNAL_INLINE_TAGS => self.state.inline_tags.sweep(doc),
                op::REMOVE_OTHER_EXTERNAL_LINKED_TAGS => self.state.linked_tags.sweep(doc),

                op::CALLBACK => {
                    let id = r.read_u32()?;
                    self.invoke_callback(id, None)?;
                }
                op::CALLBACK_WITH_CURRENT_NODE => {
                    let id = r.read_u32()?;
                    let cursor = self.require_cursor("CallbackWithCurrentNode")?;
                    self.invoke_callback(id, Some(cursor))?;
                }

                _ => {
                    return Err(RenderError::UnknownOpcode {
                        opcode,
                        offset: r.offset() - 1,
                    });
                }
            }
        }
    }

    pub fn cursor(&self) -> Option<Id> {
        self.state.cursor
    }

    pub fn mount_point(&self) -> Option<Id> {
        self.state.mount
    }

    /// Register the handler invoked synchronously for every delivered
    /// document event. The handler reads the envelope through the scope.
    pub fn set_event_handler(&mut self, handler: impl FnMut(EventScope<'_>) + 'static) {
        self.state.event_handler = Some(Box::new(handler));
    }

    /// Register the handler for callback instructions.
    pub fn set_callback_handler(&mut self, handler: impl FnMut(CallbackId, Option<Id>) + 'static) {
        self.state.callback_handler = Some(Box::new(handler));
    }

    pub fn event_buffer(&self) -> &EventBuffer {
        &self.state.event_buffer
    }

    /// Deliver a live document event fired on `target`.
    pub fn dispatch_event(
        &mut self,
        doc: &Document,
        target: Id,
        event: &DomEvent,
    ) -> Result<DispatchOutcome, RenderError> {
        event::dispatch(&mut self.state, doc, target, event)
    }

    pub fn active_event(&self) -> Option<&ActiveEvent> {
        self.state.active_event.as_ref()
    }

    pub fn active_event_target(&self) -> Option<Id> {
        self.state.active_event.as_ref().map(ActiveEvent::target)
    }

    pub fn active_event_current_target(&self) -> Option<Id> {
        self.state
            .active_event
            .as_ref()
            .map(ActiveEvent::current_target)
    }

    /// No-op when no event is active.
    pub fn active_event_prevent_default(&mut self) {
        if let Some(active) = self.state.active_event.as_mut() {
            active.default_prevented = true;
        }
    }

    /// No-op when no event is active.
    pub fn active_event_stop_propagation(&mut self) {
        if let Some(active) = self.state.active_event.as_mut() {
            active.propagation_stopped = true;
        }
    }

    /// Whether a listener identity is currently registered. Intended for
    /// host-side diagnostics.
    pub fn has_listener(
        &self,
        position_id: &str,
        event_type: &str,
        capture: bool,
        passive: bool,
    ) -> bool {
        let key = EventKey {
            event_type: event_type.to_string(),
            flags: EventFlags { capture, passive },
        };
        self.state.listeners.lookup(position_id, &key).is_some()
    }

    pub fn registered_listener_count(&self) -> usize {
        self.state.listeners.registered_count()
    }

    /// Whether the interpreter created the given external tag.
    pub fn owns_external_tag(&self, id: Id) -> bool {
        self.state.inline_tags.owns(id) || self.state.linked_tags.owns(id)
    }

    fn require_cursor(&self, opcode: &'static str) -> Result<Id, RenderError> {
        self.state.cursor.ok_or(RenderError::NoCursor { opcode })
    }

    fn require_resolved(&self, opcode: &'static str) -> Result<Id, RenderError> {
        let cursor = self.require_cursor(opcode)?;
        if self.state.pending != PendingMove::None {
            return Err(RenderError::PendingMoveUnresolved { opcode });
        }
        Ok(cursor)
    }

    fn op_select_mount_point(
        &mut self,
        doc: &mut Document,
        r: &mut Reader<'_>,
    ) -> Result<(), RenderError> {
        let selector = r.read_string()?;
        let tag = r.read_string()?;

        self.state.reset_markers();

        // First call locates by selector; afterwards the remembered node is
        // reused directly (the selector may stop matching once attributes
        // have been synced over).
        let el = match self.state.mount {
            Some(id) => id,
            None => {
                let Some(found) = doc.query(&selector) else {
                    return Err(RenderError::MountPointNotFound { selector });
                };
                self.state.mount = Some(found);
                found
            }
        };

        let node = doc.get(el).ok_or(RenderError::StaleCursor { id: el })?;
        if node.tag_is(&tag) {
            self.state.cursor = Some(el);
        } else {
            let replacement = doc
                .replace_node(el, Node::element(tag))
                .ok_or(RenderError::StaleCursor { id: el })?;
            self.state.mount = Some(replacement);
            self.state.cursor = Some(replacement);
        }
        self.state.pending = PendingMove::None;
        Ok(())
    }

    /// Record movement intent, first executing any outstanding intent by
    /// actually traversing (its target must exist by now).
    fn op_move(
        &mut self,
        doc: &Document,
        next: PendingMove,
        opcode: &'static str,
    ) -> Result<(), RenderError> {
        match self.state.pending {
            PendingMove::FirstChild => {
                let cursor = self.require_cursor(opcode)?;
                let child = doc
                    .first_child_of(cursor)
                    .ok_or(RenderError::MissingMoveTarget { opcode })?;
                self.state.cursor = Some(child);
                self.state.pending = PendingMove::None;
            }
            PendingMove::NextSibling => {
                let cursor = self.require_cursor(opcode)?;
                let sibling = doc
                    .next_sibling_of(cursor)
                    .ok_or(RenderError::MissingMoveTarget { opcode })?;
                self.state.cursor = Some(sibling);
                self.state.pending = PendingMove::None;
            }
            PendingMove::None => {}
        }

        self.require_cursor(opcode)?;
        self.state.pending = next;
        Ok(())
    }

    fn op_move_to_parent(&mut self, doc: &mut Document) -> Result<(), RenderError> {
        // A pending first-child means no children were materialized: just
        // drop the intent and stay on the parent.
        if self.state.pending == PendingMove::FirstChild {
            self.state.pending = PendingMove::None;
            return Ok(());
        }

        let cursor = self.require_cursor("MoveToParent")?;
        let parent = doc.parent_of(cursor).ok_or(RenderError::NoParent {
            opcode: "MoveToParent",
        })?;
        // Anything after the cursor is a trailing child the host no longer
        // wants; one sweep prunes them all.
        let _ = doc.remove_siblings_after(cursor);
        self.state.cursor = Some(parent);
        self.state.pending = PendingMove::None;
        Ok(())
    }

    fn materialize(
        &mut self,
        doc: &mut Document,
        spec: NodeSpec,
        opcode: &'static str,
    ) -> Result<(), RenderError> {
        match self.state.pending {
            PendingMove::FirstChild => {
                let cursor = self.require_cursor(opcode)?;
                self.state.pending = PendingMove::None;
                match doc.first_child_of(cursor) {
                    Some(child) => {
                        self.state.cursor = Some(child);
                        self.verify(doc, child, &spec)?;
                    }
                    None => {
                        // Freshly created nodes need no verification.
                        let id = doc
                            .append_child(cursor, spec.build())
                            .ok_or(RenderError::NotAnElement { opcode })?;
                        self.state.cursor = Some(id);
                    }
                }
            }
            PendingMove::NextSibling => {
                let cursor = self.require_cursor(opcode)?;
                self.state.pending = PendingMove::None;
                match doc.next_sibling_of(cursor) {
                    Some(sibling) => {
                        self.state.cursor = Some(sibling);
                        self.verify(doc, sibling, &spec)?;
                    }
                    None => {
                        let parent = doc
                            .parent_of(cursor)
                            .ok_or(RenderError::NoParent { opcode })?;
                        let id = doc
                            .append_child(parent, spec.build())
                            .ok_or(RenderError::NotAnElement { opcode })?;
                        self.state.cursor = Some(id);
                    }
                }
            }
            PendingMove::None => {
                let cursor = self.require_cursor(opcode)?;
                self.verify(doc, cursor, &spec)?;
            }
        }
        Ok(())
    }

    /// The cursor points at an existing node: keep it if it matches the
    /// requested shape, replace it in its slot if not.
    fn verify(&mut self, doc: &mut Document, id: Id, spec: &NodeSpec) -> Result<(), RenderError> {
        let node = doc.get(id).ok_or(RenderError::StaleCursor { id })?;
        let keep = match spec {
            NodeSpec::Element { tag, ns } => {
                node.is_element() && node.tag_is(tag) && node.namespace() == ns.as_deref()
            }
            NodeSpec::Text(_) => matches!(node, Node::Text { .. }),
            NodeSpec::Comment(_) => matches!(node, Node::Comment { .. }),
        };

        if keep {
            if let NodeSpec::Text(content) | NodeSpec::Comment(content) = spec {
                if let Some(node) = doc.get_mut(id) {
                    node.set_text_content(content.clone());
                }
            }
        } else {
            let replacement = doc
                .replace_node(id, spec.build())
                .ok_or(RenderError::StaleCursor { id })?;
            self.state.cursor = Some(replacement);
        }
        Ok(())
    }

    fn op_set_attr(
        &mut self,
        doc: &mut Document,
        r: &mut Reader<'_>,
        namespaced: bool,
    ) -> Result<(), RenderError> {
        let opcode = if namespaced {
            "SetAttrNamespaced"
        } else {
            "SetAttr"
        };
        let ns = if namespaced {
            let ns = r.read_string()?;
            // An empty namespace operand means "no namespace".
            (!ns.is_empty()).then_some(ns)
        } else {
            None
        };
        let name = r.read_string()?;
        let value = r.read_string()?;

        let cursor = self.require_resolved(opcode)?;
        let node = doc
            .get_mut(cursor)
            .ok_or(RenderError::StaleCursor { id: cursor })?;
        if !node.set_attr(ns.as_deref(), &name, value) {
            return Err(RenderError::NotAnElement { opcode });
        }
        self.state.attr_names.insert(name);
        Ok(())
    }

    fn op_remove_other_attrs(&mut self, doc: &mut Document) -> Result<(), RenderError> {
        let cursor = self.require_resolved("RemoveOtherAttrs")?;
        let node = doc
            .get_mut(cursor)
            .ok_or(RenderError::StaleCursor { id: cursor })?;
        let asserted = &self.state.attr_names;
        if !node.retain_attrs(|name| asserted.contains(name)) {
            return Err(RenderError::NotAnElement {
                opcode: "RemoveOtherAttrs",
            });
        }
        Ok(())
    }

    fn op_set_event_listener(&mut self, r: &mut Reader<'_>) -> Result<(), RenderError> {
        let position_id = r.read_string()?;
        let event_type = r.read_string()?;
        let capture = r.read_bool()?;
        let passive = r.read_bool()?;

        let cursor = self.require_resolved("SetEventListener")?;
        let key = EventKey {
            event_type,
            flags: EventFlags { capture, passive },
        };
        self.state.event_keys.insert(key.clone());
        let handler = self.state.listeners.ensure_handler(&position_id, &key);
        // Always detach-then-attach: the node may have been replaced since
        // the identity was allocated.
        self.state.listeners.attach(cursor, handler);
        Ok(())
    }

    fn op_set_inner_markup(
        &mut self,
        doc: &mut Document,
        r: &mut Reader<'_>,
    ) -> Result<(), RenderError> {
        let chunk = r.read_bytes()?;
        let cursor = self.require_resolved("SetInnerMarkup")?;
        let node = doc
            .get(cursor)
            .ok_or(RenderError::StaleCursor { id: cursor })?;
        if !node.is_element() {
            return Err(RenderError::NotAnElement {
                opcode: "SetInnerMarkup",
            });
        }

        self.state.markup.push(chunk);
        let markup_text = self.state.markup.finish();
        let children = dom::parse_markup(&markup_text);
        doc.set_children(cursor, children);
        Ok(())
    }

    fn op_set_property(
        &mut self,
        doc: &mut Document,
        r: &mut Reader<'_>,
    ) -> Result<(), RenderError> {
        let name = r.read_string()?;
        let raw = r.read_bytes()?;
        let cursor = self.require_cursor("SetProperty")?;

        let value: serde_json::Value =
            serde_json::from_slice(raw).map_err(|e| RenderError::BadPropertyValue {
                name: name.clone(),
                detail: e.to_string(),
            })?;
        let node = doc
            .get_mut(cursor)
            .ok_or(RenderError::StaleCursor { id: cursor })?;
        if !node.set_property(&name, value) {
            return Err(RenderError::NotAnElement {
                opcode: "SetProperty",
            });
        }
        Ok(())
    }

    fn op_set_external_tag(
        &mut self,
        doc: &mut Document,
        r: &mut Reader<'_>,
        kind: ExternalTagKind,
    ) -> Result<(), RenderError> {
        let text = r.read_string()?;
        let count = r.read_u8()?;
        if count % 2 != 0 {
            return Err(RenderError::AttrStringsOdd { count });
        }
        let mut attrs = Vec::with_capacity((count / 2) as usize);
        for _ in 0..count / 2 {
            let name = r.read_string()?;
            let value = r.read_string()?;
            attrs.push((name, value));
        }

        let set = match kind {
            ExternalTagKind::Inline => &mut self.state.inline_tags,
            ExternalTagKind::Linked => &mut self.state.linked_tags,
        };
        set.apply(doc, &text, &attrs);
        Ok(())
    }

    fn invoke_callback(&mut self, id: CallbackId, node: Option<Id>) -> Result<(), RenderError> {
        let Some(mut handler) = self.state.callback_handler.take() else {
            return Err(RenderError::NoCallbackHandler);
        };
        handler(id, node);
        self.state.callback_handler = Some(handler);
        Ok(())
    }
}

impl Default for RenderVm {
    fn default() -> Self {
        Self::new()
    }
}

/// What a materialization opcode wants the cursor node to be.
enum NodeSpec {
    Element { tag: String, ns: Option<String> },
    Text(String),
    Comment(String),
}

impl NodeSpec {
    fn build(&self) -> Node {
        match self {
            NodeSpec::Element { tag, ns: None } => Node::element(tag.clone()),
            NodeSpec::Element { tag, ns: Some(ns) } => Node::element_ns(tag.clone(), ns.clone()),
            NodeSpec::Text(content) => Node::text(content.clone()),
            NodeSpec::Comment(content) => Node::comment(content.clone()),
        }
    }
}
