use crate::{encode, op};
use core_types::ExternalTagKind;
use std::fmt;
use tools::floor_char_boundary;

/// Largest number of attribute strings one external-tag instruction carries
/// (the count is a single byte; 255 is reserved so the pair count stays even).
pub const MAX_EXTERNAL_TAG_ATTR_STRINGS: usize = 254;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// A single instruction is larger than the whole buffer.
    DoesNotFit { needed: usize, capacity: usize },
    /// External-tag attribute list exceeds the one-byte count field.
    TooManyAttrStrings { count: usize },
    /// The flush sink failed to take the buffer.
    Sink(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::DoesNotFit { needed, capacity } => write!(
                f,
                "instruction of {needed} bytes does not fit in a {capacity}-byte buffer"
            ),
            EncodeError::TooManyAttrStrings { count } => write!(
                f,
                "external tag attr list has {count} strings, max is {MAX_EXTERNAL_TAG_ATTR_STRINGS}"
            ),
            EncodeError::Sink(msg) => write!(f, "flush sink failed: {msg}"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Host-side instruction encoder over a fixed-capacity buffer.
///
/// Instructions accumulate until one would overflow, at which point the
/// buffer is End-terminated and handed to the sink (which normally feeds the
/// interpreter), then the write is retried into the emptied buffer. The last
/// byte of the buffer is always reserved for End, so termination never
/// fails. Call [`flush`](Self::flush) when done to deliver the tail.
pub struct InstructionWriter<F> {
    buf: Vec<u8>,
    capacity: usize,
    sink: F,
}

impl<F> InstructionWriter<F>
where
    F: FnMut(&[u8]) -> Result<(), EncodeError>,
{
    /// `capacity` is the full buffer size including the reserved End byte.
    pub fn new(capacity: usize, sink: F) -> Self {
        assert!(capacity >= 16, "instruction buffer capacity too small");
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            sink,
        }
    }

    /// Bytes currently pending in the buffer (excluding the End terminator).
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// End-terminate the buffer and hand it to the sink, even if empty.
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        log::trace!(target: "wire.writer", "flush, {} instruction bytes", self.buf.len());
        self.buf.push(op::END);
        let result = (self.sink)(&self.buf);
        self.buf.clear();
        result
    }

    fn check_len(&self, needed: usize) -> Result<(), EncodeError> {
        // One byte stays reserved for the End terminator.
        if self.buf.len() + needed > self.capacity - 1 {
            return Err(EncodeError::DoesNotFit {
                needed,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn check_len_and_flush(&mut self, needed: usize) -> Result<(), EncodeError> {
        if self.check_len(needed).is_ok() {
            return Ok(());
        }
        self.flush()?;
        self.check_len(needed)
    }

    pub fn write_clear_selected_node(&mut self) -> Result<(), EncodeError> {
        self.write_plain(op::CLEAR_SELECTED_NODE)
    }

    pub fn write_remove_other_attrs(&mut self) -> Result<(), EncodeError> {
        self.write_plain(op::REMOVE_OTHER_ATTRS)
    }

    pub fn write_move_to_first_child(&mut self) -> Result<(), EncodeError> {
        self.write_plain(op::MOVE_TO_FIRST_CHILD)
    }

    pub fn write_move_to_parent(&mut self) -> Result<(), EncodeError> {
        self.write_plain(op::MOVE_TO_PARENT)
    }

    pub fn write_move_to_next_sibling(&mut self) -> Result<(), EncodeError> {
        self.write_plain(op::MOVE_TO_NEXT_SIBLING)
    }

    pub fn write_set_attr(&mut self, name: &str, value: &str) -> Result<(), EncodeError> {
        self.check_len_and_flush(9 + name.len() + value.len())?;
        encode::put_u8(&mut self.buf, op::SET_ATTR);
        encode::put_str(&mut self.buf, name);
        encode::put_str(&mut self.buf, value);
        Ok(())
    }

    pub fn write_set_attr_namespaced(
        &mut self,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), EncodeError> {
        self.check_len_and_flush(13 + namespace.len() + name.len() + value.len())?;
        encode::put_u8(&mut self.buf, op::SET_ATTR_NAMESPACED);
        encode::put_str(&mut self.buf, namespace);
        encode::put_str(&mut self.buf, name);
        encode::put_str(&mut self.buf, value);
        Ok(())
    }

    pub fn write_select_mount_point(
        &mut self,
        selector: &str,
        tag: &str,
    ) -> Result<(), EncodeError> {
        self.check_len_and_flush(9 + selector.len() + tag.len())?;
        encode::put_u8(&mut self.buf, op::SELECT_MOUNT_POINT);
        encode::put_str(&mut self.buf, selector);
        encode::put_str(&mut self.buf, tag);
        Ok(())
    }

    pub fn write_select_by_query(&mut self, selector: &str) -> Result<(), EncodeError> {
        self.check_len_and_flush(5 + selector.len())?;
        encode::put_u8(&mut self.buf, op::SELECT_BY_QUERY);
        encode::put_str(&mut self.buf, selector);
        Ok(())
    }

    pub fn write_set_element(&mut self, tag: &str) -> Result<(), EncodeError> {
        self.check_len_and_flush(5 + tag.len())?;
        encode::put_u8(&mut self.buf, op::SET_ELEMENT);
        encode::put_str(&mut self.buf, tag);
        Ok(())
    }

    pub fn write_set_element_namespaced(
        &mut self,
        tag: &str,
        namespace: &str,
    ) -> Result<(), EncodeError> {
        self.check_len_and_flush(9 + tag.len() + namespace.len())?;
        encode::put_u8(&mut self.buf, op::SET_ELEMENT_NAMESPACED);
        encode::put_str(&mut self.buf, tag);
        encode::put_str(&mut self.buf, namespace);
        Ok(())
    }

    pub fn write_set_text(&mut self, text: &str) -> Result<(), EncodeError> {
        self.check_len_and_flush(5 + text.len())?;
        encode::put_u8(&mut self.buf, op::SET_TEXT);
        encode::put_str(&mut self.buf, text);
        Ok(())
    }

    pub fn write_set_comment(&mut self, text: &str) -> Result<(), EncodeError> {
        self.check_len_and_flush(5 + text.len())?;
        encode::put_u8(&mut self.buf, op::SET_COMMENT);
        encode::put_str(&mut self.buf, text);
        Ok(())
    }

    /// Replace an element's subtree with `markup`. Bodies larger than the
    /// buffer are split at UTF-8 boundaries into BufferInnerMarkup chunks,
    /// each flushed as a full buffer, with SetInnerMarkup carrying the tail.
    pub fn write_set_inner_markup(&mut self, markup: &str) -> Result<(), EncodeError> {
        self.check_len_and_flush(6)?;
        let max_payload = self.capacity - 6;

        let mut remaining = markup;
        while remaining.len() > max_payload.saturating_sub(self.buf.len()) {
            let budget = max_payload.saturating_sub(self.buf.len());
            let split = floor_char_boundary(remaining, budget);
            if split == 0 {
                self.flush()?;
                continue;
            }
            let (chunk, rest) = remaining.split_at(split);
            encode::put_u8(&mut self.buf, op::BUFFER_INNER_MARKUP);
            encode::put_str(&mut self.buf, chunk);
            self.flush()?;
            remaining = rest;
        }

        self.check_len_and_flush(5 + remaining.len())?;
        encode::put_u8(&mut self.buf, op::SET_INNER_MARKUP);
        encode::put_str(&mut self.buf, remaining);
        Ok(())
    }

    pub fn write_set_event_listener(
        &mut self,
        position_id: &str,
        event_type: &str,
        capture: bool,
        passive: bool,
    ) -> Result<(), EncodeError> {
        self.check_len_and_flush(11 + position_id.len() + event_type.len())?;
        encode::put_u8(&mut self.buf, op::SET_EVENT_LISTENER);
        encode::put_str(&mut self.buf, position_id);
        encode::put_str(&mut self.buf, event_type);
        encode::put_u8(&mut self.buf, capture as u8);
        encode::put_u8(&mut self.buf, passive as u8);
        Ok(())
    }

    pub fn write_remove_other_event_listeners(
        &mut self,
        position_id: &str,
    ) -> Result<(), EncodeError> {
        self.check_len_and_flush(5 + position_id.len())?;
        encode::put_u8(&mut self.buf, op::REMOVE_OTHER_EVENT_LISTENERS);
        encode::put_str(&mut self.buf, position_id);
        Ok(())
    }

    pub fn write_set_external_tag(
        &mut self,
        kind: ExternalTagKind,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<(), EncodeError> {
        let strings = attrs.len() * 2;
        if strings > MAX_EXTERNAL_TAG_ATTR_STRINGS {
            return Err(EncodeError::TooManyAttrStrings { count: strings });
        }
        let attrs_len: usize = attrs.iter().map(|(k, v)| k.len() + v.len() + 8).sum();
        self.check_len_and_flush(6 + text.len() + attrs_len)?;
        let opcode = match kind {
            ExternalTagKind::Inline => op::SET_EXTERNAL_INLINE_TAG,
            ExternalTagKind::Linked => op::SET_EXTERNAL_LINKED_TAG,
        };
        encode::put_u8(&mut self.buf, opcode);
        encode::put_str(&mut self.buf, text);
        encode::put_u8(&mut self.buf, strings as u8);
        for (name, value) in attrs {
            encode::put_str(&mut self.buf, name);
            encode::put_str(&mut self.buf, value);
        }
        Ok(())
    }

    pub fn write_remove_other_external_tags(
        &mut self,
        kind: ExternalTagKind,
    ) -> Result<(), EncodeError> {
        let opcode = match kind {
            ExternalTagKind::Inline => op::REMOVE_OTHER_EXTERNAL_INLINE_TAGS,
            ExternalTagKind::Linked => op::REMOVE_OTHER_EXTERNAL_LINKED_TAGS,
        };
        self.write_plain(opcode)
    }

    /// `json` must already be serialized JSON; the interpreter parses it into
    /// a structured value on the other side.
    pub fn write_set_property(&mut self, name: &str, json: &str) -> Result<(), EncodeError> {
        self.check_len_and_flush(9 + name.len() + json.len())?;
        encode::put_u8(&mut self.buf, op::SET_PROPERTY);
        encode::put_str(&mut self.buf, name);
        encode::put_str(&mut self.buf, json);
        Ok(())
    }

    pub fn write_callback(&mut self, id: u32) -> Result<(), EncodeError> {
        self.check_len_and_flush(5)?;
        encode::put_u8(&mut self.buf, op::CALLBACK);
        encode::put_u32(&mut self.buf, id);
        Ok(())
    }

    pub fn write_callback_with_current_node(&mut self, id: u32) -> Result<(), EncodeError> {
        self.check_len_and_flush(5)?;
        encode::put_u8(&mut self.buf, op::CALLBACK_WITH_CURRENT_NODE);
        encode::put_u32(&mut self.buf, id);
        Ok(())
    }

    fn write_plain(&mut self, opcode: u8) -> Result<(), EncodeError> {
        self.check_len_and_flush(1)?;
        encode::put_u8(&mut self.buf, opcode);
        Ok(())
    }
}
