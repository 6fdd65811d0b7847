//! Shared helpers for interpreter tests: unbounded instruction-stream
//! building with recorded instruction boundaries, split plans for buffer
//! resumption coverage, and line-diff assertions for snapshot comparisons.

use core_types::ExternalTagKind;
use wire::{encode, op};

/// Builds one logical instruction stream without a buffer limit, recording
/// the byte offset of every instruction so tests can split the stream at
/// any boundary and feed the pieces through separate `apply` calls.
#[derive(Default)]
pub struct StreamBuilder {
    bytes: Vec<u8>,
    boundaries: Vec<usize>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn mark(&mut self) {
        self.boundaries.push(self.bytes.len());
    }

    pub fn clear_selected_node(mut self) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::CLEAR_SELECTED_NODE);
        self
    }

    pub fn select_mount_point(mut self, selector: &str, tag: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SELECT_MOUNT_POINT);
        encode::put_str(&mut self.bytes, selector);
        encode::put_str(&mut self.bytes, tag);
        self
    }

    pub fn select_by_query(mut self, selector: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SELECT_BY_QUERY);
        encode::put_str(&mut self.bytes, selector);
        self
    }

    pub fn move_to_first_child(mut self) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::MOVE_TO_FIRST_CHILD);
        self
    }

    pub fn move_to_next_sibling(mut self) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::MOVE_TO_NEXT_SIBLING);
        self
    }

    pub fn move_to_parent(mut self) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::MOVE_TO_PARENT);
        self
    }

    pub fn set_element(mut self, tag: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SET_ELEMENT);
        encode::put_str(&mut self.bytes, tag);
        self
    }

    pub fn set_element_namespaced(mut self, tag: &str, ns: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SET_ELEMENT_NAMESPACED);
        encode::put_str(&mut self.bytes, tag);
        encode::put_str(&mut self.bytes, ns);
        self
    }

    pub fn set_text(mut self, content: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SET_TEXT);
        encode::put_str(&mut self.bytes, content);
        self
    }

    pub fn set_comment(mut self, content: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SET_COMMENT);
        encode::put_str(&mut self.bytes, content);
        self
    }

    pub fn set_attr(mut self, name: &str, value: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SET_ATTR);
        encode::put_str(&mut self.bytes, name);
        encode::put_str(&mut self.bytes, value);
        self
    }

    pub fn set_attr_namespaced(mut self, ns: &str, name: &str, value: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SET_ATTR_NAMESPACED);
        encode::put_str(&mut self.bytes, ns);
        encode::put_str(&mut self.bytes, name);
        encode::put_str(&mut self.bytes, value);
        self
    }

    pub fn remove_other_attrs(mut self) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::REMOVE_OTHER_ATTRS);
        self
    }

    pub fn set_event_listener(
        mut self,
        position_id: &str,
        event_type: &str,
        capture: bool,
        passive: bool,
    ) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SET_EVENT_LISTENER);
        encode::put_str(&mut self.bytes, position_id);
        encode::put_str(&mut self.bytes, event_type);
        encode::put_u8(&mut self.bytes, capture as u8);
        encode::put_u8(&mut self.bytes, passive as u8);
        self
    }

    pub fn remove_other_event_listeners(mut self, position_id: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::REMOVE_OTHER_EVENT_LISTENERS);
        encode::put_str(&mut self.bytes, position_id);
        self
    }

    pub fn buffer_inner_markup(mut self, chunk: &[u8]) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::BUFFER_INNER_MARKUP);
        encode::put_bytes(&mut self.bytes, chunk);
        self
    }

    pub fn set_inner_markup(mut self, chunk: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SET_INNER_MARKUP);
        encode::put_str(&mut self.bytes, chunk);
        self
    }

    pub fn set_property(mut self, name: &str, json: &str) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::SET_PROPERTY);
        encode::put_str(&mut self.bytes, name);
        encode::put_str(&mut self.bytes, json);
        self
    }

    pub fn set_external_tag(
        mut self,
        kind: ExternalTagKind,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Self {
        self.mark();
        let opcode = match kind {
            ExternalTagKind::Inline => op::SET_EXTERNAL_INLINE_TAG,
            ExternalTagKind::Linked => op::SET_EXTERNAL_LINKED_TAG,
        };
        encode::put_u8(&mut self.bytes, opcode);
        encode::put_str(&mut self.bytes, text);
        encode::put_u8(&mut self.bytes, (attrs.len() * 2) as u8);
        for (name, value) in attrs {
            encode::put_str(&mut self.bytes, name);
            encode::put_str(&mut self.bytes, value);
        }
        self
    }

    pub fn remove_other_external_tags(mut self, kind: ExternalTagKind) -> Self {
        self.mark();
        let opcode = match kind {
            ExternalTagKind::Inline => op::REMOVE_OTHER_EXTERNAL_INLINE_TAGS,
            ExternalTagKind::Linked => op::REMOVE_OTHER_EXTERNAL_LINKED_TAGS,
        };
        encode::put_u8(&mut self.bytes, opcode);
        self
    }

    pub fn callback(mut self, id: u32) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::CALLBACK);
        encode::put_u32(&mut self.bytes, id);
        self
    }

    pub fn callback_with_current_node(mut self, id: u32) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::CALLBACK_WITH_CURRENT_NODE);
        encode::put_u32(&mut self.bytes, id);
        self
    }

    /// Raw opcode byte with no operands; for corruption tests.
    pub fn raw_opcode(mut self, opcode: u8) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, opcode);
        self
    }

    pub fn end(mut self) -> Self {
        self.mark();
        encode::put_u8(&mut self.bytes, op::END);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Instruction start offsets, in order (first is always 0).
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// The stream split in two at every interior instruction boundary.
    /// Feeding both halves sequentially must behave exactly like feeding
    /// the whole stream at once.
    pub fn two_way_splits(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.boundaries
            .iter()
            .copied()
            .filter(|&at| at != 0)
            .map(|at| (self.bytes[..at].to_vec(), self.bytes[at..].to_vec()))
            .collect()
    }

    /// One buffer per instruction.
    pub fn per_instruction_buffers(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        let mut starts = self.boundaries.clone();
        starts.push(self.bytes.len());
        for pair in starts.windows(2) {
            out.push(self.bytes[pair[0]..pair[1]].to_vec());
        }
        out
    }
}

/// Render the first mismatch between two line vectors with context, or an
/// empty string when they are equal.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;
    let max = expected.len().max(actual.len());
    let missing = "<missing>";
    let mut out = String::new();

    let mismatch = (0..max).find(|&i| {
        expected.get(i).map(String::as_str).unwrap_or(missing)
            != actual.get(i).map(String::as_str).unwrap_or(missing)
    });
    let Some(at) = mismatch else {
        return out;
    };

    let start = at.saturating_sub(2);
    let end = (at + 3).min(max);
    let _ = writeln!(&mut out, "first mismatch at line {}:", at + 1);
    for i in start..end {
        let left = expected.get(i).map(String::as_str).unwrap_or(missing);
        let right = actual.get(i).map(String::as_str).unwrap_or(missing);
        let marker = if i == at { ">" } else { " " };
        let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", i + 1);
        let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", i + 1);
    }
    out
}

/// Panic with a focused diff when two snapshots differ.
pub fn assert_lines_eq(expected: &[String], actual: &[String], context: &str) {
    let diff = diff_lines(expected, actual);
    if !diff.is_empty() {
        panic!("{context}:\n{diff}");
    }
    assert_eq!(
        expected.len(),
        actual.len(),
        "{context}: line counts differ"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_track_instruction_starts() {
        let b = StreamBuilder::new()
            .select_mount_point("#app", "div")
            .move_to_first_child()
            .set_element("span")
            .end();
        let bounds = b.boundaries().to_vec();
        assert_eq!(bounds.len(), 4);
        assert_eq!(bounds[0], 0);
        let stream = b.finish();
        assert_eq!(*stream.last().unwrap(), op::END);
    }

    #[test]
    fn two_way_splits_cover_every_interior_boundary() {
        let b = StreamBuilder::new()
            .move_to_first_child()
            .set_element("i")
            .end();
        let splits = b.two_way_splits();
        assert_eq!(splits.len(), 2);
        let full = b.finish();
        for (a, z) in splits {
            let mut joined = a.clone();
            joined.extend_from_slice(&z);
            assert_eq!(joined, full);
        }
    }

    #[test]
    fn diff_lines_pinpoints_first_difference() {
        let expected = vec!["a".to_string(), "b".to_string()];
        let actual = vec!["a".to_string(), "x".to_string()];
        let diff = diff_lines(&expected, &actual);
        assert!(diff.contains("first mismatch at line 2"));
        assert!(diff_lines(&expected, &expected).is_empty());
    }
}
