//! Incremental UTF-8 decoding for byte streams split at arbitrary positions.
//!
//! Multi-byte characters may straddle chunk boundaries; an incomplete suffix
//! is carried until the next chunk arrives. Invalid sequences always make
//! forward progress by emitting U+FFFD.

/// Accumulates text from byte chunks whose boundaries need not respect UTF-8
/// character boundaries.
#[derive(Debug, Default)]
pub struct Utf8Accumulator {
    text: String,
    carry: Vec<u8>,
}

impl Utf8Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.carry.is_empty()
    }

    /// Append a chunk, resolving any carried incomplete sequence first.
    pub fn push(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        if self.carry.is_empty() {
            decode_into(&mut self.text, &mut self.carry, bytes);
            return;
        }

        // The carry is an incomplete suffix (at most 3 bytes). Complete it
        // with a prefix of this chunk, then decode the rest directly.
        let mut remaining = bytes;
        while !self.carry.is_empty() && !remaining.is_empty() {
            let expected = seq_len(self.carry[0]);
            if expected == 0 {
                self.text.push('\u{FFFD}');
                self.carry.clear();
                break;
            }

            let needed = expected.saturating_sub(self.carry.len());
            if needed == 0 {
                let held = std::mem::take(&mut self.carry);
                decode_into(&mut self.text, &mut self.carry, &held);
                continue;
            }

            if remaining.len() < needed {
                self.carry.extend_from_slice(remaining);
                return;
            }

            let mut scratch = [0u8; 8];
            let held = self.carry.len();
            scratch[..held].copy_from_slice(&self.carry);
            scratch[held..held + needed].copy_from_slice(&remaining[..needed]);
            self.carry.clear();
            decode_into(&mut self.text, &mut self.carry, &scratch[..held + needed]);
            remaining = &remaining[needed..];
        }

        if !remaining.is_empty() {
            decode_into(&mut self.text, &mut self.carry, remaining);
        }
    }

    /// Flush any carried bytes (lossy) and return the accumulated text,
    /// leaving the accumulator empty.
    pub fn finish(&mut self) -> String {
        if !self.carry.is_empty() {
            let held = std::mem::take(&mut self.carry);
            self.text.push_str(&String::from_utf8_lossy(&held));
        }
        std::mem::take(&mut self.text)
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.carry.clear();
    }
}

/// Largest index `<= at` that lands on a char boundary of `s`.
pub fn floor_char_boundary(s: &str, at: usize) -> usize {
    if at >= s.len() {
        return s.len();
    }
    let mut i = at;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn seq_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_into(text: &mut String, carry: &mut Vec<u8>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                text.push_str(s);
                break;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                if valid > 0 {
                    text.push_str(std::str::from_utf8(&bytes[..valid]).expect("valid UTF-8 prefix"));
                }
                match e.error_len() {
                    Some(len) => {
                        text.push('\u{FFFD}');
                        bytes = &bytes[valid + len..];
                    }
                    None => {
                        carry.extend_from_slice(&bytes[valid..]);
                        break;
                    }
                }
            }
        }
    }
}
