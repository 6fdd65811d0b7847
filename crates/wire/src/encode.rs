//! Operand encoding primitives, shared by the instruction writer and test
//! stream builders.

pub fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

pub fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Two big-endian u32 words; the reader surfaces these as a hex string.
pub fn put_ref(buf: &mut Vec<u8>, v: u64) {
    put_u32(buf, (v >> 32) as u32);
    put_u32(buf, v as u32);
}

pub fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    put_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

pub fn put_str(buf: &mut Vec<u8>, s: &str) {
    put_bytes(buf, s.as_bytes());
}
