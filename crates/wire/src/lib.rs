//! Binary instruction wire format.
//!
//! One instruction stream is a sequence of opcodes with operands, written
//! into fixed-capacity buffers. All multi-byte integers are big-endian;
//! strings are a u32 length prefix followed by UTF-8 bytes. A stream larger
//! than one buffer is split at instruction boundaries: every flushed buffer
//! is End-terminated and the interpreter's persistent state carries the rest.

pub mod encode;
pub mod op;
mod reader;
mod writer;

pub use reader::{DecodeError, Reader};
pub use writer::{EncodeError, InstructionWriter};

/// Default instruction buffer capacity shared with hosts.
pub const INSTRUCTION_BUFFER_CAPACITY: usize = 16384;
