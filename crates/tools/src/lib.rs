pub mod utf8;

pub use utf8::{Utf8Accumulator, floor_char_boundary};
