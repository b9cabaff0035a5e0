//! Code grammar: framing constants, token layout, scanning, parameter
//! iteration, and rendering.
//!
//! ```text
//! token := HEAD type (SEP key KV value)* END
//! HEAD  := "[CQ:"   END := "]"   SEP := ","   KV := "="
//! ```

/// Code rendering back to text.
pub mod emit;
/// Cursor iterators over one token's parameter list.
pub mod iter;
/// Message-body scanning: locate, split, strip.
pub mod scan;
/// Token framing and the parameter field rules shared by all codecs.
pub mod token;

use serde::{Deserialize, Serialize};

/// Opening marker of every code.
pub const CODE_HEAD: &str = "[CQ:";
/// Closing marker of every code.
pub const CODE_END: char = ']';
/// Separator between the type and each parameter.
pub const CODE_SEP: char = ',';
/// Separator between a parameter key and its value.
pub const CODE_KV: char = '=';

/// Byte span in a source string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers nothing.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub use token::{check_key, check_type};
