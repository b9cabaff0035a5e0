//! kqcode core library.
//!
//! Escaping, parsing, scanning, and rendering of `[CQ:type,key=value,...]`
//! tagged codes embedded in chat message text. The main entry points are
//! [`parse_code`] and [`LazyCode::parse`] for single tokens, the scanner
//! functions ([`locate`], [`split`], [`strip`], [`param_of`]) for whole
//! message bodies, and [`render_code`] for output.
//!
//! Nothing here performs I/O or holds global mutable state. The library emits
//! `tracing` events but never installs a subscriber.

#![warn(missing_docs)]

/// The code entity and its eager, mutable, and lazy representations.
pub mod code;
/// JSON projection of codes and message bodies.
pub mod dump;
/// Error types.
pub mod error;
/// Entity escaping for text and parameter values.
pub mod escape;
/// Code grammar: framing, scanning, parameter iteration, and rendering.
pub mod grammar;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Code entity
pub use code::consts;
pub use code::{
    Code, LazyCode, MapCode, MutableCode, ParseMode, Representation, parse_all, parse_at,
    parse_code, parse_code_with,
};

// Errors
pub use error::{CodeError, MalformedReason, Result};

// Escaping
pub use escape::{EscapeContext, decode_param, decode_text, encode_param, encode_text};

// Grammar
pub use grammar::emit::{render_code, render_code_raw};
pub use grammar::iter::{ParamEntries, ParamKeys, ParamValues};
pub use grammar::scan::{
    Segment, SegmentKind, Segments, StripOptions, Tokens, locate, locate_all, param_of, segments,
    split, strip, tokens,
};
pub use grammar::{CODE_END, CODE_HEAD, CODE_KV, CODE_SEP, Span, check_key, check_type};

// Serialization helpers
pub use dump::{code_to_json, segments_to_json, to_pretty_json};
