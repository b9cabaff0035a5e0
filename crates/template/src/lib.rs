//! Template helpers and builders for well-known codes.
//!
//! [`CodeTemplate`] has one method per well-known tag type (mention, face,
//! image, music, share, …). [`StringTemplate`] renders token text directly;
//! [`CodeValueTemplate`] returns [`MapCode`] values. Both produce
//! structurally equal results and escape every value.
//!
//! [`CodeBuilder`] assembles arbitrary codes one parameter at a time with a
//! `key(..).value(..)` chain.
//!
//! [`MapCode`]: kqcode_core::MapCode

#![warn(missing_docs)]

/// Incremental code builders.
pub mod builder;
/// Per-tag template methods.
pub mod template;

pub use builder::{CodeBuilder, CodeBuilderKey, MapCodeBuilder, StringCodeBuilder};
pub use template::{CodeTemplate, CodeValueTemplate, StringTemplate};
