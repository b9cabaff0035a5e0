//! Fluent `key(..).value(..)` assembly of a single code.
//!
//! ```
//! use kqcode_template::{CodeBuilder, StringCodeBuilder};
//!
//! let token = StringCodeBuilder::new("image")
//!     .key("file").value("a,b.jpg")
//!     .key("destruct").value(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(token, "[CQ:image,file=a&#44;b.jpg,destruct=false]");
//! ```
//!
//! Names are validated as they are added, but the first failure is only
//! reported by [`CodeBuilder::build`] so chains stay unbroken.

use std::fmt::Display;

use kqcode_core::{
    CODE_END, CODE_HEAD, CODE_KV, CODE_SEP, CodeError, MapCode, Result, check_key, check_type,
    encode_param,
};

/// Accumulates parameters and produces one code.
pub trait CodeBuilder: Sized {
    /// The built form: token text or a code value.
    type Output;

    /// Append one parameter with its decoded value.
    fn push_param(&mut self, key: &str, value: &str);

    /// Finish the code.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::InvalidType`] or [`CodeError::InvalidKey`] for
    /// the first unusable name given to this builder.
    fn build(self) -> Result<Self::Output>;

    /// Name the next parameter. Complete it with [`CodeBuilderKey::value`].
    fn key(self, key: impl Into<String>) -> CodeBuilderKey<Self> {
        CodeBuilderKey {
            builder: self,
            key: key.into(),
        }
    }
}

/// A builder waiting for the value of a named parameter.
#[derive(Debug)]
#[must_use = "a key without a value is dropped along with the builder"]
pub struct CodeBuilderKey<B> {
    builder: B,
    key: String,
}

impl<B: CodeBuilder> CodeBuilderKey<B> {
    /// Set the value, given in decoded form, and return the builder.
    pub fn value(mut self, value: impl Display) -> B {
        self.builder.push_param(&self.key, &value.to_string());
        self.builder
    }

    /// Set an empty value: `key=`.
    pub fn empty_value(mut self) -> B {
        self.builder.push_param(&self.key, "");
        self.builder
    }
}

/// Appends straight into token text.
///
/// Parameters are written in call order; a repeated key is written twice.
#[derive(Debug, Clone)]
pub struct StringCodeBuilder {
    out: String,
    encode: bool,
    error: Option<CodeError>,
}

impl StringCodeBuilder {
    /// Builder for `code_type` that parameter-escapes every value.
    pub fn new(code_type: &str) -> Self {
        Self::with_encode(code_type, true)
    }

    /// Builder for `code_type`. With `encode` off, values are written as
    /// given and must already be parameter-escaped.
    pub fn with_encode(code_type: &str, encode: bool) -> Self {
        let mut out = String::with_capacity(CODE_HEAD.len() + code_type.len() + 16);
        out.push_str(CODE_HEAD);
        out.push_str(code_type);
        Self {
            out,
            encode,
            error: check_type(code_type).err(),
        }
    }
}

impl CodeBuilder for StringCodeBuilder {
    type Output = String;

    fn push_param(&mut self, key: &str, value: &str) {
        if self.error.is_none() {
            self.error = check_key(key).err();
            if self.error.is_some() {
                tracing::debug!(key, "builder got an unusable key");
            }
        }
        self.out.push(CODE_SEP);
        self.out.push_str(key);
        self.out.push(CODE_KV);
        if self.encode {
            self.out.push_str(&encode_param(value));
        } else {
            self.out.push_str(value);
        }
    }

    fn build(mut self) -> Result<String> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.out.push(CODE_END);
        Ok(self.out)
    }
}

/// Collects parameters and assembles a [`MapCode`].
///
/// A repeated key keeps its first position and its last value.
#[derive(Debug, Clone)]
pub struct MapCodeBuilder {
    code_type: String,
    params: Vec<(String, String)>,
}

impl MapCodeBuilder {
    /// Builder for `code_type`.
    pub fn new(code_type: impl Into<String>) -> Self {
        Self {
            code_type: code_type.into(),
            params: Vec::new(),
        }
    }
}

impl CodeBuilder for MapCodeBuilder {
    type Output = MapCode;

    fn push_param(&mut self, key: &str, value: &str) {
        self.params.push((key.to_string(), value.to_string()));
    }

    fn build(self) -> Result<MapCode> {
        MapCode::new(&self.code_type, self.params)
    }
}
