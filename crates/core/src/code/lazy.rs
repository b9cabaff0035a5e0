//! Lazy, string-scan-backed codes.

use std::borrow::Cow;
use std::cell::RefCell;

use super::map::{MapCode, MutableCode};
use super::params::Params;
use super::{Code, ParseMode};
use crate::error::Result;
use crate::escape::{decode_param, encode_param};
use crate::grammar::Span;
use crate::grammar::emit::write_code;
use crate::grammar::iter::{ParamEntries, ParamKeys, ParamValues};
use crate::grammar::token::{Layout, find_raw, frame, has_padded_keys};

/// A validated token kept as text. Every lookup re-scans it.
///
/// Construction only validates the framing, locates the type and counts the
/// parameters. A one-entry cache remembers the last key looked up, so reading
/// the same key twice in a row scans once.
///
/// The cache makes this type `!Sync`: one instance must not be shared across
/// threads. Clone it or convert it with [`Code::to_immutable`] instead.
#[derive(Debug, Clone)]
pub struct LazyCode<'a> {
    /// The token trimmed of surrounding whitespace.
    text: Cow<'a, str>,
    layout: Layout,
    len: usize,
    /// Whether any key is padded with whitespace, which rules out the
    /// literal `,key=` search.
    padded: bool,
    /// Last key looked up and where its raw value lies in `text`.
    last_lookup: RefCell<Option<(String, Option<Span>)>>,
}

impl<'a> LazyCode<'a> {
    /// Wrap a token borrowed from a larger body.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Malformed`](crate::CodeError::Malformed) when the
    /// token lacks its framing or has an unusable type.
    pub fn parse(token: &'a str) -> Result<Self> {
        let (text, layout) = frame(token)?;
        Ok(Self::from_parts(Cow::Borrowed(text), layout))
    }

    /// Borrow the token text as given (trimmed of surrounding whitespace).
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Detach from the borrowed body.
    pub fn into_owned(self) -> LazyCode<'static> {
        LazyCode {
            text: Cow::Owned(self.text.into_owned()),
            layout: self.layout,
            len: self.len,
            padded: self.padded,
            last_lookup: self.last_lookup,
        }
    }

    /// Streaming iterator over the keys, without boxing.
    pub fn param_keys(&self) -> ParamKeys<'_> {
        ParamKeys::from_fields(self.layout.fields(&self.text))
    }

    /// Streaming iterator over the decoded values, without boxing.
    pub fn param_values(&self) -> ParamValues<'_> {
        ParamValues::from_fields(self.layout.fields(&self.text))
    }

    /// Streaming iterator over the decoded entries, without boxing.
    pub fn param_entries(&self) -> ParamEntries<'_> {
        ParamEntries::from_fields(self.layout.fields(&self.text))
    }

    fn from_parts(text: Cow<'a, str>, layout: Layout) -> Self {
        let len = layout.fields(&text).count_distinct();
        let padded = has_padded_keys(&text, &layout);
        Self {
            text,
            layout,
            len,
            padded,
            last_lookup: RefCell::new(None),
        }
    }

    fn raw_span(&self, key: &str) -> Option<Span> {
        if let Some((cached, span)) = self.last_lookup.borrow().as_ref() {
            if cached == key {
                return *span;
            }
        }
        let span = find_raw(&self.text, &self.layout, key, self.padded);
        *self.last_lookup.borrow_mut() = Some((key.to_string(), span));
        span
    }

    fn raw(&self, key: &str) -> Option<&str> {
        self.raw_span(key).map(|s| &self.text[s.start..s.end])
    }
}

impl LazyCode<'static> {
    /// Wrap an owned token.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](LazyCode::parse).
    pub fn from_string(token: String) -> Result<Self> {
        let (text, layout) = frame(&token)?;
        let text = if text.len() == token.len() {
            token
        } else {
            text.to_string()
        };
        Ok(Self::from_parts(Cow::Owned(text), layout))
    }
}

impl Code for LazyCode<'_> {
    fn code_type(&self) -> &str {
        self.layout.code_type(&self.text)
    }

    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        self.raw(key).map(decode_param)
    }

    fn get_raw(&self, key: &str) -> Option<Cow<'_, str>> {
        self.raw(key).map(Cow::Borrowed)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.raw_span(key).is_some()
    }

    fn contains_value(&self, value: &str) -> bool {
        let encoded = encode_param(value);
        let mut fields = self.layout.fields(&self.text);
        while let Some(field) = fields.next_distinct() {
            if field.value == encoded || decode_param(field.value) == value {
                return true;
            }
        }
        false
    }

    fn len(&self) -> usize {
        self.len
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.param_keys())
    }

    fn values(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(self.param_values())
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, Cow<'_, str>)> + '_> {
        Box::new(self.param_entries())
    }

    fn to_mutable(&self) -> MutableCode {
        self.to_immutable().to_mutable()
    }

    fn to_immutable(&self) -> MapCode {
        let mut params = Params::with_capacity(self.len);
        for (key, value) in self.param_entries() {
            params.insert(key.to_string(), value.into_owned());
        }
        MapCode::from_parts(self.code_type(), params, ParseMode::Decode)
    }

    /// Built on every call. [`LazyCode::as_str`] gives the source text.
    fn render(&self) -> Cow<'_, str> {
        let entries: Vec<_> = self.param_entries().collect();
        let mut out = String::with_capacity(self.text.len() + 8);
        write_code(
            &mut out,
            self.code_type(),
            entries.iter().map(|(k, v)| (*k, v.as_ref())),
            true,
        );
        Cow::Owned(out)
    }
}
