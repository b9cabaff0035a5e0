//! Eager, map-backed codes.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use super::params::Params;
use super::{Code, ParseMode};
use crate::error::Result;
use crate::escape::{decode_param, encode_param};
use crate::grammar::emit::write_code;
use crate::grammar::token::frame;
use crate::grammar::{check_key, check_type};

/// An immutable code whose parameters were parsed into a key-indexed store.
///
/// Clones share the store. The canonical rendering is computed on first use
/// and cached.
#[derive(Debug, Clone)]
pub struct MapCode {
    code_type: Arc<str>,
    params: Arc<Params>,
    mode: ParseMode,
    /// Source text of values whose escaping differs from the canonical
    /// encoding. Only set by decoding parses.
    raw_overrides: Option<Arc<Params>>,
    rendered: OnceLock<String>,
}

impl MapCode {
    /// Parse a token, decoding every value once.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Malformed`](crate::CodeError::Malformed) when the
    /// token lacks its framing or has an unusable type.
    pub fn parse(token: &str) -> Result<Self> {
        Self::parse_with(token, ParseMode::Decode)
    }

    /// Parse a token in the given mode.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn parse_with(token: &str, mode: ParseMode) -> Result<Self> {
        let (text, layout) = frame(token)?;
        let mut params = Params::default();
        let mut overrides = Params::default();
        for field in layout.fields(text) {
            let value = match mode {
                ParseMode::Decode => {
                    let decoded = decode_param(field.value).into_owned();
                    if encode_param(&decoded) == field.value {
                        overrides.remove(field.key);
                    } else {
                        overrides.push_last(field.key.to_string(), field.value.to_string());
                    }
                    decoded
                }
                ParseMode::Raw => field.value.to_string(),
            };
            params.push_last(field.key.to_string(), value);
        }
        let mut code = Self::from_parts(layout.code_type(text), params, mode);
        if overrides.len() > 0 {
            code.raw_overrides = Some(Arc::new(overrides));
        }
        Ok(code)
    }

    /// Assemble a code from a type and decoded `(key, value)` pairs.
    ///
    /// A repeated key keeps its first position and its last value.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::InvalidType`](crate::CodeError::InvalidType) or
    /// [`CodeError::InvalidKey`](crate::CodeError::InvalidKey) when a name
    /// contains `,`, `=` or `]` or is padded with whitespace.
    pub fn new<I, K, V>(code_type: &str, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        check_type(code_type)?;
        let pairs = pairs.into_iter();
        let mut params = Params::with_capacity(pairs.size_hint().0);
        for (key, value) in pairs {
            let key = key.into();
            check_key(&key)?;
            params.insert(key, value.into());
        }
        Ok(Self::from_parts(code_type, params, ParseMode::Decode))
    }

    /// A code with no parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::InvalidType`](crate::CodeError::InvalidType) for
    /// an unusable type.
    pub fn empty(code_type: &str) -> Result<Self> {
        Self::new(code_type, std::iter::empty::<(String, String)>())
    }

    /// Assemble a code whose type and keys are string literals.
    ///
    /// Names are trusted rather than checked, so this cannot fail; values are
    /// decoded text and may be anything. Debug builds assert that every name
    /// would pass [`check_type`] / [`check_key`].
    pub fn from_static<I, V>(code_type: &'static str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<String>,
    {
        debug_assert!(check_type(code_type).is_ok(), "invalid code type {code_type:?}");
        let pairs = pairs.into_iter();
        let mut params = Params::with_capacity(pairs.size_hint().0);
        for (key, value) in pairs {
            debug_assert!(check_key(key).is_ok(), "invalid parameter key {key:?}");
            params.insert(key.to_string(), value.into());
        }
        Self::from_parts(code_type, params, ParseMode::Decode)
    }

    pub(super) fn from_parts(code_type: &str, params: Params, mode: ParseMode) -> Self {
        Self {
            code_type: Arc::from(code_type),
            params: Arc::new(params),
            mode,
            raw_overrides: None,
            rendered: OnceLock::new(),
        }
    }

    /// How the stored values are held.
    pub fn parse_mode(&self) -> ParseMode {
        self.mode
    }

    fn decoded<'s>(&self, stored: &'s str) -> Cow<'s, str> {
        match self.mode {
            ParseMode::Decode => Cow::Borrowed(stored),
            ParseMode::Raw => decode_param(stored),
        }
    }

    fn decoded_params(&self) -> Params {
        match self.mode {
            ParseMode::Decode => Params::clone(&self.params),
            ParseMode::Raw => {
                let mut params = Params::with_capacity(self.params.len());
                for (key, value) in self.params.iter() {
                    params.insert(key.to_string(), decode_param(value).into_owned());
                }
                params
            }
        }
    }
}

impl Code for MapCode {
    fn code_type(&self) -> &str {
        &self.code_type
    }

    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        self.params.get(key).map(|v| self.decoded(v))
    }

    fn get_raw(&self, key: &str) -> Option<Cow<'_, str>> {
        let stored = self.params.get(key)?;
        if let Some(raw) = self.raw_overrides.as_ref().and_then(|o| o.get(key)) {
            return Some(Cow::Borrowed(raw));
        }
        Some(match self.mode {
            ParseMode::Decode => encode_param(stored),
            ParseMode::Raw => Cow::Borrowed(stored),
        })
    }

    fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    fn contains_value(&self, value: &str) -> bool {
        self.params.iter().any(|(_, v)| self.decoded(v) == value)
    }

    fn len(&self) -> usize {
        self.params.len()
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.params.iter().map(|(k, _)| k))
    }

    fn values(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(self.params.iter().map(|(_, v)| self.decoded(v)))
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, Cow<'_, str>)> + '_> {
        Box::new(self.params.iter().map(|(k, v)| (k, self.decoded(v))))
    }

    fn to_mutable(&self) -> MutableCode {
        MutableCode {
            code_type: self.code_type.to_string(),
            params: self.decoded_params(),
        }
    }

    fn to_immutable(&self) -> MapCode {
        self.clone()
    }

    fn render(&self) -> Cow<'_, str> {
        let text = self.rendered.get_or_init(|| {
            let mut out = String::new();
            match self.mode {
                ParseMode::Decode => {
                    write_code(&mut out, &self.code_type, self.params.iter(), true);
                }
                ParseMode::Raw => {
                    let entries: Vec<_> = self.entries().collect();
                    let pairs = entries.iter().map(|(k, v)| (*k, v.as_ref()));
                    write_code(&mut out, &self.code_type, pairs, true);
                }
            }
            out
        });
        Cow::Borrowed(text)
    }
}

/// An editable code. The type is fixed; parameters may be inserted and
/// removed in place. Values are held decoded.
///
/// Not meant for concurrent mutation: wrap it in a lock to share it.
#[derive(Debug, Clone)]
pub struct MutableCode {
    code_type: String,
    params: Params,
}

impl MutableCode {
    /// An empty editable code of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::InvalidType`](crate::CodeError::InvalidType) for
    /// an unusable type.
    pub fn new(code_type: &str) -> Result<Self> {
        check_type(code_type)?;
        Ok(Self {
            code_type: code_type.to_string(),
            params: Params::default(),
        })
    }

    /// Set `key` to the decoded `value`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::InvalidKey`](crate::CodeError::InvalidKey) when
    /// the key contains `,`, `=` or `]` or is padded with whitespace.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>> {
        let key = key.into();
        check_key(&key)?;
        Ok(self.params.insert(key, value.into()))
    }

    /// Remove `key`, returning its decoded value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.params.remove(key)
    }

    /// Remove every parameter.
    pub fn clear(&mut self) {
        self.params.clear();
    }

    /// An immutable copy of the current parameters. Later edits to `self`
    /// do not affect it.
    pub fn snapshot(&self) -> MapCode {
        MapCode::from_parts(&self.code_type, self.params.clone(), ParseMode::Decode)
    }

    /// Freeze into an immutable code without copying the parameters.
    pub fn into_immutable(self) -> MapCode {
        MapCode::from_parts(&self.code_type, self.params, ParseMode::Decode)
    }
}

impl Code for MutableCode {
    fn code_type(&self) -> &str {
        &self.code_type
    }

    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        self.params.get(key).map(Cow::Borrowed)
    }

    fn get_raw(&self, key: &str) -> Option<Cow<'_, str>> {
        self.params.get(key).map(encode_param)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    fn contains_value(&self, value: &str) -> bool {
        self.params.iter().any(|(_, v)| v == value)
    }

    fn len(&self) -> usize {
        self.params.len()
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.params.iter().map(|(k, _)| k))
    }

    fn values(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_> {
        Box::new(self.params.iter().map(|(_, v)| Cow::Borrowed(v)))
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, Cow<'_, str>)> + '_> {
        Box::new(self.params.iter().map(|(k, v)| (k, Cow::Borrowed(v))))
    }

    fn to_mutable(&self) -> MutableCode {
        self.clone()
    }

    fn to_immutable(&self) -> MapCode {
        self.snapshot()
    }

    fn render(&self) -> Cow<'_, str> {
        let mut out = String::new();
        write_code(&mut out, &self.code_type, self.params.iter(), true);
        Cow::Owned(out)
    }
}
