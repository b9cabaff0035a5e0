//! Streaming iterators over the parameters of a single token.
//!
//! These walk the raw token text with a private cursor and never build an
//! intermediate collection. Each is single-pass: request a fresh iterator to
//! traverse again. Order is left-to-right occurrence in the source text; a
//! key repeated within the token is yielded once, at its last occurrence.
//!
//! Besides the standard [`Iterator`] protocol, each offers [`has_next`] and a
//! [`try_next`] that reports [`CodeError::IteratorExhausted`] instead of
//! returning `None`.
//!
//! [`has_next`]: ParamKeys::has_next
//! [`try_next`]: ParamKeys::try_next

use std::borrow::Cow;
use std::iter::FusedIterator;

use super::token::{RawFields, frame};
use crate::error::{CodeError, Result};
use crate::escape::decode_param;

/// Keys of a token, in occurrence order.
#[derive(Debug, Clone)]
pub struct ParamKeys<'a> {
    fields: RawFields<'a>,
}

impl<'a> ParamKeys<'a> {
    /// Iterate the keys of `token`, which must be a well-framed code.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Malformed`] if `token` lacks the head or terminator.
    pub fn new(token: &'a str) -> Result<Self> {
        let (text, layout) = frame(token)?;
        Ok(Self::from_fields(layout.fields(text)))
    }

    pub(crate) fn from_fields(fields: RawFields<'a>) -> Self {
        Self { fields }
    }

    /// Whether another key lies ahead of the cursor.
    pub fn has_next(&self) -> bool {
        self.fields.clone().next_distinct().is_some()
    }

    /// Advance, failing once the keys are exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::IteratorExhausted`] when [`has_next`](Self::has_next) is `false`.
    pub fn try_next(&mut self) -> Result<&'a str> {
        self.next().ok_or(CodeError::IteratorExhausted)
    }
}

impl<'a> Iterator for ParamKeys<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.fields.next_distinct().map(|p| p.key)
    }
}

impl FusedIterator for ParamKeys<'_> {}

/// Decoded values of a token, in occurrence order.
#[derive(Debug, Clone)]
pub struct ParamValues<'a> {
    fields: RawFields<'a>,
}

impl<'a> ParamValues<'a> {
    /// Iterate the decoded values of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Malformed`] if `token` lacks the head or terminator.
    pub fn new(token: &'a str) -> Result<Self> {
        let (text, layout) = frame(token)?;
        Ok(Self::from_fields(layout.fields(text)))
    }

    pub(crate) fn from_fields(fields: RawFields<'a>) -> Self {
        Self { fields }
    }

    /// Whether another value lies ahead of the cursor.
    pub fn has_next(&self) -> bool {
        self.fields.clone().next_distinct().is_some()
    }

    /// Advance, failing once the values are exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::IteratorExhausted`] when [`has_next`](Self::has_next) is `false`.
    pub fn try_next(&mut self) -> Result<Cow<'a, str>> {
        self.next().ok_or(CodeError::IteratorExhausted)
    }
}

impl<'a> Iterator for ParamValues<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Cow<'a, str>> {
        self.fields.next_distinct().map(|p| decode_param(p.value))
    }
}

impl FusedIterator for ParamValues<'_> {}

/// Decoded `(key, value)` pairs of a token, in occurrence order.
#[derive(Debug, Clone)]
pub struct ParamEntries<'a> {
    fields: RawFields<'a>,
}

impl<'a> ParamEntries<'a> {
    /// Iterate the decoded entries of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Malformed`] if `token` lacks the head or terminator.
    pub fn new(token: &'a str) -> Result<Self> {
        let (text, layout) = frame(token)?;
        Ok(Self::from_fields(layout.fields(text)))
    }

    pub(crate) fn from_fields(fields: RawFields<'a>) -> Self {
        Self { fields }
    }

    /// Whether another entry lies ahead of the cursor.
    pub fn has_next(&self) -> bool {
        self.fields.clone().next_distinct().is_some()
    }

    /// Advance, failing once the entries are exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::IteratorExhausted`] when [`has_next`](Self::has_next) is `false`.
    pub fn try_next(&mut self) -> Result<(&'a str, Cow<'a, str>)> {
        self.next().ok_or(CodeError::IteratorExhausted)
    }
}

impl<'a> Iterator for ParamEntries<'a> {
    type Item = (&'a str, Cow<'a, str>);

    fn next(&mut self) -> Option<(&'a str, Cow<'a, str>)> {
        self.fields.next_distinct().map(|p| (p.key, decode_param(p.value)))
    }
}

impl FusedIterator for ParamEntries<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "[CQ:image,file=a&#44;b.jpg,destruct=true,cache=]";

    #[test]
    fn keys_in_order() {
        let keys: Vec<&str> = ParamKeys::new(TOKEN).unwrap().collect();
        assert_eq!(keys, ["file", "destruct", "cache"]);
    }

    #[test]
    fn values_are_decoded() {
        let values: Vec<Cow<'_, str>> = ParamValues::new(TOKEN).unwrap().collect();
        assert_eq!(values, ["a,b.jpg", "true", ""]);
    }

    #[test]
    fn entries_pair_keys_with_decoded_values() {
        let mut it = ParamEntries::new(TOKEN).unwrap();
        assert_eq!(it.next(), Some(("file", Cow::Borrowed("a,b.jpg"))));
        assert_eq!(it.next(), Some(("destruct", Cow::Borrowed("true"))));
        assert_eq!(it.next(), Some(("cache", Cow::Borrowed(""))));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn has_next_and_exhaustion() {
        let mut it = ParamKeys::new("[CQ:at,qq=1]").unwrap();
        assert!(it.has_next());
        assert!(it.has_next(), "has_next must not advance");
        assert_eq!(it.try_next(), Ok("qq"));
        assert!(!it.has_next());
        assert_eq!(it.try_next(), Err(CodeError::IteratorExhausted));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn no_params_means_nothing_to_iterate() {
        assert!(!ParamEntries::new("[CQ:shake]").unwrap().has_next());
        assert_eq!(
            ParamValues::new("[CQ:shake]").unwrap().try_next(),
            Err(CodeError::IteratorExhausted)
        );
    }

    #[test]
    fn iterators_are_independent() {
        let mut a = ParamKeys::new(TOKEN).unwrap();
        let b = ParamKeys::new(TOKEN).unwrap();
        a.next();
        assert_eq!(a.count(), 2);
        assert_eq!(b.count(), 3);
    }

    #[test]
    fn repeated_key_yields_last_occurrence() {
        let entries: Vec<_> = ParamEntries::new("[CQ:a,k=1,j=2,k=3]").unwrap().collect();
        assert_eq!(entries, [("j", Cow::Borrowed("2")), ("k", Cow::Borrowed("3"))]);
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(ParamKeys::new("[CQ:at,qq=1").is_err());
        assert!(ParamValues::new("at,qq=1]").is_err());
        assert!(ParamEntries::new("").is_err());
    }
}
