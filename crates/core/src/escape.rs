//! Entity escaping for text embedded in or around codes.
//!
//! Two contexts exist. Free text (outside any code) escapes `&`, `[`, `]`,
//! tab, CR and LF. Parameter values additionally escape the `,` separator,
//! which would otherwise start a new parameter.
//!
//! | char | entity  |
//! |------|---------|
//! | `&`  | `&amp;` |
//! | `[`  | `&#91;` |
//! | `]`  | `&#93;` |
//! | `,`  | `&#44;` (parameter context only) |
//! | tab  | `&#09;` |
//! | CR   | `&#10;` |
//! | LF   | `&#13;` |
//!
//! Both directions run in a single left-to-right pass and borrow the input
//! when nothing needs replacing.

use std::borrow::Cow;

/// Which substitution table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EscapeContext {
    /// Message text outside any code.
    #[default]
    Text,
    /// A `key=value` parameter value inside a code.
    Param,
}

const AMP: &str = "&amp;";

/// Entity table in decode priority order. `&amp;` is always matched as a
/// whole entity so that an escaped ampersand never feeds a second lookup.
const ENTITIES: [(&str, char); 7] = [
    ("&#91;", '['),
    ("&#93;", ']'),
    ("&#44;", ','),
    ("&#09;", '\t'),
    ("&#10;", '\r'),
    ("&#13;", '\n'),
    (AMP, '&'),
];

fn entity_for(c: char, ctx: EscapeContext) -> Option<&'static str> {
    match c {
        '&' => Some(AMP),
        '[' => Some("&#91;"),
        ']' => Some("&#93;"),
        ',' if ctx == EscapeContext::Param => Some("&#44;"),
        '\t' => Some("&#09;"),
        '\r' => Some("&#10;"),
        '\n' => Some("&#13;"),
        _ => None,
    }
}

/// Match an entity at the start of `s`, returning the decoded char and the
/// entity length in bytes.
fn entity_at(s: &str, ctx: EscapeContext) -> Option<(char, usize)> {
    ENTITIES
        .iter()
        .filter(|(_, c)| ctx == EscapeContext::Param || *c != ',')
        .find(|(entity, _)| s.starts_with(entity))
        .map(|(entity, c)| (*c, entity.len()))
}

/// Escape `input` for the given context.
pub fn encode(input: &str, ctx: EscapeContext) -> Cow<'_, str> {
    let Some(first) = input.find(|c| entity_for(c, ctx).is_some()) else {
        return Cow::Borrowed(input);
    };
    let mut out = String::with_capacity(input.len() + 8);
    out.push_str(&input[..first]);
    for c in input[first..].chars() {
        match entity_for(c, ctx) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Reverse [`encode`] for the given context.
///
/// Unknown `&...;` sequences and stray `&` characters are copied through.
pub fn decode(input: &str, ctx: EscapeContext) -> Cow<'_, str> {
    let Some(first) = input.find('&') else {
        return Cow::Borrowed(input);
    };
    let mut out = String::with_capacity(input.len());
    out.push_str(&input[..first]);
    let mut rest = &input[first..];
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        match entity_at(rest, ctx) {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Escape free message text.
pub fn encode_text(input: &str) -> Cow<'_, str> {
    encode(input, EscapeContext::Text)
}

/// Unescape free message text.
pub fn decode_text(input: &str) -> Cow<'_, str> {
    decode(input, EscapeContext::Text)
}

/// Escape a parameter value.
pub fn encode_param(input: &str) -> Cow<'_, str> {
    encode(input, EscapeContext::Param)
}

/// Unescape a parameter value.
pub fn decode_param(input: &str) -> Cow<'_, str> {
    decode(input, EscapeContext::Param)
}
