//! Token framing and parameter field rules.
//!
//! Every codec (eager, lazy, the cursor iterators and the scanner's
//! `param_of`) reads parameters through [`RawFields`], so they all agree on
//! where a key or value starts and ends:
//!
//! - the body between `[CQ:` and the final `]` is split on `,`;
//! - the first field is the type, trimmed of ASCII whitespace;
//! - every later field splits on its first `=`; the key is trimmed of ASCII
//!   whitespace, the value is kept verbatim (still encoded);
//! - fields without `=` (including empty fields from `,,`) carry no
//!   parameter and are skipped;
//! - a key repeated within one token counts once, at its last occurrence,
//!   with its last value.

use super::{CODE_END, CODE_HEAD, CODE_KV, CODE_SEP, Span};
use crate::error::{CodeError, MalformedReason, Result};

/// Byte offsets describing a validated token. Offsets index the trimmed text
/// returned alongside it by [`frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) type_start: usize,
    pub(crate) type_end: usize,
    /// Offset of the first `,`, or of the terminator when there is none.
    pub(crate) params_start: usize,
    /// Offset of the terminator.
    pub(crate) end: usize,
}

impl Layout {
    pub(crate) fn code_type<'t>(&self, text: &'t str) -> &'t str {
        &text[self.type_start..self.type_end]
    }

    pub(crate) fn fields<'t>(&self, text: &'t str) -> RawFields<'t> {
        RawFields {
            text,
            pos: self.params_start,
            end: self.end,
        }
    }
}

/// Validate framing and locate the type. Returns the token trimmed of
/// surrounding whitespace together with its layout.
pub(crate) fn frame(token: &str) -> Result<(&str, Layout)> {
    let text = token.trim();
    if !text.starts_with(CODE_HEAD) {
        return Err(CodeError::malformed(token, MalformedReason::MissingHead));
    }
    if text.len() <= CODE_HEAD.len() || !text.ends_with(CODE_END) {
        return Err(CodeError::malformed(token, MalformedReason::MissingTerminator));
    }
    let end = text.len() - CODE_END.len_utf8();
    let body_start = CODE_HEAD.len();
    let params_start = text[body_start..end]
        .find(CODE_SEP)
        .map_or(end, |i| body_start + i);

    let raw_type = &text[body_start..params_start];
    let code_type = raw_type.trim_matches(|c: char| c.is_ascii_whitespace());
    if code_type.is_empty() {
        return Err(CodeError::malformed(token, MalformedReason::EmptyType));
    }
    if code_type.contains([CODE_KV, CODE_END]) {
        return Err(CodeError::malformed(
            token,
            MalformedReason::ReservedCharInType,
        ));
    }
    let leading = raw_type.len()
        - raw_type
            .trim_start_matches(|c: char| c.is_ascii_whitespace())
            .len();
    let type_start = body_start + leading;
    Ok((
        text,
        Layout {
            type_start,
            type_end: type_start + code_type.len(),
            params_start,
            end,
        },
    ))
}

/// Type of a token the scanner already bracketed, without full validation.
///
/// `token` must start with the head and end with the terminator.
pub(crate) fn type_of(token: &str) -> &str {
    let body = &token[CODE_HEAD.len()..token.len() - CODE_END.len_utf8()];
    let raw = body.split(CODE_SEP).next().unwrap_or(body);
    raw.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// One `key=value` field, value still encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawParam<'t> {
    pub(crate) key: &'t str,
    pub(crate) value: &'t str,
    /// Offset of `value` in the token text.
    pub(crate) value_start: usize,
}

/// Forward cursor over the parameter fields of one token.
#[derive(Debug, Clone)]
pub(crate) struct RawFields<'t> {
    text: &'t str,
    /// Always at a `,` or at `end`.
    pos: usize,
    end: usize,
}

impl<'t> Iterator for RawFields<'t> {
    type Item = RawParam<'t>;

    fn next(&mut self) -> Option<RawParam<'t>> {
        while self.pos < self.end {
            let start = self.pos + CODE_SEP.len_utf8();
            let stop = self.text[start..self.end]
                .find(CODE_SEP)
                .map_or(self.end, |i| start + i);
            self.pos = stop;
            let field = &self.text[start..stop];
            if let Some((key, value)) = field.split_once(CODE_KV) {
                return Some(RawParam {
                    key: key.trim_matches(|c: char| c.is_ascii_whitespace()),
                    value,
                    value_start: start + key.len() + CODE_KV.len_utf8(),
                });
            }
        }
        None
    }
}

impl std::iter::FusedIterator for RawFields<'_> {}

impl<'t> RawFields<'t> {
    /// Next field whose key does not appear again later in the token.
    pub(crate) fn next_distinct(&mut self) -> Option<RawParam<'t>> {
        loop {
            let param = self.next()?;
            if !self.clone().any(|later| later.key == param.key) {
                return Some(param);
            }
        }
    }

    /// Number of distinct keys from the cursor onwards.
    pub(crate) fn count_distinct(mut self) -> usize {
        let mut n = 0;
        while self.next_distinct().is_some() {
            n += 1;
        }
        n
    }
}

/// Whether any key in the token is padded with whitespace, which defeats the
/// literal `,key=` search and forces a field walk.
pub(crate) fn has_padded_keys(text: &str, layout: &Layout) -> bool {
    let b = text.as_bytes();
    (layout.params_start..layout.end).any(|i| match b[i] {
        b',' => b.get(i + 1).is_some_and(u8::is_ascii_whitespace),
        b'=' => i > 0 && b[i - 1].is_ascii_whitespace(),
        _ => false,
    })
}

/// Span of the raw (encoded) value of `key`, or `None` when the key is absent.
///
/// The fast path searches for the literal `,key=` from the right, so a
/// repeated key resolves to its last occurrence. Padded tokens fall back to a
/// field walk.
pub(crate) fn find_raw(text: &str, layout: &Layout, key: &str, padded: bool) -> Option<Span> {
    if key.contains([CODE_SEP, CODE_KV]) {
        return None;
    }
    if padded {
        return layout
            .fields(text)
            .filter(|p| p.key == key)
            .last()
            .map(|p| Span::new(p.value_start, p.value_start + p.value.len()));
    }
    let params = &text[layout.params_start..layout.end];
    params.rmatch_indices(CODE_SEP).find_map(|(i, _)| {
        let value = params[i + 1..].strip_prefix(key)?.strip_prefix(CODE_KV)?;
        let start = layout.params_start + i + 1 + key.len() + CODE_KV.len_utf8();
        let len = value.find(CODE_SEP).unwrap_or(value.len());
        Some(Span::new(start, start + len))
    })
}

/// Raw (encoded) value of `key` as a slice of `text`.
pub(crate) fn find_raw_str<'t>(
    text: &'t str,
    layout: &Layout,
    key: &str,
    padded: bool,
) -> Option<&'t str> {
    find_raw(text, layout, key, padded).map(|span| &text[span.start..span.end])
}

/// Reject types the grammar cannot carry.
pub fn check_type(code_type: &str) -> Result<()> {
    let trimmed = code_type.trim_matches(|c: char| c.is_ascii_whitespace());
    let padded = trimmed.len() != code_type.len();
    if code_type.is_empty() || padded || code_type.contains([CODE_SEP, CODE_KV, CODE_END]) {
        return Err(CodeError::InvalidType(code_type.to_string()));
    }
    Ok(())
}

/// Reject keys the grammar cannot carry.
pub fn check_key(key: &str) -> Result<()> {
    let padded = key.trim_matches(|c: char| c.is_ascii_whitespace()).len() != key.len();
    if padded || key.contains([CODE_SEP, CODE_KV, CODE_END]) {
        return Err(CodeError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(token: &str) -> Vec<(String, String)> {
        let (text, layout) = frame(token).unwrap();
        layout
            .fields(text)
            .map(|p| (p.key.to_string(), p.value.to_string()))
            .collect()
    }

    #[test]
    fn frame_locates_type() {
        let (text, layout) = frame("  [CQ:at,qq=1]\n").unwrap();
        assert_eq!(text, "[CQ:at,qq=1]");
        assert_eq!(layout.code_type(text), "at");
        assert_eq!(layout.params_start, 6);
        assert_eq!(layout.end, 11);
    }

    #[test]
    fn frame_without_params() {
        let (text, layout) = frame("[CQ:dice]").unwrap();
        assert_eq!(layout.code_type(text), "dice");
        assert_eq!(layout.params_start, layout.end);
        assert_eq!(layout.fields(text).count(), 0);
    }

    #[test]
    fn frame_rejects_bad_framing() {
        let reason = |t: &str| match frame(t) {
            Err(CodeError::Malformed { reason, .. }) => reason,
            other => panic!("expected malformed, got {other:?}"),
        };
        assert_eq!(reason("at,qq=1]"), MalformedReason::MissingHead);
        assert_eq!(reason("[CQ:at,qq=1"), MalformedReason::MissingTerminator);
        assert_eq!(reason("[CQ:"), MalformedReason::MissingTerminator);
        assert_eq!(reason("[CQ:]"), MalformedReason::EmptyType);
        assert_eq!(reason("[CQ: ,a=1]"), MalformedReason::EmptyType);
        assert_eq!(reason("[CQ:a=b]"), MalformedReason::ReservedCharInType);
    }

    #[test]
    fn fields_split_on_first_kv_only() {
        assert_eq!(
            params("[CQ:share,url=http://x?a=1&amp;b=2,title=t]"),
            vec![
                ("url".into(), "http://x?a=1&amp;b=2".into()),
                ("title".into(), "t".into())
            ]
        );
    }

    #[test]
    fn fields_trim_keys_but_not_values() {
        assert_eq!(
            params("[CQ:at , qq = 1 ,x=2]"),
            vec![("qq".into(), " 1 ".into()), ("x".into(), "2".into())]
        );
    }

    #[test]
    fn fields_skip_entries_without_kv() {
        assert_eq!(
            params("[CQ:a,,flag,k=v,]"),
            vec![("k".into(), "v".into())]
        );
    }

    #[test]
    fn empty_value_is_kept() {
        assert_eq!(params("[CQ:a,k=]"), vec![("k".into(), String::new())]);
    }

    #[test]
    fn find_raw_fast_path() {
        let (text, layout) = frame("[CQ:music,type=qq,id=5]").unwrap();
        assert!(!has_padded_keys(text, &layout));
        assert_eq!(find_raw_str(text, &layout, "id", false), Some("5"));
        assert_eq!(find_raw_str(text, &layout, "type", false), Some("qq"));
        assert_eq!(find_raw_str(text, &layout, "music", false), None);
        assert_eq!(find_raw_str(text, &layout, "missing", false), None);
        assert_eq!(find_raw_str(text, &layout, "t", false), None);
    }

    #[test]
    fn find_raw_last_occurrence_wins() {
        let (text, layout) = frame("[CQ:a,k=1,k=2]").unwrap();
        assert_eq!(find_raw_str(text, &layout, "k", false), Some("2"));
    }

    #[test]
    fn find_raw_padded_walks_fields() {
        let (text, layout) = frame("[CQ:a, k =1,j=2]").unwrap();
        assert!(has_padded_keys(text, &layout));
        assert_eq!(find_raw_str(text, &layout, "k", true), Some("1"));
        assert_eq!(find_raw_str(text, &layout, "j", true), Some("2"));
    }

    #[test]
    fn find_raw_reports_value_span() {
        let (text, layout) = frame("[CQ:a,k=12,j=]").unwrap();
        assert_eq!(find_raw(text, &layout, "k", false), Some(Span::new(8, 10)));
        assert_eq!(find_raw(text, &layout, "j", false), Some(Span::new(13, 13)));
        assert_eq!(find_raw(text, &layout, "k", true), Some(Span::new(8, 10)));
    }

    #[test]
    fn distinct_fields_keep_last_occurrence() {
        let (text, layout) = frame("[CQ:a,k=1,j=2,k=3]").unwrap();
        let mut fields = layout.fields(text);
        let first = fields.next_distinct().unwrap();
        assert_eq!((first.key, first.value), ("j", "2"));
        let second = fields.next_distinct().unwrap();
        assert_eq!((second.key, second.value), ("k", "3"));
        assert!(fields.next_distinct().is_none());
        assert_eq!(layout.fields(text).count_distinct(), 2);
        assert_eq!(layout.fields(text).count(), 3);
    }

    #[test]
    fn find_raw_rejects_reserved_keys() {
        let (text, layout) = frame("[CQ:a,k=1,j=2]").unwrap();
        assert_eq!(find_raw_str(text, &layout, "k=1,j", false), None);
    }

    #[test]
    fn type_of_scanned_token() {
        assert_eq!(type_of("[CQ:at,qq=1]"), "at");
        assert_eq!(type_of("[CQ:dice]"), "dice");
        assert_eq!(type_of("[CQ: face ,id=1]"), "face");
    }

    #[test]
    fn check_type_and_key() {
        assert!(check_type("image").is_ok());
        assert!(check_type("").is_err());
        assert!(check_type("a,b").is_err());
        assert!(check_type(" at").is_err());
        assert!(check_key("file").is_ok());
        assert!(check_key("").is_ok());
        assert!(check_key("a=b").is_err());
        assert!(check_key("k ").is_err());
    }
}
