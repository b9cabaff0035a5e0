//! Message-body scanning.
//!
//! A message body is plain text with zero or more complete `[CQ:...]` tokens
//! interleaved. All functions here borrow the body and never modify it.
//!
//! Token boundaries come from one state machine shared by every operation:
//!
//! ```text
//! SeekingHead ──head──▶ SeekingTerminator ──`]`──▶ TokenClosed ──▶ SeekingHead
//!                              │
//!                              └─no `]`─▶ HeadWithoutTerminator (text, scan ends)
//! ```
//!
//! A head with no terminator anywhere after it is ordinary text. A token
//! always opens at the first head found and closes at the first `]` after
//! it; any head in between is part of the token's type or a value. Text left
//! between tokens therefore never holds a head that a later `]` could close.

use std::borrow::Cow;
use std::iter::FusedIterator;

use serde::Serialize;

use super::token::{find_raw_str, frame, has_padded_keys, type_of};
use super::{CODE_END, CODE_HEAD, Span};
use crate::escape::decode_param;

// ─── Token scanner ──────────────────────────────────────────────────────────

/// Scanner state while looking for the next token.
enum ScanState {
    SeekingHead,
    SeekingTerminator { head: usize },
    HeadWithoutTerminator { head: usize },
    TokenClosed(Span),
}

/// Iterator over the spans of complete tokens, optionally of one type.
#[derive(Debug, Clone)]
struct TokenSpans<'a> {
    body: &'a str,
    filter: Option<&'a str>,
    pos: usize,
}

impl<'a> TokenSpans<'a> {
    fn new(body: &'a str, filter: Option<&'a str>) -> Self {
        Self {
            body,
            filter: filter.filter(|t| !t.is_empty()),
            pos: 0,
        }
    }

    fn matches(&self, span: Span) -> bool {
        self.filter
            .is_none_or(|t| type_of(&self.body[span.start..span.end]) == t)
    }
}

impl Iterator for TokenSpans<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        let body = self.body;
        let mut state = ScanState::SeekingHead;
        loop {
            state = match state {
                ScanState::SeekingHead => match body[self.pos..].find(CODE_HEAD) {
                    Some(i) => ScanState::SeekingTerminator { head: self.pos + i },
                    None => {
                        self.pos = body.len();
                        return None;
                    }
                },
                ScanState::SeekingTerminator { head } => {
                    let after = head + CODE_HEAD.len();
                    match body[after..].find(CODE_END) {
                        None => ScanState::HeadWithoutTerminator { head },
                        Some(j) => {
                            let end = after + j;
                            if let Some(k) = body[after..end].find(CODE_HEAD) {
                                tracing::trace!(
                                    offset = head,
                                    inner = after + k,
                                    "nested code head kept inside token"
                                );
                            }
                            ScanState::TokenClosed(Span::new(head, end + 1))
                        }
                    }
                }
                ScanState::HeadWithoutTerminator { head } => {
                    tracing::trace!(offset = head, "unterminated code head treated as text");
                    // No terminator follows this head, so none follows any later head.
                    self.pos = body.len();
                    return None;
                }
                ScanState::TokenClosed(span) => {
                    self.pos = span.end;
                    if self.matches(span) {
                        return Some(span);
                    }
                    ScanState::SeekingHead
                }
            };
        }
    }
}

impl FusedIterator for TokenSpans<'_> {}

// ─── Tokens ─────────────────────────────────────────────────────────────────

/// Iterator over the token substrings of a body. See [`tokens`].
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    spans: TokenSpans<'a>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let body = self.spans.body;
        self.spans.next().map(|s| &body[s.start..s.end])
    }
}

impl FusedIterator for Tokens<'_> {}

/// Iterate complete tokens in `body`, left to right.
///
/// With `code_type` set, only tokens of exactly that type are yielded
/// (`Some("")` behaves like `None`).
pub fn tokens<'a>(body: &'a str, code_type: Option<&'a str>) -> Tokens<'a> {
    Tokens {
        spans: TokenSpans::new(body, code_type),
    }
}

/// The `index`-th (0-based) token in `body`, optionally of one type.
pub fn locate<'a>(body: &'a str, code_type: Option<&str>, index: usize) -> Option<&'a str> {
    let spans = TokenSpans {
        body,
        filter: code_type.filter(|t| !t.is_empty()),
        pos: 0,
    };
    spans.map(|s| &body[s.start..s.end]).nth(index)
}

/// Every token in `body`, optionally of one type, in order.
pub fn locate_all<'a>(body: &'a str, code_type: Option<&str>) -> Vec<&'a str> {
    let spans = TokenSpans {
        body,
        filter: code_type.filter(|t| !t.is_empty()),
        pos: 0,
    };
    spans.map(|s| &body[s.start..s.end]).collect()
}

/// Decoded value of `key` in the `index`-th token (optionally of one type).
///
/// Returns `None` when the token or the key is missing, and `Some("")` when
/// the key is present without a value.
pub fn param_of<'a>(
    body: &'a str,
    key: &str,
    code_type: Option<&str>,
    index: usize,
) -> Option<Cow<'a, str>> {
    let token = locate(body, code_type, index)?;
    let (text, layout) = frame(token).ok()?;
    let padded = has_padded_keys(text, &layout);
    find_raw_str(text, &layout, key, padded).map(decode_param)
}

// ─── Segments ───────────────────────────────────────────────────────────────

/// Classification of a body segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Plain message text (still text-escaped).
    Text,
    /// One complete code token.
    Code,
}

/// A contiguous span of a body: either plain text or one token.
///
/// `text` is always exactly `&body[span.start..span.end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment<'a> {
    /// Whether this is text or a token.
    pub kind: SegmentKind,
    /// Borrowed slice of the body.
    pub text: &'a str,
    /// Position in the body.
    pub span: Span,
}

impl Segment<'_> {
    /// Whether this segment is a code token.
    pub fn is_code(&self) -> bool {
        self.kind == SegmentKind::Code
    }
}

/// Iterator over the segments of a body. See [`segments`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    spans: TokenSpans<'a>,
    /// Start of the text not yet emitted.
    pos: usize,
    pending: Option<Span>,
    emitted: bool,
}

impl<'a> Segments<'a> {
    fn segment(&mut self, kind: SegmentKind, span: Span) -> Segment<'a> {
        self.emitted = true;
        Segment {
            kind,
            text: &self.spans.body[span.start..span.end],
            span,
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if let Some(token) = self.pending.take() {
            self.pos = token.end;
            return Some(self.segment(SegmentKind::Code, token));
        }
        let len = self.spans.body.len();
        match self.spans.next() {
            Some(token) if token.start > self.pos => {
                self.pending = Some(token);
                let text = Span::new(self.pos, token.start);
                Some(self.segment(SegmentKind::Text, text))
            }
            Some(token) => {
                self.pos = token.end;
                Some(self.segment(SegmentKind::Code, token))
            }
            // An empty body still yields one (empty) text segment.
            None if self.pos < len || !self.emitted => {
                let text = Span::new(self.pos, len);
                self.pos = len;
                Some(self.segment(SegmentKind::Text, text))
            }
            None => None,
        }
    }
}

impl FusedIterator for Segments<'_> {}

/// Iterate the text and token segments of `body` in order.
///
/// Concatenating every segment's `text` reproduces `body` exactly. Adjacent
/// tokens produce no empty text segment between them.
pub fn segments(body: &str) -> Segments<'_> {
    Segments {
        spans: TokenSpans::new(body, None),
        pos: 0,
        pending: None,
        emitted: false,
    }
}

/// Split `body` into its text and token segments.
pub fn split(body: &str) -> Vec<Segment<'_>> {
    segments(body).collect()
}

// ─── Strip ──────────────────────────────────────────────────────────────────

/// How [`strip`] treats the text left between removed tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripOptions {
    /// Trim surrounding whitespace from each kept fragment.
    pub trim: bool,
    /// Drop fragments that are blank (empty after trimming).
    pub ignore_empty: bool,
    /// Inserted between kept fragments.
    pub join_with: String,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            trim: true,
            ignore_empty: true,
            join_with: String::new(),
        }
    }
}

impl StripOptions {
    /// Set [`trim`](Self::trim).
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Set [`ignore_empty`](Self::ignore_empty).
    pub fn with_ignore_empty(mut self, ignore_empty: bool) -> Self {
        self.ignore_empty = ignore_empty;
        self
    }

    /// Set [`join_with`](Self::join_with).
    pub fn with_join(mut self, join_with: impl Into<String>) -> Self {
        self.join_with = join_with.into();
        self
    }
}

/// Remove every token (optionally only those of one type) from `body`.
///
/// The surviving text fragments are trimmed, filtered and joined according
/// to `options`. Tokens of other types stay inside their fragment.
pub fn strip(body: &str, code_type: Option<&str>, options: &StripOptions) -> String {
    let mut out = String::with_capacity(body.len());
    let mut kept_any = false;
    let mut push = |fragment: &str| {
        if options.ignore_empty && fragment.trim().is_empty() {
            return;
        }
        let fragment = if options.trim { fragment.trim() } else { fragment };
        if kept_any {
            out.push_str(&options.join_with);
        }
        out.push_str(fragment);
        kept_any = true;
    };

    let spans = TokenSpans {
        body,
        filter: code_type.filter(|t| !t.is_empty()),
        pos: 0,
    };
    let mut pos = 0;
    for span in spans {
        push(&body[pos..span.start]);
        pos = span.end;
    }
    push(&body[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(segs: &[Segment<'a>]) -> Vec<&'a str> {
        segs.iter().map(|s| s.text).collect()
    }

    // ── locate ──────────────────────────────────────────────────────────

    #[test]
    fn locate_by_type_and_index() {
        let body = "hi[CQ:face,id=1]bye[CQ:face,id=2]";
        assert_eq!(locate(body, Some("face"), 1), Some("[CQ:face,id=2]"));
        assert_eq!(locate(body, Some("face"), 0), Some("[CQ:face,id=1]"));
        assert_eq!(locate(body, Some("face"), 2), None);
        assert_eq!(locate(body, None, 1), Some("[CQ:face,id=2]"));
    }

    #[test]
    fn type_filter_matches_whole_type() {
        let body = "[CQ:atall][CQ:at,qq=1]";
        assert_eq!(locate(body, Some("at"), 0), Some("[CQ:at,qq=1]"));
        assert_eq!(locate_all(body, Some("at")), ["[CQ:at,qq=1]"]);
        assert_eq!(locate_all(body, Some("")).len(), 2);
    }

    #[test]
    fn unterminated_head_is_text() {
        assert_eq!(locate("abc[CQ:at", None, 0), None);
        assert!(locate_all("x[CQ:at,qq=1", None).is_empty());
    }

    #[test]
    fn nested_head_stays_inside_token() {
        let body = "[CQ:a,k=[CQ:b,j=1]tail";
        assert_eq!(locate_all(body, None), ["[CQ:a,k=[CQ:b,j=1]"]);
        assert_eq!(param_of(body, "k", Some("a"), 0).as_deref(), Some("[CQ:b"));
        assert_eq!(param_of(body, "j", None, 0).as_deref(), Some("1"));
    }

    #[test]
    fn deep_nesting_opens_at_first_head() {
        let heads = "[CQ:".repeat(10_000);
        let body = format!("{heads}x]y]");
        let found = locate_all(&body, None);
        assert_eq!(found, [format!("{heads}x]")]);
    }

    #[test]
    fn strip_never_joins_a_new_token() {
        let opts = StripOptions::default();
        for body in ["[CQ:[CQ:a]x]", "[CQ:a[CQ:b]]", "x[CQ:[CQ:a,k=1]y]z", "[CQ:a][CQ:"] {
            let once = strip(body, None, &opts);
            assert_eq!(strip(&once, None, &opts), once, "{body:?}");
        }
        assert_eq!(strip("[CQ:[CQ:a]x]", None, &opts), "x]");
    }

    #[test]
    fn tokens_iterator_is_lazy_and_filtered() {
        let body = "[CQ:at,qq=1]x[CQ:face,id=2]y[CQ:at,qq=3]";
        let mut it = tokens(body, Some("at"));
        assert_eq!(it.next(), Some("[CQ:at,qq=1]"));
        assert_eq!(it.next(), Some("[CQ:at,qq=3]"));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    // ── param_of ────────────────────────────────────────────────────────

    #[test]
    fn param_of_reads_decoded_values() {
        let body = "[CQ:music,type=qq,id=5]";
        assert_eq!(param_of(body, "id", None, 0).as_deref(), Some("5"));
        assert_eq!(param_of(body, "missing", None, 0), None);
        assert_eq!(param_of(body, "id", None, 1), None);
        assert_eq!(
            param_of("x[CQ:share,url=a&#91;b&#93;c]", "url", Some("share"), 0).as_deref(),
            Some("a[b]c")
        );
    }

    #[test]
    fn param_of_empty_value() {
        assert_eq!(param_of("[CQ:a,k=]", "k", None, 0).as_deref(), Some(""));
    }

    #[test]
    fn param_of_padded_token() {
        assert_eq!(param_of("[CQ:at , qq=9]", "qq", Some("at"), 0).as_deref(), Some("9"));
    }

    // ── split ───────────────────────────────────────────────────────────

    #[test]
    fn split_text_and_code() {
        let segs = split("A[CQ:at,qq=1]B");
        assert_eq!(texts(&segs), ["A", "[CQ:at,qq=1]", "B"]);
        assert_eq!(segs[1].kind, SegmentKind::Code);
        assert_eq!(segs[1].span, Span::new(1, 13));
        assert!(!segs[0].is_code());
    }

    #[test]
    fn split_without_tokens() {
        assert_eq!(texts(&split("plain")), ["plain"]);
        assert_eq!(texts(&split("")), [""]);
    }

    #[test]
    fn split_adjacent_tokens() {
        let segs = split("[CQ:a][CQ:b]");
        assert_eq!(texts(&segs), ["[CQ:a]", "[CQ:b]"]);
        assert!(segs.iter().all(Segment::is_code));
    }

    #[test]
    fn split_keeps_unterminated_head_in_text() {
        assert_eq!(texts(&split("x[CQ:a]abc[CQ:at")), ["x", "[CQ:a]", "abc[CQ:at"]);
    }

    #[test]
    fn split_concatenates_back() {
        let body = " a[CQ:x,k=v][CQ:y] b [CQ:z";
        let joined: String = split(body).iter().map(|s| s.text).collect();
        assert_eq!(joined, body);
    }

    // ── strip ───────────────────────────────────────────────────────────

    #[test]
    fn strip_with_join() {
        let opts = StripOptions::default().with_join(" ");
        assert_eq!(strip("A[CQ:at,qq=1]B[CQ:at,qq=2]C", None, &opts), "A B C");
    }

    #[test]
    fn strip_defaults_trim_and_drop_blank() {
        let opts = StripOptions::default();
        assert_eq!(strip(" A [CQ:at,qq=1]  [CQ:face,id=1] B ", None, &opts), "AB");
        assert_eq!(strip("[CQ:at,qq=1]", None, &opts), "");
    }

    #[test]
    fn strip_only_one_type() {
        let opts = StripOptions::default().with_join("|");
        assert_eq!(
            strip("a[CQ:at,qq=1]b[CQ:face,id=2]c", Some("at"), &opts),
            "a|b[CQ:face,id=2]c"
        );
    }

    #[test]
    fn strip_keeping_blank_untrimmed_fragments() {
        let opts = StripOptions::default()
            .with_trim(false)
            .with_ignore_empty(false)
            .with_join("/");
        assert_eq!(strip(" a [CQ:x]  [CQ:y]", None, &opts), " a /  /");
    }

    #[test]
    fn strip_is_idempotent() {
        let opts = StripOptions::default().with_join(" ");
        let once = strip("x [CQ:a] y[CQ:b,k=1]z [CQ:c", None, &opts);
        assert_eq!(strip(&once, None, &opts), once);
    }
}
