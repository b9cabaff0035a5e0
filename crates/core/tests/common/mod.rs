//! Shared test helpers for `kqcode_core` integration tests.

#![allow(unreachable_pub)]

use std::sync::LazyLock;

use kqcode_core::{Code, LazyCode, MapCode, Segment};

/// Tokens covering escapes, empty values, padding, `=` in values, and
/// parameterless codes.
#[allow(dead_code)]
pub const SAMPLE_TOKENS: &[&str] = &[
    "[CQ:at,qq=123456789]",
    "[CQ:share,url=a&#91;b&#93;c,title=t]",
    "[CQ:image,file=a&#44;b.jpg,destruct=true,cache=]",
    "[CQ:share,url=http://x/?a=1&amp;b=2,title=&#09;tab&#13;]",
    "[CQ:music,type=custom,url=u,audio=a,title=t,content=c,image=i]",
    "[CQ:at , qq =1,  name= spaced ]",
    "[CQ:location,lat=39.9,lon=116.3,title=,content=x]",
    "[CQ:dice]",
    "[CQ:shake]",
    "[CQ:anonymous,ignore=true]",
];

/// A message body interleaving every sample token with plain text.
#[allow(dead_code)]
pub static SAMPLE_BODY: LazyLock<String> = LazyLock::new(|| {
    let mut body = String::from("hello ");
    for (i, token) in SAMPLE_TOKENS.iter().enumerate() {
        body.push_str(token);
        if i % 3 != 0 {
            body.push_str(&format!(" text {i} "));
        }
    }
    body.push_str(" bye");
    body
});

/// Decoded entries as owned pairs, in iteration order.
#[allow(dead_code)]
pub fn entries_of(code: &dyn Code) -> Vec<(String, String)> {
    code.entries()
        .map(|(k, v)| (k.to_string(), v.into_owned()))
        .collect()
}

/// Assert that the eager and lazy codecs observe the same content for `token`.
#[allow(dead_code)]
pub fn assert_codecs_agree(token: &str) {
    let eager = MapCode::parse(token).unwrap_or_else(|e| panic!("eager parse {token:?}: {e}"));
    let lazy = LazyCode::parse(token).unwrap_or_else(|e| panic!("lazy parse {token:?}: {e}"));

    assert_eq!(eager.code_type(), lazy.code_type(), "type of {token:?}");
    assert_eq!(eager.len(), lazy.len(), "size of {token:?}");
    assert_eq!(entries_of(&eager), entries_of(&lazy), "entries of {token:?}");
    for key in eager.keys() {
        assert_eq!(eager.get(key), lazy.get(key), "get({key:?}) on {token:?}");
        assert_eq!(eager.get_raw(key), lazy.get_raw(key), "get_raw({key:?}) on {token:?}");
        assert!(lazy.contains_key(key), "contains_key({key:?}) on {token:?}");
    }
    for value in eager.values() {
        assert!(lazy.contains_value(&value), "contains_value({value:?}) on {token:?}");
    }
    assert_eq!(lazy.get("no-such-key"), None);
    assert_eq!(eager, lazy);
    assert_eq!(eager.render(), lazy.render(), "render of {token:?}");
}

/// Concatenate segment texts.
#[allow(dead_code)]
pub fn concat(segments: &[Segment<'_>]) -> String {
    segments.iter().map(|s| s.text).collect()
}
