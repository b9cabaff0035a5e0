//! Code emitter: converts a type and parameters back into token text.
//!
//! The canonical form is `[CQ:` + type + (`,` key `=` encode(value))* + `]`;
//! a code without parameters renders as `[CQ:type]`.

use super::{CODE_END, CODE_HEAD, CODE_KV, CODE_SEP};
use crate::escape::encode_param;

/// Append one rendered code to `out`.
///
/// When `encode` is `false` the values are embedded as given, which is only
/// correct for values that are already parameter-escaped.
pub(crate) fn write_code<'p, I>(out: &mut String, code_type: &str, params: I, encode: bool)
where
    I: IntoIterator<Item = (&'p str, &'p str)>,
{
    out.push_str(CODE_HEAD);
    out.push_str(code_type);
    for (key, value) in params {
        out.push(CODE_SEP);
        out.push_str(key);
        out.push(CODE_KV);
        if encode {
            out.push_str(&encode_param(value));
        } else {
            out.push_str(value);
        }
    }
    out.push(CODE_END);
}

/// Render a code from a type and decoded parameter values.
///
/// No validation is performed: a type or key containing `,`, `=` or `]`
/// produces text that will not parse back to the same code. Use
/// [`MapCode::new`](crate::MapCode::new) for checked assembly.
pub fn render_code<I, K, V>(code_type: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    render(code_type, params, true)
}

/// Render a code from a type and already-encoded parameter values.
pub fn render_code_raw<I, K, V>(code_type: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    render(code_type, params, false)
}

fn render<I, K, V>(code_type: &str, params: I, encode: bool) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let params: Vec<(K, V)> = params.into_iter().collect();
    let mut out = String::with_capacity(CODE_HEAD.len() + code_type.len() + 1 + params.len() * 16);
    write_code(
        &mut out,
        code_type,
        params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())),
        encode,
    );
    out
}
