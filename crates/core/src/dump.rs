//! JSON projection of codes and message bodies.
//!
//! Each code becomes `{"type": <type>, "data": {<key>: <decoded value>}}` and
//! each run of plain text becomes `{"type": "text", "data": {"text": <text>}}`.

use serde_json::{Map, Value, json};

use crate::code::{Code, MapCode};
use crate::error::Result;
use crate::grammar::scan::{SegmentKind, segments};

/// Project one code.
pub fn code_to_json(code: &dyn Code) -> Value {
    let data: Map<String, Value> = code
        .entries()
        .map(|(k, v)| (k.to_string(), Value::String(v.into_owned())))
        .collect();
    json!({ "type": code.code_type(), "data": data })
}

/// Project a whole body as an array of text and code objects, in order.
///
/// # Errors
///
/// Fails when a token in the body has an empty or unusable type.
pub fn segments_to_json(body: &str) -> Result<Value> {
    let items = segments(body)
        .map(|segment| match segment.kind {
            SegmentKind::Text => Ok(json!({ "type": "text", "data": { "text": segment.text } })),
            SegmentKind::Code => MapCode::parse(segment.text).map(|code| code_to_json(&code)),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(items))
}

/// Pretty-printed [`segments_to_json`].
///
/// # Errors
///
/// Same as [`segments_to_json`].
pub fn to_pretty_json(body: &str) -> Result<String> {
    Ok(format!("{:#}", segments_to_json(body)?))
}
