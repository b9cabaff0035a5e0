//! The code entity: one parsed `[CQ:type,key=value,...]` token.
//!
//! Three concrete types implement the [`Code`] contract:
//!
//! - [`MapCode`]: immutable, parsed eagerly into a key-indexed store. Cheap to
//!   clone and safe to share across threads.
//! - [`MutableCode`]: an owned, editable copy of the parameters.
//! - [`LazyCode`]: wraps the validated token text and re-scans it on every
//!   access.
//!
//! Equality and hashing are structural: two codes are equal when their types
//! and decoded parameters are equal, whatever the representation or source
//! formatting.

/// Well-known constant codes.
pub mod consts;
mod lazy;
mod map;
mod params;

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde::ser::{SerializeMap, SerializeStruct, Serializer};

pub use lazy::LazyCode;
pub use map::{MapCode, MutableCode};

use crate::error::Result;
use crate::grammar::scan;

/// Read access shared by every code representation.
///
/// All value accessors return decoded text unless named `*_raw`. A missing
/// key is `None`; a key present without a value is `Some("")`.
pub trait Code: fmt::Debug {
    /// The tag name, e.g. `"at"` or `"image"`.
    fn code_type(&self) -> &str;

    /// Decoded value of `key`.
    fn get(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Parameter-escaped value of `key` as it was written in the parsed token.
    ///
    /// Codes assembled or edited in memory have no source text and report the
    /// canonical encoding instead.
    fn get_raw(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Whether a parameter named `key` exists.
    fn contains_key(&self, key: &str) -> bool;

    /// Whether any parameter has the decoded value `value`.
    fn contains_value(&self, value: &str) -> bool;

    /// Number of distinct parameters.
    fn len(&self) -> usize;

    /// Whether the code carries no parameters.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parameter keys in order.
    fn keys(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    /// Decoded parameter values in key order.
    fn values(&self) -> Box<dyn Iterator<Item = Cow<'_, str>> + '_>;

    /// `(key, decoded value)` pairs in order.
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, Cow<'_, str>)> + '_>;

    /// Copy the parameters into a new editable code.
    fn to_mutable(&self) -> MutableCode;

    /// An immutable eager code with the same content.
    fn to_immutable(&self) -> MapCode;

    /// Canonical token text: no padding, one field per distinct key, every
    /// value re-encoded. Equal codes render identically.
    fn render(&self) -> Cow<'_, str>;
}

// ─── Configuration ──────────────────────────────────────────────────────────

/// How the eager codec stores parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseMode {
    /// Decode each value once at parse time.
    #[default]
    Decode,
    /// Keep values encoded; decode on every read.
    Raw,
}

/// Which codec [`parse_code_with`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Representation {
    /// Materialize a [`MapCode`]. Best for repeated or random-key access.
    #[default]
    Eager,
    /// Wrap the text in a [`LazyCode`]. Best for one or two lookups.
    Lazy,
}

// ─── Entry points ───────────────────────────────────────────────────────────

/// Parse one token into an eager, decoded [`MapCode`].
///
/// # Errors
///
/// Returns [`CodeError::Malformed`](crate::CodeError::Malformed) when the
/// token lacks its framing or has an unusable type.
pub fn parse_code(token: &str) -> Result<MapCode> {
    MapCode::parse(token)
}

/// Parse one token with the chosen representation.
///
/// # Errors
///
/// Same as [`parse_code`].
pub fn parse_code_with<'a>(token: &'a str, repr: Representation) -> Result<Box<dyn Code + 'a>> {
    Ok(match repr {
        Representation::Eager => Box::new(MapCode::parse(token)?),
        Representation::Lazy => Box::new(LazyCode::parse(token)?),
    })
}

/// Parse every token in `body`, optionally only those of one type.
///
/// # Errors
///
/// Fails on the first token whose type is empty or unusable, e.g. `[CQ:]`.
pub fn parse_all(body: &str, code_type: Option<&str>) -> Result<Vec<MapCode>> {
    scan::tokens(body, code_type).map(MapCode::parse).collect()
}

/// Parse the `index`-th token in `body`, optionally of one type.
///
/// # Errors
///
/// Fails when the located token has an empty or unusable type.
pub fn parse_at(body: &str, code_type: Option<&str>, index: usize) -> Result<Option<MapCode>> {
    scan::locate(body, code_type, index)
        .map(MapCode::parse)
        .transpose()
}

// ─── Structural equality, hashing, serialization ────────────────────────────

pub(crate) fn same_code(a: &dyn Code, b: &dyn Code) -> bool {
    a.code_type() == b.code_type()
        && a.len() == b.len()
        && a.entries().all(|(k, v)| b.get(k).is_some_and(|w| w == v))
}

pub(crate) fn hash_code<H: Hasher>(code: &dyn Code, state: &mut H) {
    code.code_type().hash(state);
    let mut entries: Vec<_> = code.entries().collect();
    entries.sort_unstable();
    entries.hash(state);
}

/// The `data` object of the JSON projection.
struct Data<'c>(&'c dyn Code);

impl Serialize for Data<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0.entries() {
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}

/// Serialize as `{"type": ..., "data": {key: decoded value, ...}}`.
pub(crate) fn serialize_code<S: Serializer>(
    code: &dyn Code,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("Code", 2)?;
    s.serialize_field("type", code.code_type())?;
    s.serialize_field("data", &Data(code))?;
    s.end()
}

macro_rules! impl_code_traits {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Eq for $ty {}

            impl Hash for $ty {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    hash_code(self, state);
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.render())
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(
                    &self,
                    serializer: S,
                ) -> std::result::Result<S::Ok, S::Error> {
                    serialize_code(self, serializer)
                }
            }
        )*
    };
}

macro_rules! impl_code_eq {
    ($($a:ty => $b:ty),* $(,)?) => {
        $(
            impl PartialEq<$b> for $a {
                fn eq(&self, other: &$b) -> bool {
                    same_code(self, other)
                }
            }
        )*
    };
}

impl_code_traits!(MapCode, MutableCode, LazyCode<'_>);

impl_code_eq!(
    MapCode => MapCode,
    MapCode => MutableCode,
    MapCode => LazyCode<'_>,
    MutableCode => MutableCode,
    MutableCode => MapCode,
    MutableCode => LazyCode<'_>,
    LazyCode<'_> => LazyCode<'_>,
    LazyCode<'_> => MapCode,
    LazyCode<'_> => MutableCode,
);
