//! Decoded database entries and path traversal over them.
//!
//! A [`Record`] is the fully materialized tree of one database entry. It is
//! produced by deserializing a lookup result, which doubles as the check that
//! the entry can be decoded at all before any field is read from it.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::path::FieldPath;

/// One node of a decoded database entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Utf8(String),
    U16(u16),
    U32(u32),
    Double(f64),
    Map(BTreeMap<String, Record>),
    Array(Vec<Record>),
    // Stored types the extractor does not render. Kept so the full entry
    // can still be dumped as decoded.
    Bool(bool),
    Int32(i32),
    U64(u64),
    U128(u128),
    Float(f32),
    Bytes(Vec<u8>),
}

/// A leaf value read from a [`Record`], tagged by its stored type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TypedValue<'a> {
    Utf8(&'a str),
    U16(u16),
    U32(u32),
    Double(f64),
    Unsupported(&'static str),
}

impl Record {
    /// Build a map node from key/value pairs.
    pub fn map<K, I>(entries: I) -> Record
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Record)>,
    {
        Record::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array node.
    pub fn array<I: IntoIterator<Item = Record>>(items: I) -> Record {
        Record::Array(items.into_iter().collect())
    }

    /// Name of the stored type, as MaxMind calls it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Record::Utf8(_) => "utf8_string",
            Record::U16(_) => "uint16",
            Record::U32(_) => "uint32",
            Record::Double(_) => "double",
            Record::Map(_) => "map",
            Record::Array(_) => "array",
            Record::Bool(_) => "boolean",
            Record::Int32(_) => "int32",
            Record::U64(_) => "uint64",
            Record::U128(_) => "uint128",
            Record::Float(_) => "float",
            Record::Bytes(_) => "bytes",
        }
    }

    /// This node viewed as a leaf value. Containers are not leaves.
    pub fn typed(&self) -> TypedValue<'_> {
        match self {
            Record::Utf8(s) => TypedValue::Utf8(s),
            Record::U16(n) => TypedValue::U16(*n),
            Record::U32(n) => TypedValue::U32(*n),
            Record::Double(d) => TypedValue::Double(*d),
            other => TypedValue::Unsupported(other.type_name()),
        }
    }

    /// Child node for one path segment, if any.
    ///
    /// On a map the segment is a key. On an array it must be a decimal index;
    /// `-1` addresses the last element. Scalars have no children.
    pub fn child(&self, segment: &str) -> Option<&Record> {
        match self {
            Record::Map(entries) => entries.get(segment),
            Record::Array(items) => {
                let index: i64 = segment.parse().ok()?;
                let index = if index < 0 {
                    let back = usize::try_from(index.unsigned_abs()).ok()?;
                    items.len().checked_sub(back)?
                } else {
                    usize::try_from(index).ok()?
                };
                items.get(index)
            }
            _ => None,
        }
    }

    /// Walk `path` from this node and return the leaf it ends on.
    ///
    /// Returns `None` when any segment cannot be followed. A path that ends
    /// on a map or array yields [`TypedValue::Unsupported`].
    pub fn value_at(&self, path: FieldPath<'_>) -> Option<TypedValue<'_>> {
        let mut node = self;
        for segment in path.segments() {
            match node.child(segment) {
                Some(next) => node = next,
                None => {
                    log::debug!(
                        "no value at {path}: segment {segment:?} not found in {}",
                        node.type_name()
                    );
                    return None;
                }
            }
        }
        Some(node.typed())
    }
}

impl From<&str> for Record {
    fn from(s: &str) -> Self {
        Record::Utf8(s.to_string())
    }
}

impl From<String> for Record {
    fn from(s: String) -> Self {
        Record::Utf8(s)
    }
}

impl From<u16> for Record {
    fn from(n: u16) -> Self {
        Record::U16(n)
    }
}

impl From<u32> for Record {
    fn from(n: u32) -> Self {
        Record::U32(n)
    }
}

impl From<f64> for Record {
    fn from(d: f64) -> Self {
        Record::Double(d)
    }
}

impl From<bool> for Record {
    fn from(b: bool) -> Self {
        Record::Bool(b)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a MaxMind DB data value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Record, E> {
        Ok(Record::Utf8(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Record, E> {
        Ok(Record::Utf8(v))
    }

    fn visit_u16<E: de::Error>(self, v: u16) -> Result<Record, E> {
        Ok(Record::U16(v))
    }

    fn visit_u32<E: de::Error>(self, v: u32) -> Result<Record, E> {
        Ok(Record::U32(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Record, E> {
        Ok(Record::Double(v))
    }

    // Serde forwards narrower types to the wide visitors by default, which
    // would blur the stored type. Each one is tagged explicitly instead.
    fn visit_f32<E: de::Error>(self, v: f32) -> Result<Record, E> {
        Ok(Record::Float(v))
    }

    fn visit_u8<E: de::Error>(self, v: u8) -> Result<Record, E> {
        Ok(Record::U16(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Record, E> {
        Ok(Record::U64(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Record, E> {
        Ok(Record::U128(v))
    }

    fn visit_i8<E: de::Error>(self, v: i8) -> Result<Record, E> {
        Ok(Record::Int32(v.into()))
    }

    fn visit_i16<E: de::Error>(self, v: i16) -> Result<Record, E> {
        Ok(Record::Int32(v.into()))
    }

    fn visit_i32<E: de::Error>(self, v: i32) -> Result<Record, E> {
        Ok(Record::Int32(v))
    }

    // MaxMind has no wider signed type
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Record, E> {
        i32::try_from(v)
            .map(Record::Int32)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &"a 32-bit signed integer"))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Record, E> {
        Ok(Record::Bool(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Record, E> {
        Ok(Record::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Record, E> {
        Ok(Record::Bytes(v))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Record, D::Error> {
        Record::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Record, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Record>()? {
            items.push(item);
        }
        Ok(Record::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, Record>()? {
            entries.insert(key, value);
        }
        Ok(Record::Map(entries))
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RecordVisitor)
    }
}

/// Serializes as plain JSON-like data, every value as it was stored.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Record::Utf8(s) => serializer.serialize_str(s),
            Record::U16(n) => serializer.serialize_u16(*n),
            Record::U32(n) => serializer.serialize_u32(*n),
            Record::Double(d) => serializer.serialize_f64(*d),
            Record::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Record::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Record::Bool(b) => serializer.serialize_bool(*b),
            Record::Int32(n) => serializer.serialize_i32(*n),
            Record::U64(n) => serializer.serialize_u64(*n),
            Record::U128(n) => serializer.serialize_u128(*n),
            Record::Float(f) => serializer.serialize_f32(*f),
            Record::Bytes(bytes) => serializer.serialize_bytes(bytes),
        }
    }
}
