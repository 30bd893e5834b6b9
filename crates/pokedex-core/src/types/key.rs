//! Tuple keys for the embedded key-value space
//!
//! A key is an ordered list of parts. Parts are either unsigned integers or
//! strings; the derived ordering compares part by part, puts integers before
//! strings and sorts a prefix before every key that extends it. Listing by
//! prefix relies on that ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{COLLECTION_SEGMENT, COUNTER_NAME, COUNTER_SEGMENT};
use crate::types::RecordId;

/// One segment of a [`KvKey`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    /// Unsigned integer segment
    Int(u64),
    /// String segment
    Str(String),
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Int(n) => write!(f, "{}", n),
            KeyPart::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Ordered tuple key, e.g. `["pokemons", 12]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KvKey(Vec<KeyPart>);

impl KvKey {
    /// Build a key from its parts
    pub fn new<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Key of a single record: `["pokemons", id]`
    pub fn record(id: RecordId) -> Self {
        Self(vec![COLLECTION_SEGMENT.into(), KeyPart::Int(id)])
    }

    /// Prefix shared by every record: `["pokemons"]`
    pub fn collection() -> Self {
        Self(vec![COLLECTION_SEGMENT.into()])
    }

    /// Key of the id counter: `["counter", "pokemon"]`
    pub fn counter() -> Self {
        Self(vec![COUNTER_SEGMENT.into(), COUNTER_NAME.into()])
    }

    /// The key's parts in order
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Whether `prefix` is a (non-strict) prefix of this key
    pub fn starts_with(&self, prefix: &KvKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Last segment as an integer, if it is one
    pub fn last_int(&self) -> Option<u64> {
        match self.0.last() {
            Some(KeyPart::Int(n)) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for KvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, "]")
    }
}
