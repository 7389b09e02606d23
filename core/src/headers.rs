//! Header normalization.
//!
//! Callers hand headers over in whatever shape they already have. Each
//! accepted shape is one `HeaderSource` variant, and every variant
//! enumerates to the same thing: a sequence of `(name, value)` pairs.
//! Nothing is validated or deduplicated, and each shape keeps its own
//! enumeration order. For `Map` that order is by key.

use std::collections::{btree_map, hash_map, BTreeMap, HashMap};
use std::slice;

/// A header collection in one of the accepted input shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderSource {
    /// Ordered pair list. Order and duplicate names are kept.
    Pairs(Vec<(String, String)>),
    /// Plain key/value structure, enumerated in key order rather than
    /// insertion order.
    Map(BTreeMap<String, String>),
    /// Map-like structure, enumerated in the map's own iteration order.
    Hash(HashMap<String, String>),
}

impl HeaderSource {
    /// Enumerate the entries. Each call returns a fresh iterator.
    pub fn entries(&self) -> HeaderEntries<'_> {
        match self {
            HeaderSource::Pairs(pairs) => HeaderEntries::Pairs(pairs.iter()),
            HeaderSource::Map(map) => HeaderEntries::Map(map.iter()),
            HeaderSource::Hash(map) => HeaderEntries::Hash(map.iter()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            HeaderSource::Pairs(pairs) => pairs.len(),
            HeaderSource::Map(map) => map.len(),
            HeaderSource::Hash(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HeaderSource {
    fn default() -> Self {
        HeaderSource::Pairs(Vec::new())
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for HeaderSource {
    fn from(pairs: Vec<(K, V)>) -> Self {
        HeaderSource::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for HeaderSource {
    fn from(pairs: [(K, V); N]) -> Self {
        HeaderSource::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for HeaderSource {
    fn from(map: BTreeMap<String, String>) -> Self {
        HeaderSource::Map(map)
    }
}

impl From<HashMap<String, String>> for HeaderSource {
    fn from(map: HashMap<String, String>) -> Self {
        HeaderSource::Hash(map)
    }
}

/// Borrowing iterator over the `(name, value)` entries of a `HeaderSource`.
#[derive(Debug, Clone)]
pub enum HeaderEntries<'a> {
    Pairs(slice::Iter<'a, (String, String)>),
    Map(btree_map::Iter<'a, String, String>),
    Hash(hash_map::Iter<'a, String, String>),
}

impl<'a> Iterator for HeaderEntries<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            HeaderEntries::Pairs(iter) => iter.next().map(|(k, v)| (k.as_str(), v.as_str())),
            HeaderEntries::Map(iter) => iter.next().map(|(k, v)| (k.as_str(), v.as_str())),
            HeaderEntries::Hash(iter) => iter.next().map(|(k, v)| (k.as_str(), v.as_str())),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            HeaderEntries::Pairs(iter) => iter.size_hint(),
            HeaderEntries::Map(iter) => iter.size_hint(),
            HeaderEntries::Hash(iter) => iter.size_hint(),
        }
    }
}

/// Flatten an optional header source into the ordered pair list the host
/// expects. An absent source yields an empty list.
pub fn to_pair_list(source: Option<&HeaderSource>) -> Vec<(String, String)> {
    match source {
        Some(source) => source
            .entries()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        None => Vec::new(),
    }
}

/// Response-side header accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    source: HeaderSource,
}

impl Headers {
    pub fn new(source: impl Into<HeaderSource>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Enumerate all entries. Safe to call any number of times.
    pub fn entries(&self) -> HeaderEntries<'_> {
        self.source.entries()
    }

    /// First value whose name matches `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}
