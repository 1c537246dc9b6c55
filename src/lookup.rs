//! Named, insertion-ordered key/value facts.
//!
//! A [`NamedLookup`] is the unit handed to the horizontal key/value layout:
//! "Executive Summary", "Details", or the single entry behind a named
//! hyperlink section. Entries are laid out in insertion order, so they live
//! in an [`IndexMap`].

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedLookup {
    name: String,
    entries: IndexMap<String, String>,
}

impl NamedLookup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set `key` to `value`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Set a key from possibly-absent inputs. Absent key or value is a no-op.
    pub fn set(&mut self, key: Option<&str>, value: Option<&str>) {
        if let (Some(k), Some(v)) = (key, value) {
            self.insert(k, v);
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`; the remaining entries keep their order.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Overlay every entry of `other` onto `self` (other wins, new keys append).
    pub fn extend_from(&mut self, other: &NamedLookup) {
        self.entries
            .extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

// A lookup serializes as a plain JSON/TOML table; the name is supplied by
// whoever owns the table.
impl Serialize for NamedLookup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NamedLookup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, Option<String>>::deserialize(deserializer)?;
        let mut lookup = NamedLookup::default();
        for (k, v) in &raw {
            // null values are dropped like any other absent assignment
            lookup.set(Some(k.as_str()), v.as_deref());
        }
        Ok(lookup)
    }
}
