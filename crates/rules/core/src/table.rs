//! Read-only lookup tables available to formulas through `table(name, key)`.

use std::collections::BTreeMap;

use crate::attribute::Value;

/// Named key → value tables registered alongside the rules.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tables {
    tables: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds entries to `table`, creating it if needed. Later entries replace
    /// earlier ones with the same key.
    pub fn define<K, V>(&mut self, table: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let target = self.tables.entry(table.into()).or_default();
        for (key, value) in entries {
            target.insert(key.into(), value.into());
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// `None` when the table is unknown, `Some(None)` when the key is.
    pub fn lookup(&self, table: &str, key: &str) -> Option<Option<&Value>> {
        self.tables.get(table).map(|entries| entries.get(key))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Value>)> {
        self.tables.iter().map(|(name, entries)| (name.as_str(), entries))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
