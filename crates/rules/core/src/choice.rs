use std::collections::BTreeMap;

/// Named lists of selectable values (feats, races, schools, ...).
///
/// Values keep their first-registration order; duplicates are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ChoiceRegistry {
    categories: BTreeMap<String, Vec<String>>,
}

impl ChoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `values` to `category`, creating it if needed.
    pub fn define<V: Into<String>>(
        &mut self,
        category: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) {
        let entries = self.categories.entry(category.into()).or_default();
        for value in values {
            let value = value.into();
            if !entries.contains(&value) {
                entries.push(value);
            }
        }
    }

    /// Values of `category`; empty when the category is unknown.
    pub fn get(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, category: &str, value: &str) -> bool {
        self.get(category).iter().any(|v| v == value)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
