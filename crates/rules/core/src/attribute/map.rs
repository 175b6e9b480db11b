use std::collections::BTreeMap;
use std::collections::btree_map;

use super::{AttrName, Value};
use crate::rule::Family;

/// Ordered mapping from attribute name to value.
///
/// Both the caller's inputs and the engine's resolved output use this type.
/// Iteration is always in name order, which keeps family aggregation and
/// rendered output reproducible.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AttributeMap {
    values: BTreeMap<AttrName, Value>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Numeric value of `name`, if present and numeric.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_number)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<AttrName>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, AttrName, Value> {
        self.values.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &AttrName> {
        self.values.keys()
    }

    /// Entries whose name belongs to `family`, in name order.
    pub fn matching<'a>(
        &'a self,
        family: &'a Family,
    ) -> impl Iterator<Item = (&'a AttrName, &'a Value)> + 'a {
        let range: Box<dyn Iterator<Item = (&'a AttrName, &'a Value)> + 'a> = match family {
            // Prefix families are a contiguous range of the ordered map.
            Family::Prefix(prefix) => Box::new(
                self.values
                    .range::<str, _>((
                        std::ops::Bound::Included(prefix.as_str()),
                        std::ops::Bound::Unbounded,
                    ))
                    .take_while(move |(name, _)| name.as_str().starts_with(prefix.as_str())),
            ),
            Family::Pattern(_) => Box::new(self.values.iter()),
        };
        range.filter(move |(name, _)| family.contains(name.as_str()))
    }
}

impl<'a> IntoIterator for &'a AttributeMap {
    type Item = (&'a AttrName, &'a Value);
    type IntoIter = btree_map::Iter<'a, AttrName, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl IntoIterator for AttributeMap {
    type Item = (AttrName, Value);
    type IntoIter = btree_map::IntoIter<AttrName, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<N, V> FromIterator<(N, V)> for AttributeMap
where
    N: Into<AttrName>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl<N, V> Extend<(N, V)> for AttributeMap
where
    N: Into<AttrName>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_family_walks_only_its_range() {
        let map: AttributeMap = [
            ("languages.Common", 1),
            ("languages.Elven", 1),
            ("languageCount", 2),
            ("level", 3),
        ]
        .into_iter()
        .collect();

        let family = Family::Prefix("languages.".to_owned());
        let names: Vec<_> = map.matching(&family).map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["languages.Common", "languages.Elven"]);
    }

    #[test]
    fn lookups_accept_plain_str() {
        let mut map = AttributeMap::new();
        map.insert("strength", 16);
        assert_eq!(map.number("strength"), Some(16.0));
        assert!(map.contains("strength"));
        assert_eq!(map.remove("strength"), Some(Value::from(16)));
        assert!(map.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn character_json_round_trips() {
        let json = r#"{"race":"Elf","strength":16,"features.Dodge":true}"#;
        let map: AttributeMap = serde_json::from_str(json).unwrap();

        assert_eq!(map.get("race"), Some(&Value::from("Elf")));
        assert_eq!(map.number("strength"), Some(16.0));
        assert_eq!(map.get("features.Dodge"), Some(&Value::Bool(true)));

        let back: AttributeMap = serde_json::from_str(&serde_json::to_string(&map).unwrap()).unwrap();
        assert_eq!(back, map);
    }
}
