use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Name of an attribute in the flat evaluation namespace.
///
/// Names are dotted paths (`combatNotes.dodgeFeature`, `skills.Stealth`).
/// The first segment is the logical namespace. Cloning is a reference-count
/// bump, so names can be shared freely between rules, notes and maps.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttrName(Arc<str>);

impl AttrName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segment before the first `.`, or the whole name when undotted.
    ///
    /// ```
    /// # use rules_core::AttrName;
    /// assert_eq!(AttrName::new("skills.Stealth").namespace(), "skills");
    /// assert_eq!(AttrName::new("strength").namespace(), "strength");
    /// ```
    pub fn namespace(&self) -> &str {
        self.0.split_once('.').map_or(&self.0, |(head, _)| head)
    }

    /// Companion attribute feeding placeholder `%n` of this attribute's note.
    ///
    /// ```
    /// # use rules_core::AttrName;
    /// assert_eq!(AttrName::new("strength").companion(1).as_str(), "strength.1");
    /// ```
    pub fn companion(&self, index: usize) -> AttrName {
        AttrName::new(format!("{}.{}", self.0, index))
    }
}

impl fmt::Debug for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AttrName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AttrName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttrName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AttrName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for AttrName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&AttrName> for AttrName {
    fn from(name: &AttrName) -> Self {
        name.clone()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for AttrName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AttrName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name))
    }
}
