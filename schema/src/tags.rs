use serde::Serialize;
use std::collections::BTreeMap;

/// The only tag with compiler defined meaning.
pub const DEPRECATED: &str = "deprecated";

/// Key/value annotations attached to enumerators, fields, branches and methods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Tags(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Reports whether the `deprecated` tag is present. Its value is ignored.
    pub fn deprecated(&self) -> bool {
        self.contains(DEPRECATED)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deprecated_ignores_value() {
        let tags: Tags = [("deprecated", "")].into_iter().collect();
        assert!(tags.deprecated());

        let tags: Tags = [("deprecated", "use Other instead")].into_iter().collect();
        assert!(tags.deprecated());

        let tags: Tags = [("json", "name")].into_iter().collect();
        assert!(!tags.deprecated());
        assert_eq!(tags.get("json"), Some("name"));
    }
}
