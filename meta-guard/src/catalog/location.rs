//! Physical locations of catalog objects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MetaError, Result};

/// A property map describing where a catalog object lives.
///
/// Keys are free-form, but [`Location::TYPE`], [`Location::INDEX`] and
/// [`Location::PATH`] are understood by the catalog itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
}

impl Location {
    /// Kind of the location, e.g. `"file"` or `"jdbc"`.
    pub const TYPE: &'static str = "type";
    /// Position of a column within its table.
    pub const INDEX: &'static str = "index";
    /// Path or URL of the underlying data.
    pub const PATH: &'static str = "path";

    /// Creates an empty location.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a location pointing at a file.
    pub fn for_file(path: impl Into<String>) -> Self {
        Self::new()
            .with(Self::TYPE, "file")
            .with(Self::PATH, path)
    }

    /// Creates a location for the column at `index`.
    pub fn for_index(index: usize) -> Self {
        Self::new().with(Self::INDEX, index.to_string())
    }

    /// Sets a property, returning the updated location.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a property. The `type` value is canonicalized to lowercase.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let mut value = value.into();
        if key == Self::TYPE {
            value = value.to_lowercase();
        }
        self.properties.insert(key, value);
    }

    /// Removes a property.
    pub fn delete(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    /// Returns a property if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns a property or fails if it is absent.
    pub fn get_required(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            MetaError::invalid_argument(format!("No property associated with {key} in {self}"))
        })
    }

    /// Returns all properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Location {:?}", self.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_file() {
        let location = Location::for_file("/data/orders.csv");
        assert_eq!(location.get(Location::TYPE), Some("file"));
        assert_eq!(location.get(Location::PATH), Some("/data/orders.csv"));
    }

    #[test]
    fn test_type_is_canonicalized() {
        let location = Location::new().with(Location::TYPE, "JDBC");
        assert_eq!(location.get(Location::TYPE), Some("jdbc"));
    }

    #[test]
    fn test_required_property() {
        let mut location = Location::for_index(3);
        assert_eq!(location.get_required(Location::INDEX).unwrap(), "3");
        location.delete(Location::INDEX);
        assert!(location.get_required(Location::INDEX).is_err());
    }
}
