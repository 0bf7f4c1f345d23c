//! Flat key/value state shared with a persistence collaborator.
//!
//! Keys are dotted (`<prefix>.<region>.<property>`), values are compact strings such
//! as `"1,2,3,0,4,"` for an order list or `"1:200,"` for per-index sizes. How the map
//! is stored is up to the caller; it serializes to a JSON object.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Ordered string → string map of persisted layer state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, String>);

/// Join a prefix and a property name with a dot.
pub fn property_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a JSON object of string values.
    ///
    /// # Errors
    /// Returns an error if the input is not a JSON object of strings.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize as a pretty-printed JSON object.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load properties from a JSON file.
    ///
    /// # Errors
    /// Returns [`GridError::Io`] if the file cannot be read, or a JSON error.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Write properties to a JSON file, replacing it.
    ///
    /// # Errors
    /// Returns [`GridError::Io`] if the file cannot be written.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Encode a list as `"a,b,c,"`.
pub fn encode_list<I: IntoIterator<Item = usize>>(values: I) -> String {
    values.into_iter().map(|v| format!("{v},")).collect()
}

/// Decode `"a,b,c,"` (trailing comma optional, whitespace ignored).
///
/// # Errors
/// Returns [`GridError::State`] if any entry is not a non-negative integer.
pub fn decode_list(key: &str, value: &str) -> Result<Vec<usize>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>().map_err(|_| GridError::State {
                key: key.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// Decode a set written by [`encode_list`].
///
/// # Errors
/// Returns [`GridError::State`] if any entry is not a non-negative integer.
pub fn decode_set(key: &str, value: &str) -> Result<BTreeSet<usize>> {
    Ok(decode_list(key, value)?.into_iter().collect())
}

/// Encode per-index sizes as `"index:size,"`.
pub fn encode_sizes(sizes: &BTreeMap<usize, u32>) -> String {
    sizes.iter().map(|(i, s)| format!("{i}:{s},")).collect()
}

/// Decode `"index:size,"` pairs.
///
/// # Errors
/// Returns [`GridError::State`] on a malformed pair.
pub fn decode_sizes(key: &str, value: &str) -> Result<BTreeMap<usize, u32>> {
    let invalid = || GridError::State {
        key: key.to_string(),
        value: value.to_string(),
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (index, size) = pair.split_once(':').ok_or_else(invalid)?;
            let index = index.trim().parse::<usize>().map_err(|_| invalid())?;
            let size = size.trim().parse::<u32>().map_err(|_| invalid())?;
            Ok((index, size))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_roundtrip() {
        let encoded = encode_list([1, 2, 3, 0, 4]);
        assert_eq!(encoded, "1,2,3,0,4,");
        assert_eq!(decode_list("k", &encoded).ok(), Some(vec![1, 2, 3, 0, 4]));
        assert_eq!(decode_list("k", " 5 , 6").ok(), Some(vec![5, 6]));
    }

    #[test]
    fn test_malformed_list_is_error() {
        let err = decode_list("grid.BODY.columnIndexOrder", "1,x,").unwrap_err();
        assert!(err.to_string().contains("columnIndexOrder"));
    }

    #[test]
    fn test_sizes_roundtrip() {
        let sizes: BTreeMap<usize, u32> = [(1, 200), (4, 35)].into_iter().collect();
        let encoded = encode_sizes(&sizes);
        assert_eq!(encoded, "1:200,4:35,");
        assert_eq!(decode_sizes("k", &encoded).ok(), Some(sizes));
        assert!(decode_sizes("k", "1-200,").is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut props = Properties::new();
        props.set(property_key("grid.BODY", "columnIndexOrder"), "1,0,");
        let json = props.to_json().unwrap();
        assert!(json.contains("\"grid.BODY.columnIndexOrder\""));
        assert_eq!(Properties::from_json(&json).unwrap(), props);
    }

    #[test]
    fn test_file_roundtrip_and_missing_file() {
        let path = std::env::temp_dir().join(format!("gridlayer-state-{}.json", std::process::id()));
        let mut props = Properties::new();
        props.set("grid.BODY.hiddenColumnIndexes", "3,");
        props.write_file(&path).unwrap();
        assert_eq!(Properties::read_file(&path).unwrap(), props);
        let _ = fs::remove_file(&path);

        let err = Properties::read_file(path.with_extension("missing")).unwrap_err();
        assert!(matches!(err, GridError::Io(_)));
    }
}
