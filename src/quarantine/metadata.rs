//! Metadata recovered from a quarantine container.
//!
//! Vendors record different facts about the quarantined file, so [`Metadata`] is an open,
//! flat mapping rather than a struct. Values are restricted to what can be shown safely in a
//! report: strings, integers and booleans. Binary fields (hashes, security descriptors) are
//! rendered as text before they are inserted.
//!
//! Keys are lowerCamelCase. Fields a vendor does not record are absent; nothing is filled in
//! with placeholder values.

use std::collections::BTreeMap;

use serde::Serialize;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Free text (paths, detection names, dates, URLs)
    String(String),
    /// Numeric fields (sizes, counts, engine versions)
    Integer(i64),
    /// Flags
    Bool(bool),
}

impl MetaValue {
    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaValue::String(value) => f.write_str(value),
            MetaValue::Integer(value) => write!(f, "{value}"),
            MetaValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

/// Flat, key-ordered metadata mapping.
///
/// ```rust
/// use dexray::Metadata;
///
/// let mut metadata = Metadata::new();
/// metadata.insert("originalName", "evil.exe");
/// metadata.insert_text("detectionName", "  ");
///
/// assert_eq!(metadata.get_str("originalName"), Some("evil.exe"));
/// assert!(!metadata.contains_key("detectionName"));
/// assert_eq!(metadata.to_json()?, r#"{"originalName":"evil.exe"}"#);
/// # Ok::<(), dexray::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: BTreeMap<String, MetaValue>,
}

impl Metadata {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Inserts a text field, trimming it and the NUL padding vendors leave behind.
    ///
    /// Empty text is not inserted.
    pub fn insert_text(&mut self, key: impl Into<String>, value: &str) {
        let value = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        if !value.is_empty() {
            self.insert(key, value);
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key)
    }

    /// Returns the string stored under `key`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::as_str)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Renders the mapping as a compact JSON object.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if serialisation fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<K: Into<String>, V: Into<MetaValue>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

/// Converts a vendor field name (`OriginalName`, `Detection Name`) to a metadata key
/// (`originalName`, `detectionName`).
pub(crate) fn metadata_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut upper_next = false;

    for c in name.trim().chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            upper_next = !key.is_empty();
            continue;
        }

        if key.is_empty() {
            key.extend(c.to_lowercase());
        } else if upper_next {
            key.extend(c.to_uppercase());
        } else {
            key.push(c);
        }
        upper_next = false;
    }

    key
}

/// Last component of a Windows or POSIX path, if it has one.
pub(crate) fn file_name_of(path: &str) -> Option<&str> {
    path.rsplit(['\\', '/'])
        .map(|part| part.trim_matches('\0'))
        .find(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_lower_camel() {
        assert_eq!(metadata_key("OriginalName"), "originalName");
        assert_eq!(metadata_key("DetectionName"), "detectionName");
        assert_eq!(metadata_key("Detection Name"), "detectionName");
        assert_eq!(metadata_key("creation_year"), "creationYear");
        assert_eq!(metadata_key(""), "");
    }

    #[test]
    fn file_names() {
        assert_eq!(file_name_of("C:\\Users\\bob\\evil.exe"), Some("evil.exe"));
        assert_eq!(file_name_of("/tmp/evil.sh"), Some("evil.sh"));
        assert_eq!(file_name_of("evil.exe"), Some("evil.exe"));
        assert_eq!(file_name_of("C:\\Temp\\"), Some("Temp"));
        assert_eq!(file_name_of("\\\\"), None);
    }

    #[test]
    fn serialises_flat() {
        let mut metadata = Metadata::new();
        metadata.insert("originalName", "evil.exe");
        metadata.insert("numberOfFiles", 2_i64);
        metadata.insert("wasAlternateStream", false);

        assert_eq!(
            metadata.to_json().unwrap(),
            r#"{"numberOfFiles":2,"originalName":"evil.exe","wasAlternateStream":false}"#
        );
    }

    #[test]
    fn insert_text_trims() {
        let mut metadata = Metadata::new();
        metadata.insert_text("detectionName", "EICAR\0\0\0");
        metadata.insert_text("empty", "\0\0");
        assert_eq!(metadata.get_str("detectionName"), Some("EICAR"));
        assert!(!metadata.contains_key("empty"));
        assert_eq!(metadata.len(), 1);
    }
}
