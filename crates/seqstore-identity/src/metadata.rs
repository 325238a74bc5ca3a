//! Request header to object metadata mapping.

use std::collections::{BTreeMap, HashMap};

use seqstore_store::Metadata;

/// Anything request headers can be looked up in by name.
pub trait HeaderSource {
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderSource for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl HeaderSource for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Case-insensitive lookup; values that are not visible ASCII are skipped.
impl HeaderSource for http::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

impl<T: HeaderSource + ?Sized> HeaderSource for &T {
    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }
}

/// Split a `;`-delimited header list, dropping blanks.
///
/// Returns `None` when nothing is configured.
pub fn parse_metadata_keys(raw: Option<&str>) -> Option<Vec<String>> {
    let keys: Vec<String> = raw?
        .split(';')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();
    if keys.is_empty() {
        None
    } else {
        Some(keys)
    }
}

/// Copy each configured header that is present (and non-empty) into a
/// metadata set, keyed by the configured name.
///
/// Missing input on either side yields an empty set.
pub fn extract_metadata<H>(keys: Option<&[String]>, headers: Option<&H>) -> Metadata
where
    H: HeaderSource + ?Sized,
{
    let mut metadata = Metadata::new();
    let (Some(keys), Some(headers)) = (keys, headers) else {
        return metadata;
    };
    for key in keys {
        if let Some(value) = headers.header(key).filter(|v| !v.is_empty()) {
            metadata.insert(key.clone(), value.to_string());
        }
    }
    metadata
}
