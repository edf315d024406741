//! Typed list-of-strings column stored as a JSONB array
//!
//! Used for paper authors and keywords, dataset tasks/benchmarks and
//! profile interests. Values are normalized once at the write boundary so
//! reads never have to guess the representation.

use crate::errors::{self, AppError};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Deref;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Trim entries, reject blanks and drop case-insensitive duplicates
    /// (first occurrence wins).
    pub fn normalize<I, S>(field: &str, items: I) -> errors::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for item in items {
            let trimmed = item.as_ref().trim();
            if trimmed.is_empty() {
                return Err(AppError::invalid_field(field, "entries must not be blank"));
            }
            if seen.insert(trimmed.to_lowercase()) {
                out.push(trimmed.to_string());
            }
        }
        Ok(Self(out))
    }

    /// Parse an untrusted JSON value; anything but an array of strings is rejected.
    pub fn from_json(field: &str, value: &serde_json::Value) -> errors::Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| AppError::invalid_field(field, "must be a JSON array of strings"))?;

        let mut strings = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str() {
                Some(s) => strings.push(s),
                None => {
                    return Err(AppError::invalid_field(
                        field,
                        "must be a JSON array of strings",
                    ))
                }
            }
        }
        Self::normalize(field, strings)
    }

    /// Like [`StringList::from_json`] but treats an absent value as empty.
    pub fn from_optional_json(field: &str, value: Option<&serde_json::Value>) -> errors::Result<Self> {
        match value {
            None | Some(serde_json::Value::Null) => Ok(Self::new()),
            Some(v) => Self::from_json(field, v),
        }
    }

    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.0.iter().any(|s| s.to_lowercase() == needle)
    }

    /// Lowercased copy of every entry
    pub fn lowercased(&self) -> impl Iterator<Item = String> + '_ {
        self.0.iter().map(|s| s.to_lowercase())
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for StringList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<String>> for StringList {
    fn from(v: Vec<String>) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_trims_and_dedups() {
        let list = StringList::normalize("keywords", ["  NLP ", "vision", "nlp", "Vision"]).unwrap();
        assert_eq!(list.0, vec!["NLP".to_string(), "vision".to_string()]);
    }

    #[test]
    fn test_blank_entry_rejected() {
        let err = StringList::normalize("authors", ["Ada", "   "]).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_from_json_requires_string_array() {
        assert!(StringList::from_json("tasks", &json!("a,b")).is_err());
        assert!(StringList::from_json("tasks", &json!(["a", 1])).is_err());
        assert!(StringList::from_json("tasks", &json!({"a": "b"})).is_err());

        let list = StringList::from_json("tasks", &json!(["detection", "segmentation"])).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_optional_json_defaults_to_empty() {
        assert!(StringList::from_optional_json("keywords", None).unwrap().is_empty());
        assert!(StringList::from_optional_json("keywords", Some(&json!(null)))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let list = StringList(vec!["a".into(), "b".into()]);
        assert_eq!(serde_json::to_value(&list).unwrap(), json!(["a", "b"]));
        assert!(list.contains_ignore_case("A"));
    }
}
