//! Binding records: the per-element instructions applied to a template.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One data-driven instruction: which element to update and with what.
///
/// Every field is optional in the serialized form; `null` and missing keys
/// both decode to `None` and unknown keys are ignored.
///
/// ```
/// let records = sitebind::record::parse_records(
///     r#"[{"selector":"avatar","value":"me.png","link":"https://cdn.example/"}]"#,
/// ).unwrap();
/// assert!(records[0].is_applicable());
/// assert_eq!(records[0].target_url(), Some("https://cdn.example/me.png".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecord {
    /// Element id, without the leading `#`
    #[serde(default)]
    pub selector: Option<String>,
    /// URL path segment or literal display text, depending on the element
    #[serde(default)]
    pub value: Option<String>,
    /// Optional URL base prepended to `value`
    #[serde(default)]
    pub link: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl BindingRecord {
    pub fn new(selector: &str, value: &str, link: Option<&str>) -> Self {
        Self {
            selector: Some(selector.to_string()),
            value: Some(value.to_string()),
            link: link.map(|s| s.to_string()),
        }
    }

    /// Non-empty selector, if any
    pub fn selector(&self) -> Option<&str> {
        present(&self.selector)
    }

    /// Non-empty value, if any
    pub fn value(&self) -> Option<&str> {
        present(&self.value)
    }

    /// Non-empty link, if any
    pub fn link(&self) -> Option<&str> {
        present(&self.link)
    }

    /// A record is applied only when both selector and value are non-empty.
    pub fn is_applicable(&self) -> bool {
        self.selector().is_some() && self.value().is_some()
    }

    /// `link + value` when both are non-empty, otherwise the link as given.
    pub fn target_url(&self) -> Option<String> {
        match (self.link(), self.value()) {
            (Some(link), Some(value)) => Some(format!("{}{}", link, value)),
            _ => self.link.clone(),
        }
    }

    /// True when the record carries no URL information at all.
    ///
    /// Only consulted for applicable records, whose value is never empty, so
    /// this does not fire for well-formed string input.
    pub fn needs_hiding(&self) -> bool {
        self.link().is_none() && self.value().is_none()
    }
}

/// Decode a JSON array of binding records.
pub fn parse_records(json: &str) -> Result<Vec<BindingRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Read binding records from a JSON file.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<BindingRecord>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| Error::source_io(path, e))?;
    parse_records(&json)
}
