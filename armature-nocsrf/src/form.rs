//! Request-side inputs to a check: submitted form fields and the requester's
//! origin.

use crate::error::{CsrfError, Result};
use crate::fingerprint::RequestOrigin;
use std::collections::HashMap;

/// Submitted form fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: HashMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// When a field repeats, the last occurrence wins.
    pub fn from_urlencoded(body: &[u8]) -> Result<Self> {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)?;
        Ok(pairs.into_iter().collect())
    }

    /// Parse a JSON object body.
    ///
    /// Strings are kept as-is, numbers and booleans are converted to their
    /// textual form, and nulls, arrays and nested objects are dropped.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        let serde_json::Value::Object(map) = value else {
            return Err(CsrfError::Form("expected a JSON object".to_string()));
        };

        let fields = map
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some((key, s)),
                serde_json::Value::Number(n) => Some((key, n.to_string())),
                serde_json::Value::Bool(b) => Some((key, b.to_string())),
                _ => None,
            })
            .collect();

        Ok(Self { fields })
    }

    /// Add or replace a field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for FormData {
    fn from(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }
}

/// Everything a check needs to know about the current request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub origin: RequestOrigin,
    pub form: FormData,
}

impl RequestContext {
    pub fn new(origin: RequestOrigin) -> Self {
        Self {
            origin,
            form: FormData::new(),
        }
    }

    /// Set the submitted form data
    pub fn with_form(mut self, form: FormData) -> Self {
        self.form = form;
        self
    }

    /// Add a single form field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key, value);
        self
    }
}
