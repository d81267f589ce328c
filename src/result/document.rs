//! Backend-neutral shapes of a search response.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SkewerError};

/// One returned document, as the backend sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Stored attributes.
    pub attributes: Map<String, Value>,
    /// Highlighted fragments per field, when highlighting was requested.
    pub highlights: Option<HashMap<String, Vec<String>>>,
    /// Relevance score, when the backend returned one.
    pub score: Option<f64>,
    /// Document identifier.
    pub id: Option<String>,
}

impl RawDocument {
    /// Create a document from its attributes. Score and id are picked up from
    /// the `score` and `id` attributes when present.
    pub fn new(attributes: Map<String, Value>) -> Self {
        let score = attributes.get("score").and_then(Value::as_f64);
        let id = attributes.get("id").and_then(value_to_id);
        RawDocument {
            attributes,
            highlights: None,
            score,
            id,
        }
    }

    /// Set the score.
    pub fn with_score(mut self, score: Option<f64>) -> Self {
        self.score = score;
        self
    }

    /// Set the id.
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the highlighted fragments.
    pub fn with_highlights(mut self, highlights: HashMap<String, Vec<String>>) -> Self {
        self.highlights = Some(highlights);
        self
    }

    /// Get a raw attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Get a string attribute.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// Deserialize one attribute.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self
            .attributes
            .get(name)
            .cloned()
            .ok_or_else(|| SkewerError::query(format!("Missing attribute '{name}'")))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Deserialize the whole attribute map into a record type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.attributes.clone()))?)
    }

    /// Highlighted fragments for one field.
    pub fn highlights_for(&self, field: &str) -> &[String] {
        self.highlights
            .as_ref()
            .and_then(|h| h.get(field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Identifiers are strings on one backend and sometimes numbers on the other.
pub(crate) fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A parsed search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Total number of matching documents.
    pub total_found: u64,
    /// Offset of the first returned document.
    pub start_offset: usize,
    /// Returned documents, in backend order.
    pub docs: Vec<RawDocument>,
    /// Value counts per faceted field.
    pub facets: HashMap<String, HashMap<String, u64>>,
}
