//! Response parsing for both backends.
//!
//! Every failure carries the raw body and the rendered query that produced
//! it. A backend that reports an error inside a well-formed body yields a
//! transport error, not an empty result.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, SkewerError};
use crate::result::document::{RawDocument, SearchResults, value_to_id};

#[derive(Debug, Deserialize)]
struct FlatEnvelope {
    response: Option<FlatResponse>,
    #[serde(default)]
    highlighting: HashMap<String, HashMap<String, Vec<String>>>,
    facet_counts: Option<FacetCounts>,
    error: Option<FlatError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatResponse {
    num_found: u64,
    #[serde(default)]
    start: usize,
    #[serde(default)]
    docs: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct FacetCounts {
    #[serde(default)]
    facet_fields: HashMap<String, Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct FlatError {
    msg: Option<String>,
    code: Option<u16>,
}

/// Parse a key/value backend response body.
pub fn parse_flat(body: &str, query: &str) -> Result<SearchResults> {
    let envelope: FlatEnvelope = serde_json::from_str(body)
        .map_err(|e| SkewerError::parse(e.to_string(), body, query))?;

    if let Some(error) = envelope.error {
        return Err(SkewerError::transport(
            error.code,
            error.msg.unwrap_or_else(|| "backend reported an error".to_string()),
            query,
        ));
    }
    let response = envelope
        .response
        .ok_or_else(|| SkewerError::parse("missing 'response' section", body, query))?;

    let mut highlighting = envelope.highlighting;
    let docs = response
        .docs
        .into_iter()
        .map(|attributes| {
            let doc = RawDocument::new(attributes);
            match doc.id.as_ref().and_then(|id| highlighting.remove(id)) {
                Some(fragments) => doc.with_highlights(fragments),
                None => doc,
            }
        })
        .collect();

    let facets = match envelope.facet_counts {
        Some(counts) => counts
            .facet_fields
            .into_iter()
            .map(|(field, pairs)| Ok((field, flat_facet_counts(&pairs, body, query)?)))
            .collect::<Result<HashMap<_, _>>>()?,
        None => HashMap::new(),
    };

    Ok(SearchResults {
        total_found: response.num_found,
        start_offset: response.start,
        docs,
        facets,
    })
}

/// Facet counts arrive as one flat `[value, count, value, count, ...]` list.
fn flat_facet_counts(pairs: &[Value], body: &str, query: &str) -> Result<HashMap<String, u64>> {
    pairs
        .chunks(2)
        .map(|pair| match pair {
            [value, count] => {
                let value = value_to_id(value)
                    .ok_or_else(|| SkewerError::parse("non-scalar facet value", body, query))?;
                let count = count
                    .as_u64()
                    .ok_or_else(|| SkewerError::parse("non-integer facet count", body, query))?;
                Ok((value, count))
            }
            _ => Err(SkewerError::parse("odd-length facet list", body, query)),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct StructuredEnvelope {
    hits: Option<Hits>,
    #[serde(default)]
    aggregations: HashMap<String, Aggregation>,
    error: Option<Value>,
    status: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct Hits {
    total: Option<Total>,
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Total {
    Count(u64),
    Object { value: u64 },
}

impl Total {
    fn value(&self) -> u64 {
        match self {
            Total::Count(value) | Total::Object { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: Option<Value>,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Map<String, Value>,
    highlight: Option<HashMap<String, Vec<String>>>,
}

#[derive(Debug, Deserialize)]
struct Aggregation {
    #[serde(default)]
    buckets: Vec<Bucket>,
}

#[derive(Debug, Deserialize)]
struct Bucket {
    key: Value,
    doc_count: u64,
}

fn error_reason(error: &Value) -> String {
    match error {
        Value::String(reason) => reason.clone(),
        other => other
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

/// Parse a structured backend response. The backend does not echo the
/// offset, so the caller passes the `start` it asked for.
pub fn parse_structured(body: &Value, start: usize, query: &str) -> Result<SearchResults> {
    let envelope = StructuredEnvelope::deserialize(body)
        .map_err(|e| SkewerError::parse(e.to_string(), body.to_string(), query))?;

    if let Some(error) = &envelope.error {
        return Err(SkewerError::transport(
            envelope.status,
            error_reason(error),
            query,
        ));
    }
    let hits = envelope
        .hits
        .ok_or_else(|| SkewerError::parse("missing 'hits' section", body.to_string(), query))?;

    let total_found = hits
        .total
        .as_ref()
        .map(Total::value)
        .unwrap_or(hits.hits.len() as u64);

    let docs = hits
        .hits
        .into_iter()
        .map(|hit| {
            let mut doc = RawDocument::new(hit.source).with_score(hit.score);
            if let Some(id) = hit.id.as_ref().and_then(value_to_id) {
                doc = doc.with_id(id);
            }
            match hit.highlight {
                Some(fragments) => doc.with_highlights(fragments),
                None => doc,
            }
        })
        .collect();

    let facets = envelope
        .aggregations
        .into_iter()
        .map(|(field, aggregation)| {
            let counts = aggregation
                .buckets
                .into_iter()
                .filter_map(|bucket| value_to_id(&bucket.key).map(|key| (key, bucket.doc_count)))
                .collect();
            (field, counts)
        })
        .collect();

    Ok(SearchResults {
        total_found,
        start_offset: start,
        docs,
        facets,
    })
}
