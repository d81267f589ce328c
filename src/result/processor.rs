//! Turns parsed search results into what the caller asked for.
//!
//! Processing runs in a fixed order: quality filter, then the optional
//! result transform, then the per-document projection.

use std::collections::HashMap;

use crate::builder::markers::Selection;
use crate::builder::query_builder::ResultTransform;
use crate::builder::state::QueryState;
use crate::error::Result;
use crate::result::document::{RawDocument, SearchResults};
use crate::result::quality;

/// Processed results of one query.
#[derive(Debug, Clone)]
pub struct Response<T> {
    total_found: u64,
    start_offset: usize,
    results: Vec<T>,
    raw: Vec<RawDocument>,
    facets: HashMap<String, HashMap<String, u64>>,
}

impl<T> Response<T> {
    /// Total number of matching documents reported by the backend. This is
    /// the count before the quality filter.
    pub fn total_found(&self) -> u64 {
        self.total_found
    }

    /// Offset of the first document.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Projected results.
    pub fn results(&self) -> &[T] {
        &self.results
    }

    /// Consume into the projected results.
    pub fn into_results(self) -> Vec<T> {
        self.results
    }

    /// The documents the results were projected from, aligned with
    /// [`results`](Self::results).
    pub fn raw(&self) -> &[RawDocument] {
        &self.raw
    }

    /// Identifiers of the kept documents. Documents without an id are
    /// skipped.
    pub fn ids(&self) -> Vec<&str> {
        self.raw.iter().filter_map(|d| d.id.as_deref()).collect()
    }

    /// Value counts for every faceted field.
    pub fn facets(&self) -> &HashMap<String, HashMap<String, u64>> {
        &self.facets
    }

    /// Value counts for one faceted field.
    pub fn facet(&self, field: &str) -> Option<&HashMap<String, u64>> {
        self.facets.get(field)
    }

    /// Number of kept results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing was kept.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn filter_and_transform(
    state: &QueryState,
    transform: Option<&ResultTransform>,
    docs: Vec<RawDocument>,
) -> Vec<RawDocument> {
    let docs = quality::apply(docs, state.quality_filter.as_ref());
    match transform {
        Some(transform) => transform(docs),
        None => docs,
    }
}

/// Filter, transform and project a list of documents.
pub fn process_documents<S: Selection>(
    state: &QueryState,
    selection: &S,
    transform: Option<&ResultTransform>,
    docs: Vec<RawDocument>,
) -> Result<Vec<S::Output>> {
    filter_and_transform(state, transform, docs)
        .iter()
        .map(|doc| selection.project(doc))
        .collect()
}

/// Filter, transform and project a full response.
pub fn process_results<S: Selection>(
    state: &QueryState,
    selection: &S,
    transform: Option<&ResultTransform>,
    results: SearchResults,
) -> Result<Response<S::Output>> {
    let raw = filter_and_transform(state, transform, results.docs);
    let projected = raw
        .iter()
        .map(|doc| selection.project(doc))
        .collect::<Result<Vec<_>>>()?;
    Ok(Response {
        total_found: results.total_found,
        start_offset: results.start_offset,
        results: projected,
        raw,
        facets: results.facets,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::builder::QueryBuilder;
    use crate::builder::markers::Unselected;
    use crate::error::SkewerError;

    fn doc(id: &str, score: f64, name: &str) -> RawDocument {
        let mut attributes = serde_json::Map::new();
        attributes.insert("name".to_string(), json!(name));
        RawDocument::new(attributes)
            .with_id(id)
            .with_score(Some(score))
    }

    fn results() -> SearchResults {
        let mut category = HashMap::new();
        category.insert("pizza".to_string(), 4);
        let mut facets = HashMap::new();
        facets.insert("category".to_string(), category);
        SearchResults {
            total_found: 42,
            start_offset: 0,
            docs: vec![
                doc("a", 10.0, "Joe's"),
                doc("b", 9.0, "Lombardi's"),
                doc("c", 8.0, "Prince St"),
                doc("d", 1.0, "Domino's"),
            ],
            facets,
        }
    }

    #[test]
    fn test_unselected_returns_raw_documents() {
        let state = QueryState::new("venues");
        let response = process_results(&state, &Unselected, None, results()).unwrap();

        assert_eq!(response.total_found(), 42);
        assert_eq!(response.len(), 4);
        assert_eq!(response.ids(), vec!["a", "b", "c", "d"]);
        assert_eq!(response.results()[0].get_str("name"), Some("Joe's"));
        assert_eq!(response.facet("category").unwrap()["pizza"], 4);
    }

    #[test]
    fn test_quality_filter_then_projection() {
        let query = QueryBuilder::new("venues")
            .select_into(["name"], |doc| Ok(doc.get_str("name").unwrap_or_default().to_string()))
            .quality_filter(0.5, 2);
        let (state, selection, transform) = query.into_parts();

        let response = process_results(&state, &selection, transform.as_ref(), results()).unwrap();
        assert_eq!(response.results(), ["Joe's", "Lombardi's", "Prince St"]);
        assert_eq!(response.ids(), vec!["a", "b", "c"]);
        assert_eq!(response.total_found(), 42);
    }

    #[test]
    fn test_transform_runs_after_filter() {
        let seen = Arc::new(std::sync::Mutex::new(0));
        let counter = Arc::clone(&seen);
        let query = QueryBuilder::new("venues")
            .quality_filter(0.5, 2)
            .transform(move |mut docs| {
                *counter.lock().unwrap() = docs.len();
                docs.reverse();
                docs
            });

        let ids: Vec<String> = query
            .process(results().docs)
            .unwrap()
            .into_iter()
            .filter_map(|d| d.id)
            .collect();
        assert_eq!(*seen.lock().unwrap(), 3);
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_projection_error_propagates() {
        let query = QueryBuilder::new("venues").select_into(["name"], |doc| {
            doc.get_as::<u32>("checkins")
                .map_err(|e| SkewerError::query(format!("bad document: {e}")))
        });

        let result = query.process(results().docs);
        assert!(matches!(result, Err(SkewerError::Query(_))));
    }

    #[test]
    fn test_empty_results_are_ok() {
        let state = QueryState::new("venues");
        let response =
            process_results(&state, &Unselected, None, SearchResults::default()).unwrap();
        assert!(response.is_empty());
        assert!(response.ids().is_empty());
    }
}
