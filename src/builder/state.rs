//! Accumulated builder settings.
//!
//! [`QueryState`] is the plain data both compilers consume. It carries no
//! typestate and no closures, so two states compare and hash structurally and
//! can be used as cache keys.

use serde::{Deserialize, Serialize};

use crate::query::clause::Clause;
use crate::query::expr::{Query, Scalar};

/// Rows returned when no limit is set.
pub const DEFAULT_LIMIT: usize = 10;

/// A field with a relevance weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeightedField {
    /// Wire name of the field.
    pub field: String,
    /// Relevance weight. Zero weights are never compiled.
    pub weight: Scalar,
}

impl WeightedField {
    /// Create a weighted field.
    pub fn new<S: Into<String>>(field: S, weight: f64) -> Self {
        WeightedField {
            field: field.into(),
            weight: weight.into(),
        }
    }

    /// Whether the field contributes anything.
    pub fn is_active(&self) -> bool {
        !self.weight.is_zero()
    }
}

/// Phrase proximity boosting on one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhraseBoost {
    /// The weighted field.
    pub field: WeightedField,
    /// Boost whole-query phrase matches.
    pub pf: bool,
    /// Boost word-pair (bigram) matches.
    pub pf2: bool,
    /// Boost word-triple (trigram) matches.
    pub pf3: bool,
}

/// A scoring function term with its weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoostFunction {
    /// The function, e.g. a reciprocal of a distance.
    pub function: Query,
    /// Multiplier applied to the function value.
    pub weight: Scalar,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Wire spelling shared by both backends.
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// What results are sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortTarget {
    /// A stored field.
    Field(String),
    /// A scoring function expression.
    Function(Query),
}

/// The sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    /// What to sort by.
    pub target: SortTarget,
    /// Which way.
    pub direction: SortDirection,
}

/// Minimum number of optional clauses that must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinimumMatch {
    /// Percentage of the clauses.
    Percent(u32),
    /// Absolute number of clauses.
    Absolute(u32),
}

impl MinimumMatch {
    /// Wire spelling shared by both backends: `75%` or `2`.
    pub fn to_param(self) -> String {
        match self {
            MinimumMatch::Percent(n) => format!("{n}%"),
            MinimumMatch::Absolute(n) => n.to_string(),
        }
    }
}

/// Parameters of the quality-decay result filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualityFilter {
    /// Decay ratio in `(0, 1]`.
    pub fall_off: Scalar,
    /// Results kept unconditionally.
    pub min_results: usize,
}

/// Facet counting settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacetSettings {
    /// Fields to count values of.
    pub fields: Vec<String>,
    /// Maximum number of values returned per field.
    pub limit: Option<usize>,
    /// Values counted fewer times are dropped.
    pub min_count: Option<usize>,
}

impl FacetSettings {
    /// Whether any facet was requested.
    pub fn is_enabled(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// Restrict results to a radius around a point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spatial {
    /// The point field.
    pub field: String,
    /// Latitude of the center.
    pub lat: Scalar,
    /// Longitude of the center.
    pub lng: Scalar,
    /// Radius in kilometers.
    pub distance_km: Scalar,
}

/// Everything accumulated by a query builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryState {
    /// Index (core, collection) the query targets.
    pub index: String,
    /// The scoring clause.
    pub clause: Option<Clause>,
    /// Match restrictions that do not affect score.
    pub filters: Vec<Clause>,
    /// Clauses that affect score without restricting matches.
    pub boost_queries: Vec<Clause>,
    /// Function terms folded into the score.
    pub boost_functions: Vec<BoostFunction>,
    /// Weighted default fields for unscoped clauses.
    pub query_fields: Vec<WeightedField>,
    /// Phrase proximity boosts.
    pub phrase_boosts: Vec<PhraseBoost>,
    /// Tie breaker between default fields.
    pub tie_breaker: Option<Scalar>,
    /// Backend query parser, e.g. `edismax`.
    pub query_type: Option<String>,
    /// Facet counting.
    pub facets: FacetSettings,
    /// Sort order; relevance when unset.
    pub sort: Option<Sort>,
    /// Offset of the first result.
    pub start: usize,
    /// Number of results.
    pub limit: usize,
    /// Minimum match threshold.
    pub minimum_match: Option<MinimumMatch>,
    /// Quality-decay filter parameters.
    pub quality_filter: Option<QualityFilter>,
    /// Whether highlighted fragments are requested.
    pub highlighting: bool,
    /// Explicit list of fields to fetch.
    pub fields: Vec<String>,
    /// Radius restriction.
    pub spatial: Option<Spatial>,
}

impl QueryState {
    /// Create an empty state for an index.
    pub fn new<S: Into<String>>(index: S) -> Self {
        QueryState {
            index: index.into(),
            clause: None,
            filters: Vec::new(),
            boost_queries: Vec::new(),
            boost_functions: Vec::new(),
            query_fields: Vec::new(),
            phrase_boosts: Vec::new(),
            tie_breaker: None,
            query_type: None,
            facets: FacetSettings::default(),
            sort: None,
            start: 0,
            limit: DEFAULT_LIMIT,
            minimum_match: None,
            quality_filter: None,
            highlighting: false,
            fields: Vec::new(),
            spatial: None,
        }
    }

    /// Query fields with a non-zero weight.
    pub fn active_query_fields(&self) -> impl Iterator<Item = &WeightedField> {
        self.query_fields.iter().filter(|f| f.is_active())
    }

    /// Fields highlighted fragments are requested for: the fields named by
    /// the scoring clause, else the weighted default fields.
    pub fn highlight_fields(&self) -> Vec<String> {
        let named = self
            .clause
            .as_ref()
            .map(Clause::field_names)
            .unwrap_or_default();
        if !named.is_empty() {
            return named;
        }
        self.active_query_fields().map(|f| f.field.clone()).collect()
    }

    /// The same query moved to another page.
    pub fn page(&self, start: usize, limit: usize) -> QueryState {
        QueryState {
            start,
            limit,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::clause::FieldClause;

    #[test]
    fn test_defaults() {
        let state = QueryState::new("venues");
        assert_eq!(state.start, 0);
        assert_eq!(state.limit, DEFAULT_LIMIT);
        assert!(state.clause.is_none());
        assert!(!state.facets.is_enabled());
    }

    #[test]
    fn test_minimum_match_param() {
        assert_eq!(MinimumMatch::Percent(75).to_param(), "75%");
        assert_eq!(MinimumMatch::Absolute(2).to_param(), "2");
    }

    #[test]
    fn test_active_query_fields_skip_zero() {
        let mut state = QueryState::new("venues");
        state.query_fields = vec![
            WeightedField::new("name", 2.0),
            WeightedField::new("tags", 0.0),
        ];

        let active: Vec<&str> = state.active_query_fields().map(|f| f.field.as_str()).collect();
        assert_eq!(active, vec!["name"]);
    }

    #[test]
    fn test_highlight_fields() {
        let mut state = QueryState::new("venues");
        state.query_fields = vec![WeightedField::new("name", 1.0)];
        assert_eq!(state.highlight_fields(), vec!["name".to_string()]);

        state.clause = Some(FieldClause::new("city", Query::term("nyc")).into());
        assert_eq!(state.highlight_fields(), vec!["city".to_string()]);
    }

    #[test]
    fn test_page() {
        let state = QueryState::new("venues");
        let paged = state.page(20, 5);
        assert_eq!(paged.start, 20);
        assert_eq!(paged.limit, 5);
        assert_eq!(paged.index, "venues");
    }
}
