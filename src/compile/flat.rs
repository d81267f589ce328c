//! Compiler for the key/value parameter backend.
//!
//! The scoring clause becomes a single query string in the backend's
//! Lucene-style syntax; every other setting becomes one or more key/value
//! pairs. Repeated keys (`fq`, `bq`, `qf`, ...) keep insertion order, but
//! consumers should compare parameter lists as multisets.

use std::fmt;

use crate::builder::state::{QueryState, SortTarget, WeightedField};
use crate::error::{Result, SkewerError};
use crate::query::clause::Clause;
use crate::query::escape::{escape, escape_phrase, escape_tokens, quote};
use crate::query::expr::{DistanceShape, Query};

/// Field list requested when a spatial restriction is set and no explicit
/// fields were selected.
pub const SPATIAL_FIELD_LIST: &str = "*,_dist_:geodist()";

/// Compiled key/value parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatQuery {
    params: Vec<(String, String)>,
}

impl FlatQuery {
    fn new() -> Self {
        FlatQuery { params: Vec::new() }
    }

    fn push<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.params.push((key.into(), value.into()));
    }

    /// All pairs in emission order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a key, in emission order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    /// The pairs as a sorted multiset, for order-insensitive comparison.
    pub fn to_multiset(&self) -> Vec<(String, String)> {
        let mut params = self.params.clone();
        params.sort();
        params
    }

    /// The rendered `q` parameter.
    pub fn query_string(&self) -> &str {
        self.get("q").unwrap_or("*:*")
    }

    /// Encode as an `application/x-www-form-urlencoded` request body.
    pub fn to_form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.params)
            .finish()
    }
}

impl fmt::Display for FlatQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_form_body())
    }
}

fn token(value: &str, escaped: bool) -> String {
    if value.is_empty() {
        quote("")
    } else if escaped {
        escape(value)
    } else {
        value.to_string()
    }
}

/// Render an expression in query-string syntax.
pub fn render_query(query: &Query) -> String {
    match query {
        Query::Splat => "*".to_string(),
        Query::Term { values, escape } => {
            if values.is_empty() {
                quote("")
            } else {
                values
                    .iter()
                    .map(|v| token(v, *escape))
                    .collect::<Vec<_>>()
                    .join(" OR ")
            }
        }
        Query::Phrase { value, escape: escaped } => {
            if *escaped {
                quote(&escape_phrase(value))
            } else {
                quote(value)
            }
        }
        Query::BagOfWords { value, escape } => {
            if value.trim().is_empty() {
                // An empty group does not parse; match the empty token instead.
                quote("")
            } else if *escape {
                escape_tokens(value)
            } else {
                value.split_whitespace().collect::<Vec<_>>().join(" ")
            }
        }
        Query::Group(inner) => format!("({})", render_query(inner)),
        Query::Boost { query, weight } => match query.as_ref() {
            Query::Group(_) => format!("{}^{}", render_query(query), weight),
            inner => format!("({})^{}", render_query(inner), weight),
        },
        Query::Range { low, high } => {
            format!("[{} TO {}]", render_query(low), render_query(high))
        }
        Query::And(queries) => join(queries, " AND "),
        Query::Or(queries) => join(queries, " OR "),
        Query::GeoDist {
            field,
            lat,
            lng,
            shape,
        } => match shape {
            DistanceShape::Arc => format!("geodist({field},{lat},{lng})"),
            DistanceShape::Square => format!("sqedist({field},{lat},{lng})"),
        },
        Query::Recip { query, x, y, z } => {
            format!("recip({},{x},{y},{z})", render_query(query))
        }
        Query::FieldValue(field) => field.clone(),
    }
}

fn join(queries: &[Query], separator: &str) -> String {
    queries
        .iter()
        .map(render_query)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Render a clause tree in query-string syntax.
///
/// A negated clause is subtracted from the match-all query, so it stays
/// valid on its own: `(*:* -field:(value))`.
pub fn render_clause(clause: &Clause) -> String {
    match clause {
        Clause::Field(field_clause) => {
            let body = render_query(&field_clause.query);
            let scoped = if field_clause.is_unscoped() {
                body
            } else {
                format!("{}:{}", field_clause.field_name, body)
            };
            if field_clause.include {
                scoped
            } else {
                format!("(*:* -{scoped})")
            }
        }
        Clause::And(clauses) => join_clauses(clauses, " AND "),
        Clause::Or(clauses) => join_clauses(clauses, " OR "),
    }
}

fn join_clauses(clauses: &[Clause], separator: &str) -> String {
    clauses
        .iter()
        .map(|c| format!("({})", render_clause(c)))
        .collect::<Vec<_>>()
        .join(separator)
}

fn weighted(field: &WeightedField) -> String {
    if field.weight.get() == 1.0 {
        field.field.clone()
    } else {
        format!("{}^{}", field.field, field.weight)
    }
}

fn sort_param(state: &QueryState) -> Result<Option<String>> {
    let Some(sort) = &state.sort else {
        return Ok(None);
    };
    let target = match &sort.target {
        SortTarget::Field(field) => field.clone(),
        SortTarget::Function(function) if function.is_function() => render_query(function),
        SortTarget::Function(other) => {
            return Err(SkewerError::not_implemented(format!(
                "sorting by non-function expression {other:?}"
            )));
        }
    };
    Ok(Some(format!("{target} {}", sort.direction.as_str())))
}

fn field_list(state: &QueryState) -> Option<String> {
    let mut fields: Vec<String> = if !state.fields.is_empty() {
        state.fields.clone()
    } else if state.spatial.is_some() {
        vec![SPATIAL_FIELD_LIST.to_string()]
    } else if state.quality_filter.is_some() {
        vec!["*".to_string()]
    } else {
        return None;
    };
    // The quality filter needs scores back.
    if state.quality_filter.is_some() && !fields.iter().any(|f| f == "score") {
        fields.push("score".to_string());
    }
    Some(fields.join(","))
}

/// Compile a builder state into key/value parameters.
pub fn compile(state: &QueryState) -> Result<FlatQuery> {
    let mut query = FlatQuery::new();

    let q = state
        .clause
        .as_ref()
        .map(render_clause)
        .unwrap_or_else(|| "*:*".to_string());
    query.push("q", q);

    if let Some(query_type) = &state.query_type {
        query.push("defType", query_type.as_str());
    }
    if let Some(mm) = state.minimum_match {
        query.push("mm", mm.to_param());
    }

    for field in state.active_query_fields() {
        query.push("qf", weighted(field));
    }
    for boost in state.phrase_boosts.iter().filter(|b| b.field.is_active()) {
        let value = weighted(&boost.field);
        if boost.pf {
            query.push("pf", value.as_str());
        }
        if boost.pf2 {
            query.push("pf2", value.as_str());
        }
        if boost.pf3 {
            query.push("pf3", value.as_str());
        }
    }
    if let Some(tie) = state.tie_breaker {
        query.push("tie", tie.to_string());
    }

    for boost in &state.boost_queries {
        query.push("bq", render_clause(boost));
    }
    for function in state.boost_functions.iter().filter(|f| !f.weight.is_zero()) {
        query.push(
            "bf",
            format!("{}^{}", render_query(&function.function), function.weight),
        );
    }

    for filter in &state.filters {
        query.push("fq", render_clause(filter));
    }

    if let Some(spatial) = &state.spatial {
        query.push("fq", "{!geofilt}");
        query.push("sfield", spatial.field.as_str());
        query.push("pt", format!("{},{}", spatial.lat.get(), spatial.lng.get()));
        query.push("d", spatial.distance_km.get().to_string());
    }

    if let Some(sort) = sort_param(state)? {
        query.push("sort", sort);
    }

    query.push("start", state.start.to_string());
    query.push("rows", state.limit.to_string());

    if let Some(fields) = field_list(state) {
        query.push("fl", fields);
    }

    if state.facets.is_enabled() {
        query.push("facet", "true");
        for field in &state.facets.fields {
            query.push("facet.field", field.as_str());
        }
        if let Some(limit) = state.facets.limit {
            query.push("facet.limit", limit.to_string());
        }
        if let Some(min_count) = state.facets.min_count {
            query.push("facet.mincount", min_count.to_string());
        }
    }

    if state.highlighting {
        query.push("hl", "true");
        let fields = state.highlight_fields();
        if !fields.is_empty() {
            query.push("hl.fl", fields.join(","));
        }
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::QueryBuilder;
    use crate::query::clause::FieldClause;
    use crate::query::geo::GeoPoint;
    use crate::schema::field::Field;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn test_simple_where() {
        let fullname = Field::text("fullname");
        let query = QueryBuilder::new("users")
            .where_(fullname.eqs("jon"))
            .compile_flat()
            .unwrap();

        assert_eq!(
            query.to_multiset(),
            pairs(&[("q", "fullname:(\"jon\")"), ("start", "0"), ("rows", "10")])
        );
    }

    #[test]
    fn test_edismax_with_minimum_match() {
        let field = Field::text("field");
        let query = QueryBuilder::new("users")
            .use_query_type("edismax")
            .minimum_match_percent(75)
            .where_(field.eqs("jason"))
            .compile_flat()
            .unwrap();

        assert_eq!(
            query.to_multiset(),
            pairs(&[
                ("defType", "edismax"),
                ("mm", "75%"),
                ("q", "field:(\"jason\")"),
                ("start", "0"),
                ("rows", "10"),
            ])
        );
    }

    #[test]
    fn test_negated_clause() {
        let field = Field::integer("count");
        assert_eq!(render_clause(&field.neqs(5)), "(*:* -count:(5))");

        let name = Field::text("name");
        assert_eq!(render_clause(&name.neqs("jon")), "(*:* -name:(\"jon\"))");
    }

    #[test]
    fn test_ranges() {
        let count = Field::integer("count");
        assert_eq!(render_clause(&count.less_than(5)), "count:[* TO 5]");
        assert_eq!(render_clause(&count.greater_than(5)), "count:[5 TO *]");
        assert_eq!(render_clause(&count.in_range(1, 9)), "count:[1 TO 9]");
        assert_eq!(render_clause(&count.exists()), "count:[* TO *]");
    }

    #[test]
    fn test_escaping_default_and_opt_out() {
        let name = Field::text("name");
        assert_eq!(render_clause(&name.eqs("jean-luc")), r#"name:("jean\-luc")"#);
        assert_eq!(
            render_clause(&name.eqs("jean-luc").unescaped()),
            r#"name:("jean-luc")"#
        );
    }

    #[test]
    fn test_escaping_is_per_token() {
        let name = Field::text("name");
        assert_eq!(
            render_clause(&name.contains("hot-dog  stand!")),
            r"name:(hot\-dog stand\!)"
        );

        let tags = Field::keyword_list("tags");
        assert_eq!(
            render_clause(&tags.in_list(["a-b", "c:d"])),
            r"tags:(a\-b OR c\:d)"
        );
    }

    #[test]
    fn test_whitespace_stays_inside_one_term() {
        let city = Field::keyword("city");
        assert_eq!(render_clause(&city.eqs("new york")), r"city:(new\ york)");
        assert_eq!(
            render_clause(&city.in_list(["new york", "la"])),
            r"city:(new\ york OR la)"
        );
        assert_eq!(
            render_clause(&city.in_range("a b", "c d")),
            r"city:[a\ b TO c\ d]"
        );

        let name = Field::text("name");
        assert_eq!(render_clause(&name.eqs("new york")), r#"name:("new york")"#);
    }

    #[test]
    fn test_blank_bag_of_words_renders_empty_token() {
        let name = Field::text("name");
        assert_eq!(render_clause(&name.contains("")), "name:(\"\")");
        assert_eq!(render_clause(&name.contains("   ").unescaped()), "name:(\"\")");

        let query = QueryBuilder::new("venues")
            .where_(Field::unscoped().contains("   "))
            .compile_flat()
            .unwrap();
        assert_eq!(query.get("q"), Some("(\"\")"));
    }

    #[test]
    fn test_empty_in_list_renders_empty_token() {
        let tags = Field::keyword_list("tags");
        let empty: Vec<&str> = Vec::new();
        assert_eq!(render_clause(&tags.in_list(empty)), "tags:(\"\")");
    }

    #[test]
    fn test_boost_rendering() {
        let name = Field::text("name");
        assert_eq!(render_clause(&name.eqs("jon").boost(2.0)), "name:(\"jon\")^2.0");
        assert_eq!(
            render_query(&Query::boost(Query::phrase("jon"), 0.5)),
            "(\"jon\")^0.5"
        );
    }

    #[test]
    fn test_clause_combinations() {
        let name = Field::text("name");
        let city = Field::keyword("city");
        let clause = name.eqs("a").and(city.eqs("nyc")).or(name.eqs("b"));

        assert_eq!(
            render_clause(&clause),
            "((name:(\"a\")) AND (city:(nyc))) OR (name:(\"b\"))"
        );
    }

    #[test]
    fn test_no_clause_matches_all() {
        let query = compile(&QueryState::new("venues")).unwrap();
        assert_eq!(query.query_string(), "*:*");
    }

    #[test]
    fn test_zero_weights_dropped() {
        let name = Field::text("name");
        let tags = Field::text("tags");
        let query = QueryBuilder::new("venues")
            .where_(FieldClause::new("", Query::bag_of_words("pizza")).into())
            .query_field(&name, 1.0)
            .query_field(&tags, 0.0)
            .phrase_boost(&name, 2.0, true, true, false)
            .phrase_boost(&tags, 0.0, true, true, true)
            .compile_flat()
            .unwrap();

        assert_eq!(query.get("q"), Some("pizza"));
        assert_eq!(query.get_all("qf"), vec!["name"]);
        assert_eq!(query.get_all("pf"), vec!["name^2.0"]);
        assert_eq!(query.get_all("pf2"), vec!["name^2.0"]);
        assert!(!query.contains_key("pf3"));
        assert!(query.params().iter().all(|(_, v)| !v.contains("^0.0")));
    }

    #[test]
    fn test_filters_and_boosts_repeat() {
        let name = Field::text("name");
        let city = Field::keyword("city");
        let query = QueryBuilder::new("venues")
            .filter(city.eqs("nyc"))
            .filter(name.neqs("closed"))
            .boost_query(name.eqs("pizza"))
            .boost_query(city.neqs("la"))
            .compile_flat()
            .unwrap();

        assert_eq!(
            query.get_all("fq"),
            vec!["city:(nyc)", "(*:* -name:(\"closed\"))"]
        );
        assert_eq!(
            query.get_all("bq"),
            vec!["name:(\"pizza\")", "(*:* -city:(la))"]
        );
    }

    #[test]
    fn test_spatial_defaults_field_list() {
        let geo = Field::point("geo");
        let center = GeoPoint::new(40.7, -74.0).unwrap();
        let query = QueryBuilder::new("venues")
            .spatial(&geo, center, 5.0)
            .compile_flat()
            .unwrap();

        assert_eq!(query.get("sfield"), Some("geo"));
        assert_eq!(query.get("pt"), Some("40.7,-74"));
        assert_eq!(query.get("d"), Some("5"));
        assert_eq!(query.get("fl"), Some(SPATIAL_FIELD_LIST));
        assert_eq!(query.get_all("fq"), vec!["{!geofilt}"]);
    }

    #[test]
    fn test_explicit_field_list_wins() {
        let geo = Field::point("geo");
        let center = GeoPoint::new(40.7, -74.0).unwrap();
        let query = QueryBuilder::new("venues")
            .spatial(&geo, center, 5.0)
            .select_into(["id", "name"], |doc| Ok(doc.id.clone()))
            .compile_flat()
            .unwrap();

        assert_eq!(query.get("fl"), Some("id,name"));
    }

    #[test]
    fn test_quality_filter_requests_scores() {
        let query = QueryBuilder::new("venues")
            .quality_filter(0.5, 2)
            .compile_flat()
            .unwrap();
        assert_eq!(query.get("fl"), Some("*,score"));

        let query = QueryBuilder::new("venues")
            .select_into(["id"], |doc| Ok(doc.id.clone()))
            .quality_filter(0.5, 2)
            .compile_flat()
            .unwrap();
        assert_eq!(query.get("fl"), Some("id,score"));
    }

    #[test]
    fn test_sorts() {
        let count = Field::integer("checkins");
        let query = QueryBuilder::new("venues")
            .order_desc(&count)
            .compile_flat()
            .unwrap();
        assert_eq!(query.get("sort"), Some("checkins desc"));

        let geo = Field::point("geo");
        let center = GeoPoint::new(40.7, -74.0).unwrap();
        let query = QueryBuilder::new("venues")
            .complex_order_asc(Query::recip(geo.dist(center), 1.0, 1000.0, 1000.0))
            .compile_flat()
            .unwrap();
        assert_eq!(
            query.get("sort"),
            Some("recip(geodist(geo,40.7,-74.0),1.0,1000.0,1000.0) asc")
        );
    }

    #[test]
    fn test_unsupported_sort() {
        let result = QueryBuilder::new("venues")
            .complex_order_asc(Query::phrase("pizza"))
            .compile_flat();
        assert!(matches!(result, Err(SkewerError::NotImplemented(_))));
    }

    #[test]
    fn test_boost_functions() {
        let popularity = Field::float("popularity");
        let query = QueryBuilder::new("venues")
            .boost_field(popularity.value(), 2.0)
            .boost_field(Query::field_value("ignored"), 0.0)
            .compile_flat()
            .unwrap();
        assert_eq!(query.get_all("bf"), vec!["popularity^2.0"]);
    }

    #[test]
    fn test_facets_and_highlighting() {
        let name = Field::text("name");
        let category = Field::keyword("category");
        let query = QueryBuilder::new("venues")
            .where_(name.contains("pizza"))
            .facet_field(&category)
            .facet_limit(5)
            .facet_min_count(2)
            .highlighting()
            .compile_flat()
            .unwrap();

        assert_eq!(query.get("facet"), Some("true"));
        assert_eq!(query.get_all("facet.field"), vec!["category"]);
        assert_eq!(query.get("facet.limit"), Some("5"));
        assert_eq!(query.get("facet.mincount"), Some("2"));
        assert_eq!(query.get("hl"), Some("true"));
        assert_eq!(query.get("hl.fl"), Some("name"));
    }

    #[test]
    fn test_paging() {
        let query = QueryBuilder::new("venues")
            .start(20)
            .limit(5)
            .compile_flat()
            .unwrap();
        assert_eq!(query.get("start"), Some("20"));
        assert_eq!(query.get("rows"), Some("5"));
    }

    #[test]
    fn test_form_body() {
        let name = Field::text("name");
        let query = QueryBuilder::new("venues")
            .where_(name.eqs("joe's pizza"))
            .compile_flat()
            .unwrap();

        assert_eq!(
            query.to_form_body(),
            "q=name%3A%28%22joe%27s+pizza%22%29&start=0&rows=10"
        );
    }

    #[test]
    fn test_form_body_encodes_utf8_and_separators() {
        let name = Field::text("name");
        let query = QueryBuilder::new("venues")
            .where_(name.eqs("café & bar=1"))
            .compile_flat()
            .unwrap();

        assert_eq!(
            query.to_form_body(),
            "q=name%3A%28%22caf%C3%A9+%5C%26+bar%3D1%22%29&start=0&rows=10"
        );
    }
}
