//! Compiler for the structured query-object backend.
//!
//! Produces a JSON request body. Leaf values are data here, not query
//! syntax, so the escaping flags on expressions only matter to the flat
//! compiler.

use std::fmt;

use serde_json::{Map, Value, json};

use crate::builder::state::{MinimumMatch, QueryState, SortTarget, WeightedField};
use crate::compile::script::ScriptBuilder;
use crate::error::{Result, SkewerError};
use crate::query::clause::Clause;
use crate::query::expr::Query;

/// Score multiplier applied to documents matching a negated boost query.
pub const NEGATIVE_BOOST: f64 = 0.1;

/// A compiled request body.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    body: Value,
}

impl StructuredQuery {
    /// The full request body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The `query` section of the body.
    pub fn query(&self) -> &Value {
        &self.body["query"]
    }

    /// Consume into the request body.
    pub fn into_body(self) -> Value {
        self.body
    }
}

impl fmt::Display for StructuredQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.body)
    }
}

fn match_all() -> Value {
    json!({"match_all": {}})
}

fn weighted(field: &WeightedField) -> String {
    if field.weight.get() == 1.0 {
        field.field.clone()
    } else {
        format!("{}^{}", field.field, field.weight)
    }
}

/// Renders clause trees with access to the default-field settings.
struct Renderer<'a> {
    state: &'a QueryState,
}

impl<'a> Renderer<'a> {
    fn new(state: &'a QueryState) -> Self {
        Renderer { state }
    }

    fn minimum_match(&self) -> Option<String> {
        self.state.minimum_match.map(MinimumMatch::to_param)
    }

    fn clause(&self, clause: &Clause) -> Result<Value> {
        match clause {
            Clause::Field(field_clause) => {
                let query = if field_clause.is_unscoped() {
                    self.unscoped(&field_clause.query)?
                } else {
                    self.scoped(&field_clause.field_name, &field_clause.query)?
                };
                if field_clause.include {
                    Ok(query)
                } else {
                    Ok(json!({"bool": {"must_not": [query]}}))
                }
            }
            Clause::And(clauses) => Ok(json!({"bool": {"must": self.clauses(clauses)?}})),
            Clause::Or(clauses) => Ok(json!({
                "bool": {"should": self.clauses(clauses)?, "minimum_should_match": 1}
            })),
        }
    }

    fn clauses(&self, clauses: &[Clause]) -> Result<Vec<Value>> {
        clauses.iter().map(|c| self.clause(c)).collect()
    }

    fn scoped(&self, field: &str, query: &Query) -> Result<Value> {
        match query {
            Query::Splat => Ok(match_all()),
            Query::Group(inner) => self.scoped(field, inner),
            Query::Term { values, .. } => match values.as_slice() {
                [] => Ok(json!({"term": {field: ""}})),
                [value] => Ok(json!({"term": {field: value}})),
                values => Ok(json!({"terms": {field: values}})),
            },
            Query::Phrase { value, .. } => Ok(json!({"match_phrase": {field: value}})),
            Query::BagOfWords { value, .. } => {
                let mut options = Map::new();
                options.insert("query".to_string(), json!(value));
                options.insert("operator".to_string(), json!("or"));
                if let Some(mm) = self.minimum_match() {
                    options.insert("minimum_should_match".to_string(), json!(mm));
                }
                Ok(json!({"match": {field: options}}))
            }
            Query::Boost { query, weight } => Ok(json!({
                "bool": {"must": [self.scoped(field, query)?], "boost": weight.get()}
            })),
            Query::Range { low, high } => {
                let mut bounds = Map::new();
                if let Some(low) = range_bound(low)? {
                    bounds.insert("gte".to_string(), json!(low));
                }
                if let Some(high) = range_bound(high)? {
                    bounds.insert("lte".to_string(), json!(high));
                }
                if bounds.is_empty() {
                    Ok(json!({"exists": {"field": field}}))
                } else {
                    Ok(json!({"range": {field: bounds}}))
                }
            }
            Query::And(queries) => Ok(json!({
                "bool": {"must": self.scoped_all(field, queries)?}
            })),
            Query::Or(queries) => Ok(json!({
                "bool": {"should": self.scoped_all(field, queries)?, "minimum_should_match": 1}
            })),
            function => Err(SkewerError::not_implemented(format!(
                "function {function:?} used as a match clause on '{field}'"
            ))),
        }
    }

    fn scoped_all(&self, field: &str, queries: &[Query]) -> Result<Vec<Value>> {
        queries.iter().map(|q| self.scoped(field, q)).collect()
    }

    /// Unscoped text runs against the weighted default fields, with phrase
    /// boosts added as optional clauses.
    fn unscoped(&self, query: &Query) -> Result<Value> {
        match query {
            Query::Splat => Ok(match_all()),
            Query::Group(inner) => self.unscoped(inner),
            Query::Boost { query, weight } => Ok(json!({
                "bool": {"must": [self.unscoped(query)?], "boost": weight.get()}
            })),
            Query::BagOfWords { value, .. } => Ok(self.multi_match(value, "best_fields")),
            Query::Term { values, .. } => Ok(self.multi_match(&values.join(" "), "best_fields")),
            Query::Phrase { value, .. } => Ok(self.multi_match(value, "phrase")),
            Query::And(queries) => {
                let queries = queries
                    .iter()
                    .map(|q| self.unscoped(q))
                    .collect::<Result<Vec<_>>>()?;
                Ok(json!({"bool": {"must": queries}}))
            }
            Query::Or(queries) => {
                let queries = queries
                    .iter()
                    .map(|q| self.unscoped(q))
                    .collect::<Result<Vec<_>>>()?;
                Ok(json!({"bool": {"should": queries, "minimum_should_match": 1}}))
            }
            other => Err(SkewerError::not_implemented(format!(
                "unscoped clause {other:?}"
            ))),
        }
    }

    fn multi_match(&self, text: &str, match_type: &str) -> Value {
        let mut options = Map::new();
        options.insert("query".to_string(), json!(text));
        options.insert("type".to_string(), json!(match_type));
        let fields: Vec<String> = self.state.active_query_fields().map(weighted).collect();
        if !fields.is_empty() {
            options.insert("fields".to_string(), json!(fields));
        }
        if let Some(tie) = self.state.tie_breaker {
            options.insert("tie_breaker".to_string(), json!(tie.get()));
        }
        if match_type != "phrase" {
            if let Some(mm) = self.minimum_match() {
                options.insert("minimum_should_match".to_string(), json!(mm));
            }
        }
        let query = json!({"multi_match": options});

        let phrases: Vec<Value> = self
            .state
            .phrase_boosts
            .iter()
            .filter(|b| b.pf && b.field.is_active())
            .map(|b| {
                json!({"match_phrase": {
                    b.field.field.as_str(): {"query": text, "boost": b.field.weight.get()}
                }})
            })
            .collect();
        if phrases.is_empty() {
            query
        } else {
            json!({"bool": {"must": [query], "should": phrases}})
        }
    }
}

fn range_bound(bound: &Query) -> Result<Option<String>> {
    match bound.ungrouped() {
        Query::Splat => Ok(None),
        Query::Term { values, .. } if values.len() == 1 => Ok(Some(values[0].clone())),
        Query::Phrase { value, .. } => Ok(Some(value.clone())),
        other => Err(SkewerError::not_implemented(format!(
            "range bound {other:?}"
        ))),
    }
}

fn boost_queries(renderer: &Renderer<'_>, base: Value, boosts: &[Clause]) -> Result<Value> {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for boost in boosts {
        // Documents failing a negated boost are demoted instead.
        if boost.has_negation() {
            negative.push(renderer.clause(&boost.clone().complement())?);
        } else {
            positive.push(renderer.clause(boost)?);
        }
    }

    let base = if positive.is_empty() {
        base
    } else {
        json!({"bool": {"must": [base], "should": positive}})
    };
    if negative.is_empty() {
        return Ok(base);
    }
    Ok(json!({
        "boosting": {
            "positive": base,
            "negative": {"bool": {"should": negative, "minimum_should_match": 1}},
            "negative_boost": NEGATIVE_BOOST,
        }
    }))
}

fn function_score(state: &QueryState, base: Value) -> Result<Value> {
    let mut script = ScriptBuilder::new();
    let mut terms = Vec::new();
    for function in state.boost_functions.iter().filter(|f| !f.weight.is_zero()) {
        let weight = script.bind(function.weight);
        let body = script.render(&function.function)?;
        terms.push(format!("{weight} * ({body})"));
    }
    if terms.is_empty() {
        return Ok(base);
    }
    let source = format!("_score * (1.0 + {})", terms.join(" + "));
    Ok(json!({
        "function_score": {
            "query": base,
            "functions": [{"script_score": {"script": script.finish(source)}}],
            "boost_mode": "replace",
        }
    }))
}

fn sort(state: &QueryState) -> Result<Option<Value>> {
    let Some(sort) = &state.sort else {
        return Ok(None);
    };
    let order = sort.direction.as_str();
    let entry = match &sort.target {
        SortTarget::Field(field) => json!({field.as_str(): {"order": order}}),
        SortTarget::Function(function) if function.is_function() => {
            let mut script = ScriptBuilder::new();
            let source = script.render(function)?;
            json!({"_script": {
                "type": "number",
                "script": script.finish(source),
                "order": order,
            }})
        }
        SortTarget::Function(other) => {
            return Err(SkewerError::not_implemented(format!(
                "sorting by non-function expression {other:?}"
            )));
        }
    };
    Ok(Some(json!([entry])))
}

/// Compile a builder state into a request body.
pub fn compile(state: &QueryState) -> Result<StructuredQuery> {
    let renderer = Renderer::new(state);

    let mut query = match &state.clause {
        Some(clause) => renderer.clause(clause)?,
        None => match_all(),
    };
    if !state.boost_queries.is_empty() {
        query = boost_queries(&renderer, query, &state.boost_queries)?;
    }
    query = function_score(state, query)?;

    let mut filters = state
        .filters
        .iter()
        .map(|f| renderer.clause(f))
        .collect::<Result<Vec<_>>>()?;
    if let Some(spatial) = &state.spatial {
        filters.push(json!({"geo_distance": {
            "distance": format!("{}km", spatial.distance_km.get()),
            spatial.field.as_str(): {"lat": spatial.lat.get(), "lon": spatial.lng.get()},
        }}));
    }
    if !filters.is_empty() {
        query = json!({"bool": {"must": [query], "filter": filters}});
    }

    let mut body = Map::new();
    body.insert("query".to_string(), query);
    body.insert("from".to_string(), json!(state.start));
    body.insert("size".to_string(), json!(state.limit));

    if let Some(sort) = sort(state)? {
        body.insert("sort".to_string(), sort);
    }

    if !state.fields.is_empty() {
        body.insert("_source".to_string(), json!(state.fields));
    }

    if state.facets.is_enabled() {
        let mut aggs = Map::new();
        for field in &state.facets.fields {
            let mut terms = Map::new();
            terms.insert("field".to_string(), json!(field));
            if let Some(limit) = state.facets.limit {
                terms.insert("size".to_string(), json!(limit));
            }
            if let Some(min_count) = state.facets.min_count {
                terms.insert("min_doc_count".to_string(), json!(min_count));
            }
            aggs.insert(field.clone(), json!({"terms": terms}));
        }
        body.insert("aggs".to_string(), Value::Object(aggs));
    }

    if state.highlighting {
        let mut fields = Map::new();
        let names = state.highlight_fields();
        if names.is_empty() {
            fields.insert("*".to_string(), json!({}));
        }
        for name in names {
            fields.insert(name, json!({}));
        }
        body.insert("highlight".to_string(), json!({"fields": fields}));
    }

    Ok(StructuredQuery {
        body: Value::Object(body),
    })
}
