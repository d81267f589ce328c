//! Integration tests for the structured request compiler.

use serde_json::json;
use skewer::prelude::*;

#[test]
fn test_both_compilers_read_the_same_state() -> Result<()> {
    let fullname = Field::text("fullname");
    let query = QueryBuilder::new("users").where_(fullname.eqs("jon"));

    let flat = query.compile_flat()?;
    let structured = query.compile_structured()?;

    assert_eq!(flat.get("q"), Some("fullname:(\"jon\")"));
    assert_eq!(
        structured.body(),
        &json!({"query": {"match_phrase": {"fullname": "jon"}}, "from": 0, "size": 10})
    );
    Ok(())
}

#[test]
fn test_nearby_venue_search() -> Result<()> {
    let name = Field::text("name");
    let category = Field::keyword("category");
    let closed = Field::boolean("closed");
    let geo = Field::point("geo");
    let center = GeoPoint::new(40.7, -74.0)?;

    let query = QueryBuilder::new("venues")
        .where_(Field::unscoped().contains("pizza"))
        .query_field(&name, 1.0)
        .filter(closed.eqs(false))
        .boost_query(category.eqs("restaurant"))
        .boost_field(Query::recip(geo.dist(center), 1.0, 10.0, 10.0), 1.5)
        .spatial(&geo, center, 2.0)
        .limit(20)
        .compile_structured()?;

    let body = query.body();
    assert_eq!(body["size"], json!(20));

    let outer = &body["query"]["bool"];
    assert_eq!(
        outer["filter"],
        json!([
            {"term": {"closed": "false"}},
            {"geo_distance": {"distance": "2km", "geo": {"lat": 40.7, "lon": -74.0}}},
        ])
    );

    let function_score = &outer["must"][0]["function_score"];
    assert_eq!(
        function_score["query"],
        json!({"bool": {
            "must": [{"multi_match": {"query": "pizza", "type": "best_fields", "fields": ["name"]}}],
            "should": [{"term": {"category": "restaurant"}}],
        }})
    );
    let script = &function_score["functions"][0]["script_score"]["script"];
    assert_eq!(script["params"]["p1"], json!(1.5));
    assert_eq!(script["params"]["p2"], json!(10.0));
    assert_eq!(script["lang"], json!("painless"));
    Ok(())
}

#[test]
fn test_negated_boost_uses_boosting_query() -> Result<()> {
    let name = Field::text("name");
    let chain = Field::keyword("chain");

    let query = QueryBuilder::new("venues")
        .where_(name.contains("coffee"))
        .boost_query(chain.neqs("starbucks"))
        .boost_query(name.phrase("espresso bar"))
        .compile_structured()?;

    let boosting = &query.query()["boosting"];
    assert_eq!(boosting["negative_boost"], json!(0.1));
    assert_eq!(
        boosting["negative"],
        json!({"bool": {"should": [{"term": {"chain": "starbucks"}}], "minimum_should_match": 1}})
    );
    assert_eq!(
        boosting["positive"]["bool"]["should"],
        json!([{"match_phrase": {"name": "espresso bar"}}])
    );
    Ok(())
}

#[test]
fn test_compound_negated_boost_is_dampened() -> Result<()> {
    let name = Field::text("name");
    let chain = Field::keyword("chain");

    let query = QueryBuilder::new("venues")
        .where_(name.contains("coffee"))
        .boost_query(chain.neqs("starbucks").and(chain.neqs("dunkin")))
        .compile_structured()?;

    let boosting = &query.query()["boosting"];
    assert_eq!(boosting["negative_boost"], json!(0.1));
    assert_eq!(
        boosting["negative"],
        json!({"bool": {"should": [{"bool": {
            "should": [{"term": {"chain": "starbucks"}}, {"term": {"chain": "dunkin"}}],
            "minimum_should_match": 1,
        }}], "minimum_should_match": 1}})
    );
    assert_eq!(
        boosting["positive"],
        json!({"match": {"name": {"query": "coffee", "operator": "or"}}})
    );
    Ok(())
}

#[test]
fn test_unsupported_sort_is_not_a_transport_error() {
    let result = QueryBuilder::new("venues")
        .complex_order_asc(Query::phrase("pizza"))
        .compile_structured();

    match result {
        Err(error @ SkewerError::NotImplemented(_)) => assert!(!error.is_backend_failure()),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_state_is_hashable_cache_key() {
    use std::collections::HashMap;

    let name = Field::text("name");
    let build = || {
        QueryBuilder::new("venues")
            .where_(name.eqs("jon").boost(2.0))
            .tie_breaker(0.2)
            .state()
            .clone()
    };

    let mut cache: HashMap<QueryState, usize> = HashMap::new();
    cache.insert(build(), 1);
    assert_eq!(cache.get(&build()), Some(&1));
}
