//! The fluent, typestate query builder.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::builder::markers::{
    FacetLimited, Highlighting, Limited, MinimumMatchSet, NoFacetLimit, NoHighlighting,
    NoMinimumMatch, NoQualityFilter, Ordered, QualityFiltered, Selected, Selection, Unlimited,
    Unordered, Unselected,
};
use crate::builder::state::{
    BoostFunction, MinimumMatch, PhraseBoost, QualityFilter, QueryState, Sort, SortDirection,
    SortTarget, Spatial, WeightedField,
};
use crate::compile::flat::{self, FlatQuery};
use crate::compile::structured::{self, StructuredQuery};
use crate::error::Result;
use crate::query::clause::Clause;
use crate::query::expr::Query;
use crate::query::geo::GeoPoint;
use crate::result::document::RawDocument;
use crate::schema::field::Field;
use crate::schema::value::QueryValue;

/// Rewrites the (already quality-filtered) documents before projection.
pub type ResultTransform = Arc<dyn Fn(Vec<RawDocument>) -> Vec<RawDocument> + Send + Sync>;

/// Builds a query one call at a time.
///
/// Every call consumes the builder and returns a new one, so a half-built
/// query can be cloned and extended in different directions without the
/// branches affecting each other.
///
/// The type parameters track which one-shot settings have been used. Calling
/// a one-shot setter twice does not compile:
///
/// ```compile_fail
/// use skewer::builder::QueryBuilder;
///
/// let query = QueryBuilder::new("venues").limit(10).limit(20);
/// ```
///
/// ```compile_fail
/// use skewer::builder::QueryBuilder;
/// use skewer::schema::Field;
///
/// let name = Field::text("name");
/// let query = QueryBuilder::new("venues").order_asc(&name).order_desc(&name);
/// ```
///
/// ```compile_fail
/// use skewer::builder::QueryBuilder;
///
/// let query = QueryBuilder::new("venues")
///     .minimum_match_percent(75)
///     .minimum_match_absolute(2);
/// ```
///
/// Selecting columns has to happen before ordering, and highlighting before
/// selecting:
///
/// ```compile_fail
/// use skewer::builder::QueryBuilder;
/// use skewer::schema::Field;
///
/// let name = Field::text("name");
/// let query = QueryBuilder::new("venues")
///     .order_asc(&name)
///     .select_into(["name"], |doc| Ok(doc.id.clone()));
/// ```
///
/// ```compile_fail
/// use skewer::builder::QueryBuilder;
///
/// let query = QueryBuilder::new("venues")
///     .select_into(["name"], |doc| Ok(doc.id.clone()))
///     .highlighting();
/// ```
///
/// ```compile_fail
/// use skewer::builder::QueryBuilder;
///
/// let query = QueryBuilder::new("venues")
///     .quality_filter(0.5, 3)
///     .facet_limit(10)
///     .quality_filter(0.8, 1);
/// ```
///
/// ```compile_fail
/// use skewer::builder::QueryBuilder;
///
/// let query = QueryBuilder::new("venues").facet_limit(10).facet_limit(5);
/// ```
///
/// The legal orderings compile:
///
/// ```
/// use skewer::builder::QueryBuilder;
/// use skewer::schema::Field;
///
/// let name = Field::text("name");
/// let query = QueryBuilder::new("venues")
///     .where_(name.eqs("jon"))
///     .highlighting()
///     .select_into(["name"], |doc| Ok(doc.id.clone()))
///     .order_desc(&name)
///     .limit(5)
///     .quality_filter(0.5, 2);
///
/// assert_eq!(query.state().limit, 5);
/// ```
pub struct QueryBuilder<
    Ord = Unordered,
    Lim = Unlimited,
    MM = NoMinimumMatch,
    Sel = Unselected,
    Hl = NoHighlighting,
    QF = NoQualityFilter,
    FL = NoFacetLimit,
> {
    state: QueryState,
    selection: Sel,
    transform: Option<ResultTransform>,
    _markers: PhantomData<fn() -> (Ord, Lim, MM, Hl, QF, FL)>,
}

impl QueryBuilder {
    /// Start an empty query against an index.
    pub fn new<S: Into<String>>(index: S) -> Self {
        QueryBuilder {
            state: QueryState::new(index),
            selection: Unselected,
            transform: None,
            _markers: PhantomData,
        }
    }
}

impl<Ord, Lim, MM, Sel: Clone, Hl, QF, FL> Clone for QueryBuilder<Ord, Lim, MM, Sel, Hl, QF, FL> {
    fn clone(&self) -> Self {
        QueryBuilder {
            state: self.state.clone(),
            selection: self.selection.clone(),
            transform: self.transform.clone(),
            _markers: PhantomData,
        }
    }
}

impl<Ord, Lim, MM, Sel, Hl, QF, FL> fmt::Debug for QueryBuilder<Ord, Lim, MM, Sel, Hl, QF, FL> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("state", &self.state)
            .field("transform", &self.transform.is_some())
            .finish_non_exhaustive()
    }
}

impl<Ord, Lim, MM, Sel, Hl, QF, FL> QueryBuilder<Ord, Lim, MM, Sel, Hl, QF, FL> {
    fn retype<Ord2, Lim2, MM2, Hl2, QF2, FL2>(
        self,
    ) -> QueryBuilder<Ord2, Lim2, MM2, Sel, Hl2, QF2, FL2> {
        QueryBuilder {
            state: self.state,
            selection: self.selection,
            transform: self.transform,
            _markers: PhantomData,
        }
    }

    fn update(mut self, f: impl FnOnce(&mut QueryState)) -> Self {
        f(&mut self.state);
        self
    }

    /// Get the accumulated state.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Get the registered projection.
    pub fn selection(&self) -> &Sel {
        &self.selection
    }

    /// Get the result transform, if any.
    pub fn result_transform(&self) -> Option<&ResultTransform> {
        self.transform.as_ref()
    }

    /// Split into state, projection and transform.
    pub fn into_parts(self) -> (QueryState, Sel, Option<ResultTransform>) {
        (self.state, self.selection, self.transform)
    }

    /// Set the scoring clause. Same as [`and`](Self::and) on an empty query.
    pub fn where_(self, clause: Clause) -> Self {
        self.and(clause)
    }

    /// AND a clause into the scoring clause.
    ///
    /// Consecutive `and` calls extend one AND node; after an `or`, the
    /// existing expression becomes the first child of a new AND node.
    pub fn and(self, clause: Clause) -> Self {
        self.update(|state| {
            state.clause = Some(match state.clause.take() {
                None => clause,
                Some(existing) => existing.and(clause),
            });
        })
    }

    /// OR a clause into the scoring clause. Mirror image of [`and`](Self::and).
    pub fn or(self, clause: Clause) -> Self {
        self.update(|state| {
            state.clause = Some(match state.clause.take() {
                None => clause,
                Some(existing) => existing.or(clause),
            });
        })
    }

    /// Add a filter. Filters restrict matches without affecting score and are
    /// ANDed together.
    pub fn filter(self, clause: Clause) -> Self {
        self.update(|state| state.filters.push(clause))
    }

    /// OR a clause with the most recently added filter only.
    ///
    /// `filter(a).filter(b).or_filter(c)` yields the filters `a` and
    /// `Or(c, b)`. Without an earlier filter this behaves like
    /// [`filter`](Self::filter).
    pub fn or_filter(self, clause: Clause) -> Self {
        self.update(|state| match state.filters.pop() {
            Some(last) => state.filters.push(Clause::Or(vec![clause, last])),
            None => state.filters.push(clause),
        })
    }

    /// Add a clause that affects score only.
    pub fn boost_query(self, clause: Clause) -> Self {
        self.update(|state| state.boost_queries.push(clause))
    }

    /// Fold a scoring function, e.g. a reciprocal distance, into the score.
    pub fn boost_field(self, function: Query, weight: f64) -> Self {
        self.update(|state| {
            state.boost_functions.push(BoostFunction {
                function,
                weight: weight.into(),
            })
        })
    }

    /// Search unscoped clauses in `field` with the given weight. A zero weight
    /// is kept here but never compiled.
    pub fn query_field<V: QueryValue>(self, field: &Field<V>, weight: f64) -> Self {
        let weighted = WeightedField::new(field.query_name(), weight);
        self.update(|state| state.query_fields.push(weighted))
    }

    /// Boost documents where the query terms appear close together in `field`.
    pub fn phrase_boost<V: QueryValue>(
        self,
        field: &Field<V>,
        weight: f64,
        pf: bool,
        pf2: bool,
        pf3: bool,
    ) -> Self {
        let boost = PhraseBoost {
            field: WeightedField::new(field.query_name(), weight),
            pf,
            pf2,
            pf3,
        };
        self.update(|state| state.phrase_boosts.push(boost))
    }

    /// Set the tie breaker between default fields.
    pub fn tie_breaker(self, tie: f64) -> Self {
        self.update(|state| state.tie_breaker = Some(tie.into()))
    }

    /// Choose the backend query parser, e.g. `edismax`.
    pub fn use_query_type<S: Into<String>>(self, query_type: S) -> Self {
        let query_type = query_type.into();
        self.update(|state| state.query_type = Some(query_type))
    }

    /// Set the offset of the first result.
    pub fn start(self, start: usize) -> Self {
        self.update(|state| state.start = start)
    }

    /// Count values of a field.
    pub fn facet_field<V: QueryValue>(self, field: &Field<V>) -> Self {
        let name = field.query_name().to_string();
        self.update(|state| state.facets.fields.push(name))
    }

    /// Drop facet values counted fewer than `min_count` times.
    pub fn facet_min_count(self, min_count: usize) -> Self {
        self.update(|state| state.facets.min_count = Some(min_count))
    }

    /// Restrict results to `distance_km` around `point`, and return the
    /// distance with each document.
    pub fn spatial(self, field: &Field<GeoPoint>, point: GeoPoint, distance_km: f64) -> Self {
        let spatial = Spatial {
            field: field.query_name().to_string(),
            lat: point.lat.into(),
            lng: point.lng.into(),
            distance_km: distance_km.into(),
        };
        self.update(|state| state.spatial = Some(spatial))
    }

    /// Rewrite the document list after quality filtering and before
    /// projection.
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Vec<RawDocument>) -> Vec<RawDocument> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Compile for the flat key/value backend.
    pub fn compile_flat(&self) -> Result<FlatQuery> {
        flat::compile(&self.state)
    }

    /// Compile for the structured backend.
    pub fn compile_structured(&self) -> Result<StructuredQuery> {
        structured::compile(&self.state)
    }
}

impl<Lim, MM, Sel, Hl, QF, FL> QueryBuilder<Unordered, Lim, MM, Sel, Hl, QF, FL> {
    fn order(self, sort: Sort) -> QueryBuilder<Ordered, Lim, MM, Sel, Hl, QF, FL> {
        self.update(|state| state.sort = Some(sort))
            .retype::<Ordered, Lim, MM, Hl, QF, FL>()
    }

    /// Sort ascending by a field.
    pub fn order_asc<V: QueryValue>(
        self,
        field: &Field<V>,
    ) -> QueryBuilder<Ordered, Lim, MM, Sel, Hl, QF, FL> {
        self.order(Sort {
            target: SortTarget::Field(field.query_name().to_string()),
            direction: SortDirection::Asc,
        })
    }

    /// Sort descending by a field.
    pub fn order_desc<V: QueryValue>(
        self,
        field: &Field<V>,
    ) -> QueryBuilder<Ordered, Lim, MM, Sel, Hl, QF, FL> {
        self.order(Sort {
            target: SortTarget::Field(field.query_name().to_string()),
            direction: SortDirection::Desc,
        })
    }

    /// Sort ascending by a scoring function.
    pub fn complex_order_asc(
        self,
        function: Query,
    ) -> QueryBuilder<Ordered, Lim, MM, Sel, Hl, QF, FL> {
        self.order(Sort {
            target: SortTarget::Function(function),
            direction: SortDirection::Asc,
        })
    }

    /// Sort descending by a scoring function.
    pub fn complex_order_desc(
        self,
        function: Query,
    ) -> QueryBuilder<Ordered, Lim, MM, Sel, Hl, QF, FL> {
        self.order(Sort {
            target: SortTarget::Function(function),
            direction: SortDirection::Desc,
        })
    }
}

impl<Ord, MM, Sel, Hl, QF, FL> QueryBuilder<Ord, Unlimited, MM, Sel, Hl, QF, FL> {
    /// Set the number of results.
    pub fn limit(self, limit: usize) -> QueryBuilder<Ord, Limited, MM, Sel, Hl, QF, FL> {
        self.update(|state| state.limit = limit)
            .retype::<Ord, Limited, MM, Hl, QF, FL>()
    }
}

impl<Ord, Lim, Sel, Hl, QF, FL> QueryBuilder<Ord, Lim, NoMinimumMatch, Sel, Hl, QF, FL> {
    /// Require `percent`% of the optional clauses to match.
    pub fn minimum_match_percent(
        self,
        percent: u32,
    ) -> QueryBuilder<Ord, Lim, MinimumMatchSet, Sel, Hl, QF, FL> {
        self.update(|state| state.minimum_match = Some(MinimumMatch::Percent(percent)))
            .retype::<Ord, Lim, MinimumMatchSet, Hl, QF, FL>()
    }

    /// Require `count` of the optional clauses to match.
    pub fn minimum_match_absolute(
        self,
        count: u32,
    ) -> QueryBuilder<Ord, Lim, MinimumMatchSet, Sel, Hl, QF, FL> {
        self.update(|state| state.minimum_match = Some(MinimumMatch::Absolute(count)))
            .retype::<Ord, Lim, MinimumMatchSet, Hl, QF, FL>()
    }
}

impl<Lim, MM, Hl, QF, FL> QueryBuilder<Unordered, Lim, MM, Unselected, Hl, QF, FL> {
    /// Fetch only `fields` and turn each document into a `T`.
    pub fn select_into<T, I, S, F>(
        self,
        fields: I,
        projection: F,
    ) -> QueryBuilder<Unordered, Lim, MM, Selected<T>, Hl, QF, FL>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&RawDocument) -> Result<T> + Send + Sync + 'static,
    {
        let mut state = self.state;
        state.fields = fields.into_iter().map(Into::into).collect();
        QueryBuilder {
            state,
            selection: Selected::new(Arc::new(projection)),
            transform: self.transform,
            _markers: PhantomData,
        }
    }
}

impl<Ord, Lim, MM, QF, FL> QueryBuilder<Ord, Lim, MM, Unselected, NoHighlighting, QF, FL> {
    /// Request highlighted fragments for the queried fields.
    pub fn highlighting(self) -> QueryBuilder<Ord, Lim, MM, Unselected, Highlighting, QF, FL> {
        self.update(|state| state.highlighting = true)
            .retype::<Ord, Lim, MM, Highlighting, QF, FL>()
    }
}

impl<Ord, Lim, MM, Sel, Hl, FL> QueryBuilder<Ord, Lim, MM, Sel, Hl, NoQualityFilter, FL> {
    /// Cut the result list once relevance decays below `fall_off` of the
    /// running average, keeping at least `min_results`.
    pub fn quality_filter(
        self,
        fall_off: f64,
        min_results: usize,
    ) -> QueryBuilder<Ord, Lim, MM, Sel, Hl, QualityFiltered, FL> {
        let filter = QualityFilter {
            fall_off: fall_off.into(),
            min_results,
        };
        self.update(|state| state.quality_filter = Some(filter))
            .retype::<Ord, Lim, MM, Hl, QualityFiltered, FL>()
    }
}

impl<Ord, Lim, MM, Sel, Hl, QF> QueryBuilder<Ord, Lim, MM, Sel, Hl, QF, NoFacetLimit> {
    /// Return at most `limit` values per faceted field.
    pub fn facet_limit(self, limit: usize) -> QueryBuilder<Ord, Lim, MM, Sel, Hl, QF, FacetLimited> {
        self.update(|state| state.facets.limit = Some(limit))
            .retype::<Ord, Lim, MM, Hl, QF, FacetLimited>()
    }
}

impl<Ord, Lim, MM, Sel: Selection, Hl, QF, FL> QueryBuilder<Ord, Lim, MM, Sel, Hl, QF, FL> {
    /// Apply the quality filter, the result transform and the projection to
    /// a list of documents, in that order.
    pub fn process(&self, docs: Vec<RawDocument>) -> Result<Vec<Sel::Output>> {
        crate::result::processor::process_documents(
            &self.state,
            &self.selection,
            self.transform.as_ref(),
            docs,
        )
    }
}
