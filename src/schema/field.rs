//! Field descriptors and the typed clause constructors built on them.

use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::clause::{Clause, FieldClause};
use crate::query::expr::{DistanceShape, Query};
use crate::query::geo::{CellCoverer, GeoPoint};
use crate::schema::value::QueryValue;

/// What kind of values a field holds. Decides which leaf nodes its clauses
/// produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Analyzed full text.
    Text,
    /// Single unanalyzed string.
    Keyword,
    /// Multi-valued unanalyzed strings.
    KeywordList,
    /// Integral numbers.
    Integer,
    /// Floating point numbers.
    Float,
    /// Booleans.
    Boolean,
    /// Timestamps.
    Date,
    /// Geographical points.
    Point,
}

/// Metadata describing a queryable attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Name the attribute is stored and returned under.
    pub stored_name: String,
    /// Name used when querying; may point at a sub-field.
    pub query_name: String,
    /// Whether the backend analyzes the field's text.
    pub analyzed: bool,
    /// Value kind.
    pub kind: FieldKind,
}

/// A typed handle to a field. `V` is the type of values its clauses accept.
pub struct Field<V> {
    descriptor: FieldDescriptor,
    _value: PhantomData<fn(V)>,
}

impl<V> Clone for Field<V> {
    fn clone(&self) -> Self {
        Field {
            descriptor: self.descriptor.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> fmt::Debug for Field<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

impl<V: QueryValue> Field<V> {
    fn with_kind<S: Into<String>>(name: S, kind: FieldKind, analyzed: bool) -> Self {
        let name = name.into();
        Field {
            descriptor: FieldDescriptor {
                stored_name: name.clone(),
                query_name: name,
                analyzed,
                kind,
            },
            _value: PhantomData,
        }
    }

    /// Query through a different wire name, e.g. an edge-ngram sub-field.
    pub fn with_query_name<S: Into<String>>(mut self, query_name: S) -> Self {
        self.descriptor.query_name = query_name.into();
        self
    }

    /// Get the descriptor.
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Get the stored name.
    pub fn name(&self) -> &str {
        &self.descriptor.stored_name
    }

    /// Get the query name.
    pub fn query_name(&self) -> &str {
        &self.descriptor.query_name
    }

    fn leaf(&self, token: String) -> Query {
        if self.descriptor.analyzed {
            Query::phrase(token)
        } else {
            Query::term(token)
        }
    }

    fn token(value: impl Into<V>) -> String {
        value.into().to_token()
    }

    fn clause(&self, query: Query) -> Clause {
        FieldClause::new(self.descriptor.query_name.clone(), query).into()
    }

    fn excluding(&self, query: Query) -> Clause {
        FieldClause::excluding(self.descriptor.query_name.clone(), query).into()
    }

    fn any_of<I, T>(&self, values: I) -> Query
    where
        I: IntoIterator<Item = T>,
        T: Into<V>,
    {
        let tokens: Vec<String> = values.into_iter().map(Self::token).collect();
        if tokens.is_empty() {
            // Matches documents holding an empty token, not nothing.
            return Query::group(Query::term(""));
        }
        if self.descriptor.analyzed {
            Query::group(Query::Or(tokens.into_iter().map(Query::phrase).collect()))
        } else {
            Query::group(Query::terms(tokens))
        }
    }

    /// Field equals the value.
    pub fn eqs(&self, value: impl Into<V>) -> Clause {
        self.clause(Query::group(self.leaf(Self::token(value))))
    }

    /// Field does not equal the value.
    pub fn neqs(&self, value: impl Into<V>) -> Clause {
        self.excluding(Query::group(self.leaf(Self::token(value))))
    }

    /// Field equals any of the values.
    ///
    /// An empty list matches the empty token, so it selects documents whose
    /// field is the empty string rather than nothing or everything.
    pub fn in_list<I, T>(&self, values: I) -> Clause
    where
        I: IntoIterator<Item = T>,
        T: Into<V>,
    {
        self.clause(self.any_of(values))
    }

    /// Field equals none of the values.
    pub fn nin<I, T>(&self, values: I) -> Clause
    where
        I: IntoIterator<Item = T>,
        T: Into<V>,
    {
        self.excluding(self.any_of(values))
    }

    /// Field is at most `value` (inclusive).
    pub fn less_than(&self, value: impl Into<V>) -> Clause {
        self.clause(Query::range(Query::Splat, Query::term(Self::token(value))))
    }

    /// Field is at least `value` (inclusive).
    pub fn greater_than(&self, value: impl Into<V>) -> Clause {
        self.clause(Query::range(Query::term(Self::token(value)), Query::Splat))
    }

    /// Field lies in `[low, high]`.
    pub fn in_range(&self, low: impl Into<V>, high: impl Into<V>) -> Clause {
        self.clause(Query::range(
            Query::term(Self::token(low)),
            Query::term(Self::token(high)),
        ))
    }

    /// Field holds any value at all.
    pub fn exists(&self) -> Clause {
        self.clause(Query::range(Query::Splat, Query::Splat))
    }

    /// Field matches anything, including documents without it.
    pub fn any(&self) -> Clause {
        self.clause(Query::Splat)
    }

    /// The field's numeric value as a scoring function.
    pub fn value(&self) -> Query {
        Query::field_value(self.descriptor.query_name.clone())
    }
}

impl Field<String> {
    /// Analyzed full-text field.
    pub fn text<S: Into<String>>(name: S) -> Self {
        Self::with_kind(name, FieldKind::Text, true)
    }

    /// Unanalyzed string field.
    pub fn keyword<S: Into<String>>(name: S) -> Self {
        Self::with_kind(name, FieldKind::Keyword, false)
    }

    /// Multi-valued unanalyzed string field.
    pub fn keyword_list<S: Into<String>>(name: S) -> Self {
        Self::with_kind(name, FieldKind::KeywordList, false)
    }

    /// Pseudo-field whose clauses run against the weighted default fields.
    pub fn unscoped() -> Self {
        Self::with_kind("", FieldKind::Text, true)
    }

    /// Field matches any of the whitespace separated words.
    pub fn contains<S: Into<String>>(&self, text: S) -> Clause {
        let text = text.into();
        if self.descriptor.analyzed {
            self.clause(Query::group(Query::bag_of_words(text)))
        } else {
            self.clause(Query::group(Query::term(text)))
        }
    }

    /// Field contains the exact phrase.
    pub fn phrase<S: Into<String>>(&self, text: S) -> Clause {
        self.clause(Query::group(Query::phrase(text)))
    }
}

impl Field<i64> {
    /// Integral field.
    pub fn integer<S: Into<String>>(name: S) -> Self {
        Self::with_kind(name, FieldKind::Integer, false)
    }
}

impl Field<f64> {
    /// Floating point field.
    pub fn float<S: Into<String>>(name: S) -> Self {
        Self::with_kind(name, FieldKind::Float, false)
    }
}

impl Field<bool> {
    /// Boolean field.
    pub fn boolean<S: Into<String>>(name: S) -> Self {
        Self::with_kind(name, FieldKind::Boolean, false)
    }
}

impl Field<DateTime<Utc>> {
    /// Timestamp field.
    pub fn date<S: Into<String>>(name: S) -> Self {
        Self::with_kind(name, FieldKind::Date, false)
    }
}

impl Field<GeoPoint> {
    /// Geographical point field.
    pub fn point<S: Into<String>>(name: S) -> Self {
        Self::with_kind(name, FieldKind::Point, false)
    }

    /// Great-circle distance from the field to `point`.
    pub fn dist(&self, point: GeoPoint) -> Query {
        Query::geo_dist(self.descriptor.query_name.clone(), point.lat, point.lng)
    }

    /// Distance from the field to `point` with an explicit measure.
    pub fn dist_with_shape(&self, point: GeoPoint, shape: DistanceShape) -> Query {
        Query::geo_dist_with_shape(
            self.descriptor.query_name.clone(),
            point.lat,
            point.lng,
            shape,
        )
    }

    /// Field was indexed with any of the given cell tokens.
    ///
    /// No cells means the region could not be covered; the clause then
    /// matches everything instead of nothing.
    pub fn in_cells<I, S>(&self, cells: I) -> Clause
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells: Vec<String> = cells.into_iter().map(Into::into).collect();
        if cells.is_empty() {
            self.clause(Query::Splat)
        } else {
            self.clause(Query::group(Query::terms(cells)))
        }
    }

    /// Field lies within `radius_m` meters of `center`, as covered by `coverer`.
    pub fn near_cells(&self, coverer: &dyn CellCoverer, center: GeoPoint, radius_m: f64) -> Clause {
        self.in_cells(coverer.cover(center, radius_m))
    }
}
