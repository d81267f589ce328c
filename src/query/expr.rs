//! Backend-agnostic query expressions.
//!
//! A [`Query`] is a small immutable tree. It knows nothing about how either
//! backend spells it: the flat and structured compilers each walk the same
//! tree and render their own syntax.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A floating point value with bitwise equality and hashing.
///
/// Weights and coordinates live inside query trees, which must be usable as
/// map keys. Comparing the bit pattern keeps `Eq` and `Hash` consistent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scalar(f64);

impl Scalar {
    /// Wrap a value.
    pub fn new(value: f64) -> Self {
        Scalar(value)
    }

    /// Get the wrapped value.
    pub fn get(self) -> f64 {
        self.0
    }

    /// Check whether the value is exactly zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar(value as f64)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar(value as f64)
    }
}

impl fmt::Display for Scalar {
    // Always keeps a fractional part: `2.0`, `0.5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// How a distance function measures distance between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceShape {
    /// Great-circle distance.
    Arc,
    /// Squared planar distance; cheaper, only meaningful for ranking.
    Square,
}

/// A query expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Query {
    /// Matches everything. As a range endpoint it means "unbounded".
    Splat,

    /// Exact match on one or more unanalyzed values.
    Term {
        /// Values to match; any of them matches.
        values: Vec<String>,
        /// Whether reserved characters get escaped.
        escape: bool,
    },

    /// Analyzed phrase match.
    Phrase {
        /// The phrase.
        value: String,
        /// Whether reserved characters get escaped.
        escape: bool,
    },

    /// Analyzed match on any of the whitespace separated tokens.
    BagOfWords {
        /// The raw text.
        value: String,
        /// Whether reserved characters get escaped.
        escape: bool,
    },

    /// Explicit grouping.
    Group(Box<Query>),

    /// Multiplies the relevance of the inner expression.
    Boost {
        /// The boosted expression.
        query: Box<Query>,
        /// Multiplier.
        weight: Scalar,
    },

    /// Inclusive range. [`Query::Splat`] as an endpoint leaves that side open.
    Range {
        /// Lower endpoint.
        low: Box<Query>,
        /// Upper endpoint.
        high: Box<Query>,
    },

    /// All children must match.
    And(Vec<Query>),

    /// At least one child must match.
    Or(Vec<Query>),

    /// Distance between a point field and a fixed point.
    GeoDist {
        /// The point field.
        field: String,
        /// Latitude of the fixed point.
        lat: Scalar,
        /// Longitude of the fixed point.
        lng: Scalar,
        /// Distance measure.
        shape: DistanceShape,
    },

    /// Reciprocal function `y / (x * query + z)`.
    Recip {
        /// The inner function.
        query: Box<Query>,
        /// Slope.
        x: Scalar,
        /// Numerator.
        y: Scalar,
        /// Offset.
        z: Scalar,
    },

    /// The numeric value of a field, used inside scoring functions.
    FieldValue(String),
}

impl Query {
    /// Escaped exact match on a single value.
    pub fn term<S: Into<String>>(value: S) -> Self {
        Query::Term {
            values: vec![value.into()],
            escape: true,
        }
    }

    /// Escaped exact match on any of the values.
    pub fn terms<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Term {
            values: values.into_iter().map(Into::into).collect(),
            escape: true,
        }
    }

    /// Escaped phrase.
    pub fn phrase<S: Into<String>>(value: S) -> Self {
        Query::Phrase {
            value: value.into(),
            escape: true,
        }
    }

    /// Escaped bag of words.
    pub fn bag_of_words<S: Into<String>>(value: S) -> Self {
        Query::BagOfWords {
            value: value.into(),
            escape: true,
        }
    }

    /// Wrap in a group.
    pub fn group(query: Query) -> Self {
        Query::Group(Box::new(query))
    }

    /// Wrap in a boost.
    pub fn boost<W: Into<Scalar>>(query: Query, weight: W) -> Self {
        Query::Boost {
            query: Box::new(query),
            weight: weight.into(),
        }
    }

    /// Inclusive range between two endpoints.
    pub fn range(low: Query, high: Query) -> Self {
        Query::Range {
            low: Box::new(low),
            high: Box::new(high),
        }
    }

    /// Great-circle distance from `field` to the given point.
    pub fn geo_dist<F: Into<String>>(field: F, lat: f64, lng: f64) -> Self {
        Query::GeoDist {
            field: field.into(),
            lat: lat.into(),
            lng: lng.into(),
            shape: DistanceShape::Arc,
        }
    }

    /// Distance with an explicit distance measure.
    pub fn geo_dist_with_shape<F: Into<String>>(
        field: F,
        lat: f64,
        lng: f64,
        shape: DistanceShape,
    ) -> Self {
        Query::GeoDist {
            field: field.into(),
            lat: lat.into(),
            lng: lng.into(),
            shape,
        }
    }

    /// Reciprocal `y / (x * query + z)`.
    pub fn recip(query: Query, x: f64, y: f64, z: f64) -> Self {
        Query::Recip {
            query: Box::new(query),
            x: x.into(),
            y: y.into(),
            z: z.into(),
        }
    }

    /// Numeric value of a field.
    pub fn field_value<F: Into<String>>(field: F) -> Self {
        Query::FieldValue(field.into())
    }

    /// Turn escaping off for every leaf in the tree.
    pub fn unescaped(self) -> Self {
        match self {
            Query::Term { values, .. } => Query::Term {
                values,
                escape: false,
            },
            Query::Phrase { value, .. } => Query::Phrase {
                value,
                escape: false,
            },
            Query::BagOfWords { value, .. } => Query::BagOfWords {
                value,
                escape: false,
            },
            Query::Group(inner) => Query::group(inner.unescaped()),
            Query::Boost { query, weight } => Query::Boost {
                query: Box::new(query.unescaped()),
                weight,
            },
            Query::Range { low, high } => Query::range(low.unescaped(), high.unescaped()),
            Query::And(queries) => Query::And(queries.into_iter().map(Query::unescaped).collect()),
            Query::Or(queries) => Query::Or(queries.into_iter().map(Query::unescaped).collect()),
            other => other,
        }
    }

    /// Whether this node is a scoring function rather than a match.
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            Query::GeoDist { .. } | Query::Recip { .. } | Query::FieldValue(_)
        )
    }

    /// Strip any number of enclosing groups.
    pub fn ungrouped(&self) -> &Query {
        let mut current = self;
        while let Query::Group(inner) = current {
            current = inner;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = Query::group(Query::boost(Query::phrase("pizza"), 2.0));
        let b = Query::group(Query::boost(Query::phrase("pizza"), 2.0));
        let c = Query::group(Query::boost(Query::phrase("pizza"), 3.0));

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_scalar_display_keeps_fraction() {
        assert_eq!(Scalar::new(2.0).to_string(), "2.0");
        assert_eq!(Scalar::new(0.5).to_string(), "0.5");
        assert!(Scalar::new(0.0).is_zero());
    }

    #[test]
    fn test_unescaped_reaches_nested_leaves() {
        let leaf = Query::phrase("a-b").unescaped();
        assert_eq!(
            leaf,
            Query::Phrase {
                value: "a-b".to_string(),
                escape: false
            }
        );

        let nested = Query::group(Query::Or(vec![Query::term("x-1"), Query::term("x-2")]));
        let expected = Query::group(Query::Or(vec![
            Query::term("x-1").unescaped(),
            Query::term("x-2").unescaped(),
        ]));
        assert_eq!(nested.unescaped(), expected);
        assert_eq!(Query::Splat.unescaped(), Query::Splat);
    }

    #[test]
    fn test_functions() {
        let dist = Query::geo_dist("geo", 40.7, -74.0);
        assert!(dist.is_function());
        assert!(Query::recip(dist, 1.0, 1000.0, 1000.0).is_function());
        assert!(Query::field_value("popularity").is_function());
        assert!(!Query::phrase("x").is_function());
    }

    #[test]
    fn test_ungrouped() {
        let query = Query::group(Query::group(Query::Splat));
        assert_eq!(query.ungrouped(), &Query::Splat);
    }
}
