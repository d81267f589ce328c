//! Typestate markers for [`QueryBuilder`](crate::builder::QueryBuilder).
//!
//! Each axis of the builder is a type parameter that moves from its initial
//! marker to its final one exactly once. Methods only exist on builders whose
//! axis is still in the initial state, so calling them twice is a type error.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::result::document::RawDocument;

/// No sort has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unordered;

/// A sort has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ordered;

/// No limit has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

/// A limit has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limited;

/// No minimum match has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMinimumMatch;

/// A minimum match (percent or absolute) has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumMatchSet;

/// Highlighting is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHighlighting;

/// Highlighting is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Highlighting;

/// No quality filter has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQualityFilter;

/// A quality filter has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityFiltered;

/// No facet limit has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFacetLimit;

/// A facet limit has been set.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacetLimited;

/// Turns a raw document into the caller's result type.
pub trait Selection: Clone + Send + Sync {
    /// The projected result type.
    type Output;

    /// Project one document.
    fn project(&self, doc: &RawDocument) -> Result<Self::Output>;
}

/// No projection: results are the raw documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unselected;

impl Selection for Unselected {
    type Output = RawDocument;

    fn project(&self, doc: &RawDocument) -> Result<RawDocument> {
        Ok(doc.clone())
    }
}

/// Projection function type stored by [`Selected`].
pub type Projection<T> = Arc<dyn Fn(&RawDocument) -> Result<T> + Send + Sync>;

/// A projection into `T` has been registered.
pub struct Selected<T> {
    projection: Projection<T>,
}

impl<T> Selected<T> {
    pub(crate) fn new(projection: Projection<T>) -> Self {
        Selected { projection }
    }
}

impl<T> Clone for Selected<T> {
    fn clone(&self) -> Self {
        Selected {
            projection: Arc::clone(&self.projection),
        }
    }
}

impl<T> fmt::Debug for Selected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selected").finish_non_exhaustive()
    }
}

impl<T> Selection for Selected<T> {
    type Output = T;

    fn project(&self, doc: &RawDocument) -> Result<T> {
        (self.projection)(doc)
    }
}
