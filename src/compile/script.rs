//! Scoring scripts for the structured backend.
//!
//! Caller-supplied numbers never appear in the script source. Each one is
//! bound to a named parameter (`p1`, `p2`, ...) so the backend can cache the
//! compiled script across queries that differ only in their constants.

use serde_json::{Map, Value, json};

use crate::error::{Result, SkewerError};
use crate::query::expr::{DistanceShape, Query, Scalar};

/// Script language requested from the backend.
pub const SCRIPT_LANG: &str = "painless";

/// Collects parameters while rendering function expressions.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    params: Map<String, Value>,
}

impl ScriptBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a number and return the expression referencing it.
    pub fn bind(&mut self, value: Scalar) -> String {
        let name = format!("p{}", self.params.len() + 1);
        let reference = format!("params.{name}");
        self.params.insert(name, json!(value.get()));
        reference
    }

    /// Render a function expression.
    pub fn render(&mut self, query: &Query) -> Result<String> {
        match query {
            Query::GeoDist {
                field,
                lat,
                lng,
                shape,
            } => {
                let lat = self.bind(*lat);
                let lng = self.bind(*lng);
                // Kilometers, like the key/value backend.
                match shape {
                    DistanceShape::Arc => {
                        Ok(format!("(doc['{field}'].arcDistance({lat}, {lng}) / 1000.0)"))
                    }
                    DistanceShape::Square => Ok(format!(
                        "Math.pow(doc['{field}'].planeDistance({lat}, {lng}) / 1000.0, 2)"
                    )),
                }
            }
            Query::Recip { query, x, y, z } => {
                let y = self.bind(*y);
                let x = self.bind(*x);
                let inner = self.render(query)?;
                let z = self.bind(*z);
                Ok(format!("{y} / ({x} * {inner} + {z})"))
            }
            Query::FieldValue(field) => Ok(format!("doc['{field}'].value")),
            Query::Group(inner) => Ok(format!("({})", self.render(inner)?)),
            other => Err(SkewerError::not_implemented(format!(
                "script rendering of {other:?}"
            ))),
        }
    }

    /// Wrap the source with the bound parameters.
    pub fn finish(self, source: String) -> Value {
        json!({
            "source": source,
            "lang": SCRIPT_LANG,
            "params": Value::Object(self.params),
        })
    }
}
