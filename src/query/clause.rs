//! Field-scoped clauses and their boolean combinations.

use serde::{Deserialize, Serialize};

use crate::query::expr::Query;

/// A single condition on one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldClause {
    /// Wire name of the field. Empty means "the weighted default fields".
    pub field_name: String,
    /// The expression the field is matched against.
    pub query: Query,
    /// `false` negates the clause ("must not").
    pub include: bool,
}

impl FieldClause {
    /// Create an including clause.
    pub fn new<S: Into<String>>(field_name: S, query: Query) -> Self {
        FieldClause {
            field_name: field_name.into(),
            query,
            include: true,
        }
    }

    /// Create a negated clause.
    pub fn excluding<S: Into<String>>(field_name: S, query: Query) -> Self {
        FieldClause {
            field_name: field_name.into(),
            query,
            include: false,
        }
    }

    /// Whether this clause targets the default fields instead of a named one.
    pub fn is_unscoped(&self) -> bool {
        self.field_name.is_empty()
    }
}

/// A clause tree: field clauses combined with AND / OR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Clause {
    /// A single field condition.
    Field(FieldClause),
    /// All children must hold.
    And(Vec<Clause>),
    /// At least one child must hold.
    Or(Vec<Clause>),
}

impl Clause {
    /// Combine with AND. An existing AND node absorbs the new clause.
    pub fn and(self, other: Clause) -> Clause {
        match self {
            Clause::And(mut clauses) => {
                clauses.push(other);
                Clause::And(clauses)
            }
            clause => Clause::And(vec![clause, other]),
        }
    }

    /// Combine with OR. An existing OR node absorbs the new clause.
    pub fn or(self, other: Clause) -> Clause {
        match self {
            Clause::Or(mut clauses) => {
                clauses.push(other);
                Clause::Or(clauses)
            }
            clause => Clause::Or(vec![clause, other]),
        }
    }

    /// Negate a field clause. Combinations are returned unchanged.
    pub fn negate(self) -> Clause {
        match self {
            Clause::Field(mut clause) => {
                clause.include = !clause.include;
                Clause::Field(clause)
            }
            other => other,
        }
    }

    /// The logical complement of the whole tree: field clauses flip, AND
    /// becomes OR and OR becomes AND.
    pub fn complement(self) -> Clause {
        match self {
            Clause::Field(mut clause) => {
                clause.include = !clause.include;
                Clause::Field(clause)
            }
            Clause::And(clauses) => Clause::Or(clauses.into_iter().map(Clause::complement).collect()),
            Clause::Or(clauses) => Clause::And(clauses.into_iter().map(Clause::complement).collect()),
        }
    }

    /// Boost the expression of a field clause.
    pub fn boost(self, weight: f64) -> Clause {
        match self {
            Clause::Field(mut clause) => {
                clause.query = Query::boost(clause.query, weight);
                Clause::Field(clause)
            }
            other => other,
        }
    }

    /// Disable escaping for every value in the tree.
    pub fn unescaped(self) -> Clause {
        match self {
            Clause::Field(mut clause) => {
                clause.query = clause.query.unescaped();
                Clause::Field(clause)
            }
            Clause::And(clauses) => Clause::And(clauses.into_iter().map(Clause::unescaped).collect()),
            Clause::Or(clauses) => Clause::Or(clauses.into_iter().map(Clause::unescaped).collect()),
        }
    }

    /// Whether any field clause in the tree is negated.
    pub fn has_negation(&self) -> bool {
        match self {
            Clause::Field(clause) => !clause.include,
            Clause::And(clauses) | Clause::Or(clauses) => {
                clauses.iter().any(Clause::has_negation)
            }
        }
    }

    /// Named fields referenced by the tree, in first-seen order.
    pub fn field_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_field_names(&mut names);
        names
    }

    fn collect_field_names(&self, names: &mut Vec<String>) {
        match self {
            Clause::Field(clause) => {
                if !clause.is_unscoped() && !names.contains(&clause.field_name) {
                    names.push(clause.field_name.clone());
                }
            }
            Clause::And(clauses) | Clause::Or(clauses) => {
                for clause in clauses {
                    clause.collect_field_names(names);
                }
            }
        }
    }
}

impl From<FieldClause> for Clause {
    fn from(clause: FieldClause) -> Self {
        Clause::Field(clause)
    }
}
