//! Schemas: named collections of field descriptors bound to one index.

use std::collections::HashMap;

use crate::builder::QueryBuilder;
use crate::error::{Result, SkewerError};
use crate::schema::field::{Field, FieldDescriptor};
use crate::schema::value::QueryValue;

/// A schema names the index (core, collection) queries run against and
/// records the fields declared for it.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Index the schema's queries target.
    index: String,
    /// Map of field names to their descriptors.
    fields: HashMap<String, FieldDescriptor>,
    /// Ordered list of field names (for consistent ordering).
    field_names: Vec<String>,
}

impl Schema {
    /// Create a new empty schema for an index.
    pub fn new<S: Into<String>>(index: S) -> Self {
        Schema {
            index: index.into(),
            fields: HashMap::new(),
            field_names: Vec::new(),
        }
    }

    /// Declare a field.
    pub fn add_field<V: QueryValue>(&mut self, field: &Field<V>) -> Result<()> {
        let name = field.name().to_string();

        if name.is_empty() {
            return Err(SkewerError::schema("Field name cannot be empty"));
        }
        if self.fields.contains_key(&name) {
            return Err(SkewerError::schema(format!(
                "Field '{name}' already exists"
            )));
        }

        self.fields.insert(name.clone(), field.descriptor().clone());
        self.field_names.push(name);
        Ok(())
    }

    /// Declare a field, builder style.
    pub fn with_field<V: QueryValue>(mut self, field: &Field<V>) -> Result<Self> {
        self.add_field(field)?;
        Ok(self)
    }

    /// Get the index name.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Look up a field by stored name.
    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Declared fields in declaration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.field_names.iter().filter_map(|name| self.fields.get(name))
    }

    /// Start a query against this schema's index.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.index.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::field::FieldKind;

    #[test]
    fn test_add_fields() {
        let schema = Schema::new("venues")
            .with_field(&Field::text("name"))
            .unwrap()
            .with_field(&Field::integer("checkins"))
            .unwrap();

        assert_eq!(schema.index(), "venues");
        assert_eq!(schema.descriptor("name").unwrap().kind, FieldKind::Text);
        assert!(schema.descriptor("missing").is_none());

        let names: Vec<&str> = schema
            .descriptors()
            .map(|d| d.stored_name.as_str())
            .collect();
        assert_eq!(names, vec!["name", "checkins"]);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut schema = Schema::new("venues");
        schema.add_field(&Field::text("name")).unwrap();

        let result = schema.add_field(&Field::keyword("name"));
        assert!(matches!(result, Err(SkewerError::Schema(_))));
    }

    #[test]
    fn test_unscoped_field_rejected() {
        let mut schema = Schema::new("venues");
        assert!(schema.add_field(&Field::unscoped()).is_err());
    }

    #[test]
    fn test_query_targets_index() {
        let schema = Schema::new("venues");
        assert_eq!(schema.query().state().index, "venues");
    }
}
