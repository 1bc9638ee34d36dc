//! Record schemas and the schema builder

use std::fmt;
use std::sync::Arc;

use crate::field::Field;

/// Name given to schemas synthesized by [`Schema::build`]
pub const ANONYMOUS: &str = "AnonymousStruct";

/// An immutable, shared table of field descriptors keyed by attribute name.
///
/// Cloning is cheap; clones share the same descriptors.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

#[derive(Debug)]
struct SchemaInner {
    name: String,
    fields: Vec<(String, Arc<Field>)>,
}

impl Schema {
    /// Start declaring a named schema
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Synthesize an anonymous schema from `(attribute, field)` pairs
    pub fn build<I, K>(fields: I) -> Schema
    where
        I: IntoIterator<Item = (K, Field)>,
        K: Into<String>,
    {
        fields
            .into_iter()
            .fold(SchemaBuilder::new(ANONYMOUS), |builder, (attr, field)| {
                builder.field(attr, field)
            })
            .build()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Fields in declaration order, inherited ones first
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.inner
            .fields
            .iter()
            .map(|(attr, field)| (attr.as_str(), field.as_ref()))
    }

    pub fn field(&self, attr: &str) -> Option<&Field> {
        self.field_arc(attr).map(Arc::as_ref)
    }

    pub(crate) fn field_arc(&self, attr: &str) -> Option<&Arc<Field>> {
        self.inner
            .fields
            .iter()
            .find(|(name, _)| name == attr)
            .map(|(_, field)| field)
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.field_arc(attr).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }

    /// Whether both handles refer to the same declaration
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.fields)
            .finish()
    }
}

/// Collects field declarations and parent schemas into a [`Schema`].
///
/// Parents are folded in the order they are added, then the schema's own
/// fields are applied and win every collision. A redeclared attribute keeps
/// its original position.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    parents: Vec<Schema>,
    fields: Vec<(String, Field)>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Inherit every field of `parent`
    pub fn extends(mut self, parent: &Schema) -> Self {
        self.parents.push(parent.clone());
        self
    }

    /// Declare a field under `attr`. The field's storage name defaults to `attr`.
    pub fn field(mut self, attr: impl Into<String>, field: impl Into<Field>) -> Self {
        self.fields.push((attr.into(), field.into()));
        self
    }

    pub fn build(self) -> Schema {
        let mut merged: Vec<(String, Arc<Field>)> = Vec::new();

        for parent in &self.parents {
            for (attr, field) in &parent.inner.fields {
                upsert(&mut merged, attr.clone(), Arc::clone(field));
            }
        }

        for (attr, mut field) in self.fields {
            field.bind_name(&attr);
            upsert(&mut merged, attr, Arc::new(field));
        }

        tracing::debug!(
            schema = %self.name,
            fields = merged.len(),
            parents = self.parents.len(),
            "schema declared"
        );

        Schema {
            inner: Arc::new(SchemaInner {
                name: self.name,
                fields: merged,
            }),
        }
    }
}

fn upsert(fields: &mut Vec<(String, Arc<Field>)>, attr: String, field: Arc<Field>) {
    match fields.iter_mut().find(|(existing, _)| *existing == attr) {
        Some(slot) => slot.1 = field,
        None => fields.push((attr, field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Schema {
        Schema::builder("Person")
            .field("name", Field::text())
            .field("age", Field::integer())
            .build()
    }

    #[test]
    fn test_names_bound_to_attributes() {
        let schema = person();
        assert_eq!(schema.field("name").unwrap().name(), Some("name"));
        assert_eq!(schema.field("age").unwrap().name(), Some("age"));
    }

    #[test]
    fn test_explicit_name_kept() {
        let schema = Schema::builder("Post")
            .field("published", Field::datetime().named("pubdate"))
            .build();
        assert_eq!(schema.field("published").unwrap().name(), Some("pubdate"));
    }

    #[test]
    fn test_inheritance_merges_parent_fields() {
        let employee = Schema::builder("Employee")
            .extends(&person())
            .field("salary", Field::decimal())
            .build();
        let attrs: Vec<&str> = employee.fields().map(|(attr, _)| attr).collect();
        assert_eq!(attrs, vec!["name", "age", "salary"]);
    }

    #[test]
    fn test_child_wins_collisions() {
        let child = Schema::builder("Child")
            .extends(&person())
            .field("age", Field::text())
            .build();
        assert_eq!(child.len(), 2);
        assert_eq!(child.field("age").unwrap().kind_name(), "text");
        assert_eq!(child.fields().nth(1).map(|(attr, _)| attr), Some("age"));
    }

    #[test]
    fn test_later_parent_overrides_earlier() {
        let a = Schema::builder("A").field("x", Field::integer()).build();
        let b = Schema::builder("B").field("x", Field::float()).build();
        let c = Schema::builder("C").extends(&a).extends(&b).build();
        assert_eq!(c.field("x").unwrap().kind_name(), "float");
    }

    #[test]
    fn test_parent_unchanged_by_child() {
        let parent = person();
        let _child = Schema::builder("Child")
            .extends(&parent)
            .field("age", Field::text())
            .build();
        assert_eq!(parent.field("age").unwrap().kind_name(), "integer");
    }

    #[test]
    fn test_build_is_anonymous() {
        let schema = Schema::build([("name", Field::text()), ("email", Field::text())]);
        assert_eq!(schema.name(), ANONYMOUS);
        assert_eq!(schema.field("email").unwrap().name(), Some("email"));
        assert!(!schema.contains("age"));
    }

    #[test]
    fn test_clones_share_declaration() {
        let schema = person();
        assert!(schema.ptr_eq(&schema.clone()));
        assert!(!schema.ptr_eq(&person()));
    }
}
