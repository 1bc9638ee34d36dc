//! Schemas declared as data
//!
//! A schema file lists schemas in dependency order; each may extend or nest
//! schemas declared before it:
//!
//! ```json
//! {
//!   "schemas": [
//!     { "name": "Author", "fields": [
//!         { "attr": "name", "type": "text" },
//!         { "attr": "email", "type": "text" } ] },
//!     { "name": "Post", "fields": [
//!         { "attr": "author", "type": "record", "schema": "Author" },
//!         { "attr": "published", "type": "datetime", "name": "pubdate" },
//!         { "attr": "tags", "type": "list", "items": { "type": "text" } } ] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MappingError, Result};
use crate::field::Field;
use crate::schema::Schema;
use crate::value::FieldValue;

/// Field kinds available in declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindDecl {
    Text,
    Integer,
    Long,
    Float,
    Boolean,
    Decimal,
    Date,
    Datetime,
    Time,
    /// Opaque mapping
    Object,
    Record,
    List,
}

/// A field type with its options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    #[serde(rename = "type")]
    pub kind: KindDecl,
    /// Explicit storage name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Default in raw form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Named schema of a `record` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Inline fields of a `record` field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDecl>,
    /// Element type of a `list` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<TypeDecl>>,
}

/// A field declared under an attribute name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub attr: String,
    #[serde(flatten)]
    pub ty: TypeDecl,
}

/// A named schema declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

/// Contents of a schema file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    pub schemas: Vec<SchemaDecl>,
}

/// Schemas resolved from a [`SchemaFile`]
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: Vec<Schema>,
    by_name: HashMap<String, usize>,
}

impl SchemaSet {
    /// Resolve declarations in order
    pub fn from_file(file: SchemaFile) -> Result<Self> {
        let mut set = Self::default();
        for decl in &file.schemas {
            let schema = set.resolve_schema(decl)?;
            set.insert(schema);
        }
        tracing::debug!(schemas = set.schemas.len(), "schema set resolved");
        Ok(set)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_file(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.by_name.get(name).map(|&index| &self.schemas[index])
    }

    /// Like [`SchemaSet::get`], but a missing schema is an error
    pub fn require(&self, name: &str) -> Result<&Schema> {
        self.get(name)
            .ok_or_else(|| MappingError::UnknownSchema(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(Schema::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn insert(&mut self, schema: Schema) {
        match self.by_name.get(schema.name()) {
            Some(&index) => self.schemas[index] = schema,
            None => {
                self.by_name.insert(schema.name().to_string(), self.schemas.len());
                self.schemas.push(schema);
            }
        }
    }

    fn resolve_schema(&self, decl: &SchemaDecl) -> Result<Schema> {
        let mut builder = Schema::builder(decl.name.as_str());
        for parent in &decl.extends {
            builder = builder.extends(self.require(parent)?);
        }
        for field in &decl.fields {
            builder = builder.field(field.attr.as_str(), self.resolve_field(&field.ty)?);
        }
        Ok(builder.build())
    }

    fn resolve_field(&self, ty: &TypeDecl) -> Result<Field> {
        let field = match ty.kind {
            KindDecl::Text => Field::text(),
            KindDecl::Integer => Field::integer(),
            KindDecl::Long => Field::long(),
            KindDecl::Float => Field::float(),
            KindDecl::Boolean => Field::boolean(),
            KindDecl::Decimal => Field::decimal(),
            KindDecl::Date => Field::date(),
            KindDecl::Datetime => Field::datetime(),
            KindDecl::Time => Field::time(),
            KindDecl::Object => Field::opaque(),
            KindDecl::Record => Field::nested(&self.resolve_nested(ty)?),
            KindDecl::List => {
                let items = ty
                    .items
                    .as_deref()
                    .ok_or_else(|| MappingError::mismatch("list items", &ty.kind))?;
                Field::list(self.resolve_field(items)?)
            }
        };
        let field = match &ty.name {
            Some(name) => field.named(name.as_str()),
            None => field,
        };
        Ok(match &ty.default {
            Some(default) => field.with_default(FieldValue::Json(default.clone())),
            None => field,
        })
    }

    fn resolve_nested(&self, ty: &TypeDecl) -> Result<Schema> {
        match &ty.schema {
            Some(name) => self.require(name).cloned(),
            None => {
                let mut fields = Vec::with_capacity(ty.fields.len());
                for field in &ty.fields {
                    fields.push((field.attr.clone(), self.resolve_field(&field.ty)?));
                }
                Ok(Schema::build(fields))
            }
        }
    }
}
