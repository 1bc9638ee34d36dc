//! Typed records over a raw JSON mapping

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{MappingError, Result};
use crate::field::Field;
use crate::schema::Schema;
use crate::sequence::SequenceView;
use crate::value::FieldValue;

/// What construction does with input keys no field declares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    /// Leave them out of the record
    #[default]
    Drop,
    /// Copy them into the record verbatim
    Retain,
}

/// Options for [`Record::with_options`].
///
/// A record keeps the options it was built with and applies them to nested
/// records built later through [`Record::set`] or [`Record::sequence`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstructOptions {
    pub unknown_keys: UnknownKeys,
}

impl ConstructOptions {
    /// Keep undeclared keys at every level
    pub fn retain() -> Self {
        Self {
            unknown_keys: UnknownKeys::Retain,
        }
    }
}

/// A record: a raw mapping read and written through a schema.
///
/// The backing mapping only ever holds raw values, so it can be handed to a
/// JSON encoder at any time. Equality compares contents only.
#[derive(Clone)]
pub struct Record {
    schema: Schema,
    data: Map<String, Value>,
    options: ConstructOptions,
}

impl Record {
    /// Build a record from a raw mapping, populating every declared field.
    pub fn new(schema: &Schema, values: Map<String, Value>) -> Result<Self> {
        Self::with_options(schema, values, ConstructOptions::default())
    }

    /// Build a record with no input; every field takes its default
    pub fn empty(schema: &Schema) -> Result<Self> {
        Self::new(schema, Map::new())
    }

    /// Build a record from a raw JSON object
    pub fn from_json(schema: &Schema, value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::new(schema, map),
            other => Err(MappingError::mismatch("object", other)),
        }
    }

    /// Build a record from a raw mapping.
    ///
    /// Input keys match fields by storage name. Each present value goes
    /// through the field's typed write; each absent field is read (taking its
    /// default) and written back, so the mapping is fully populated.
    pub fn with_options(
        schema: &Schema,
        values: Map<String, Value>,
        options: ConstructOptions,
    ) -> Result<Self> {
        let mut data = Map::new();
        let mut consumed = HashSet::new();

        for (_, field) in schema.fields() {
            let value = match values.get(field.key()) {
                Some(raw) => {
                    consumed.insert(field.key());
                    FieldValue::Json(raw.clone())
                }
                None => field.read(&data)?,
            };
            field.write_with(&mut data, value, options)?;
        }

        let unknown: Vec<(String, Value)> = values
            .into_iter()
            .filter(|(key, _)| !consumed.contains(key.as_str()))
            .collect();
        if !unknown.is_empty() {
            let keys: Vec<&str> = unknown.iter().map(|(key, _)| key.as_str()).collect();
            match options.unknown_keys {
                UnknownKeys::Drop => {
                    tracing::debug!(schema = schema.name(), ?keys, "dropping undeclared keys");
                }
                UnknownKeys::Retain => {
                    tracing::debug!(schema = schema.name(), ?keys, "retaining undeclared keys");
                    for (key, raw) in unknown {
                        data.entry(key).or_insert(raw);
                    }
                }
            }
        }

        Ok(Self {
            schema: schema.clone(),
            data,
            options,
        })
    }

    /// A typed view of a mapping already held in raw form by a parent record.
    ///
    /// Every stored key is kept, so the view's raw mapping equals the stored one.
    pub(crate) fn from_stored(schema: &Schema, data: Map<String, Value>) -> Result<Self> {
        let mut record = Self::with_options(schema, data, ConstructOptions::retain())?;
        record.options = ConstructOptions::default();
        Ok(record)
    }

    /// Build a record from typed values keyed by attribute name.
    ///
    /// Values for attributes the schema does not declare are dropped.
    pub fn from_values<I, K, V>(schema: &Schema, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Self::from_values_with(schema, values, ConstructOptions::default())
    }

    pub(crate) fn from_values_with<I, K, V>(
        schema: &Schema,
        values: I,
        options: ConstructOptions,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut given: HashMap<String, FieldValue> = values
            .into_iter()
            .map(|(attr, value)| (attr.into(), value.into()))
            .collect();
        let mut data = Map::new();

        for (attr, field) in schema.fields() {
            let value = match given.remove(attr) {
                Some(value) => value,
                None => field.read(&data)?,
            };
            field.write_with(&mut data, value, options)?;
        }

        if !given.is_empty() {
            let keys: Vec<&String> = given.keys().collect();
            tracing::debug!(schema = schema.name(), ?keys, "dropping undeclared values");
        }

        Ok(Self {
            schema: schema.clone(),
            data,
            options,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn field_arc(&self, attr: &str) -> Result<Arc<Field>> {
        self.schema
            .field_arc(attr)
            .cloned()
            .ok_or_else(|| MappingError::UnknownField(attr.to_string()))
    }

    /// Typed read of a declared attribute
    pub fn get(&self, attr: &str) -> Result<FieldValue> {
        self.field_arc(attr)?.read(&self.data)
    }

    /// Typed write of a declared attribute
    pub fn set(&mut self, attr: &str, value: impl Into<FieldValue>) -> Result<()> {
        self.field_arc(attr)?
            .write_with(&mut self.data, value.into(), self.options)
    }

    /// Live view over a list attribute.
    ///
    /// Mutations through the view change this record in place. A missing or
    /// null slot is first filled with the field's default.
    pub fn sequence(&mut self, attr: &str) -> Result<SequenceView<'_>> {
        let field = self.field_arc(attr)?;
        let element = field
            .element()
            .cloned()
            .ok_or_else(|| MappingError::mismatch("list field", attr))?;
        let key = field.key();

        let missing = match self.data.get(key) {
            Some(Value::Array(_)) => false,
            Some(raw) if !raw.is_null() => return Err(MappingError::mismatch("array", raw)),
            _ => true,
        };
        if missing {
            tracing::debug!(field = key, "materializing missing list");
            let raw = match field.read(&self.data)? {
                FieldValue::Null => Value::Array(Vec::new()),
                value => field.to_raw_with(value, self.options)?,
            };
            self.data.insert(key.to_string(), raw);
        }

        match self.data.get_mut(key) {
            Some(Value::Array(items)) => {
                Ok(SequenceView::with_options(items, element, self.options))
            }
            other => Err(MappingError::mismatch("array", other)),
        }
    }

    /// Raw value stored under `key`, if any
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Raw value stored under `key`; missing keys are an error
    pub fn raw_get(&self, key: &str) -> Result<&Value> {
        self.data
            .get(key)
            .ok_or_else(|| MappingError::MissingKey(key.to_string()))
    }

    /// Store a raw value without any conversion
    pub fn insert_raw(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Remove a raw value; missing keys are an error
    pub fn remove_raw(&mut self, key: &str) -> Result<Value> {
        self.data
            .shift_remove(key)
            .ok_or_else(|| MappingError::MissingKey(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The live raw mapping
    pub fn as_raw(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn into_raw(self) -> Map<String, Value> {
        self.data
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl PartialEq<Map<String, Value>> for Record {
    fn eq(&self, other: &Map<String, Value>) -> bool {
        &self.data == other
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = serde_json::to_string(&self.data).map_err(|_| fmt::Error)?;
        write!(f, "<{} {}>", self.schema.name(), raw)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<'r> IntoIterator for &'r Record {
    type Item = (&'r String, &'r Value);
    type IntoIter = serde_json::map::Iter<'r>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
