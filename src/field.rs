//! Field descriptors
//!
//! A [`Field`] owns a storage name, a default and a conversion kind. It is the
//! only path through which typed values enter or leave a record's raw store.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value};

use crate::error::{MappingError, Result};
use crate::leaf::{
    BooleanCodec, DateCodec, DateTimeCodec, DecimalCodec, FloatCodec, IntegerCodec, LeafCodec,
    LongCodec, TextCodec, TimeCodec,
};
use crate::record::{ConstructOptions, Record};
use crate::schema::Schema;
use crate::sequence::SequenceView;
use crate::value::FieldValue;

/// Default applied when a field is absent or null
#[derive(Clone, Default)]
pub enum FieldDefault {
    #[default]
    Absent,
    /// A constant, cloned on every materialization. A `FieldValue::Json`
    /// constant is a raw template and is converted with `to_typed` on read.
    Value(FieldValue),
    /// Invoked on every materialization
    Producer(Arc<dyn Fn() -> FieldValue + Send + Sync>),
}

impl FieldDefault {
    pub fn resolve(&self) -> Option<FieldValue> {
        match self {
            FieldDefault::Absent => None,
            FieldDefault::Value(value) => Some(value.clone()),
            FieldDefault::Producer(produce) => Some(produce()),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Absent => write!(f, "Absent"),
            FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldDefault::Producer(_) => write!(f, "Producer(..)"),
        }
    }
}

/// How a field converts between raw and typed form
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A scalar converted by a leaf codec
    Leaf(Arc<dyn LeafCodec>),
    /// A mapping passed through untouched
    Opaque,
    /// A nested record of the given schema
    Nested(Schema),
    /// A sequence whose elements are converted by the inner field
    List(Arc<Field>),
}

/// A field descriptor
#[derive(Debug, Clone)]
pub struct Field {
    name: Option<String>,
    default: FieldDefault,
    kind: FieldKind,
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}

impl Field {
    /// A plain field, coerced to text
    pub fn new() -> Self {
        Self::leaf(TextCodec)
    }

    /// A field converted by a custom leaf codec
    pub fn leaf(codec: impl LeafCodec + 'static) -> Self {
        Self {
            name: None,
            default: FieldDefault::Absent,
            kind: FieldKind::Leaf(Arc::new(codec)),
        }
    }

    pub fn text() -> Self {
        Self::leaf(TextCodec)
    }

    pub fn integer() -> Self {
        Self::leaf(IntegerCodec)
    }

    pub fn long() -> Self {
        Self::leaf(LongCodec)
    }

    pub fn float() -> Self {
        Self::leaf(FloatCodec)
    }

    pub fn boolean() -> Self {
        Self::leaf(BooleanCodec)
    }

    pub fn decimal() -> Self {
        Self::leaf(DecimalCodec)
    }

    pub fn date() -> Self {
        Self::leaf(DateCodec)
    }

    pub fn datetime() -> Self {
        Self::leaf(DateTimeCodec)
    }

    pub fn time() -> Self {
        Self::leaf(TimeCodec)
    }

    /// A mapping stored and returned verbatim. Defaults to a fresh `{}`.
    pub fn opaque() -> Self {
        Self {
            name: None,
            default: FieldDefault::Value(FieldValue::Json(Value::Object(Map::new()))),
            kind: FieldKind::Opaque,
        }
    }

    /// A nested record. Defaults to a record built from an empty mapping.
    pub fn nested(schema: &Schema) -> Self {
        Self {
            name: None,
            default: FieldDefault::Value(FieldValue::Json(Value::Object(Map::new()))),
            kind: FieldKind::Nested(schema.clone()),
        }
    }

    /// A sequence of `element` values. Defaults to a fresh `[]`.
    ///
    /// A [`Schema`] passed as the element becomes a nested-record field.
    pub fn list(element: impl Into<Field>) -> Self {
        Self {
            name: None,
            default: FieldDefault::Value(FieldValue::Json(Value::Array(Vec::new()))),
            kind: FieldKind::List(Arc::new(element.into())),
        }
    }

    /// Set an explicit storage name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    pub fn with_default_fn<F>(mut self, produce: F) -> Self
    where
        F: Fn() -> FieldValue + Send + Sync + 'static,
    {
        self.default = FieldDefault::Producer(Arc::new(produce));
        self
    }

    pub fn without_default(mut self) -> Self {
        self.default = FieldDefault::Absent;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn default_value(&self) -> &FieldDefault {
        &self.default
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Kind name for listings, e.g. "datetime" or "list"
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            FieldKind::Leaf(codec) => codec.kind(),
            FieldKind::Opaque => "object",
            FieldKind::Nested(_) => "record",
            FieldKind::List(_) => "list",
        }
    }

    /// Element descriptor of a list field
    pub fn element(&self) -> Option<&Arc<Field>> {
        match &self.kind {
            FieldKind::List(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn bind_name(&mut self, attr: &str) {
        if self.name.is_none() {
            self.name = Some(attr.to_string());
        }
    }

    /// Storage key in the raw mapping
    pub(crate) fn key(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Convert a raw value to typed form. Null stays null.
    pub fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        if raw.is_null() {
            return Ok(FieldValue::Null);
        }
        match &self.kind {
            FieldKind::Leaf(codec) => codec.to_typed(raw),
            FieldKind::Opaque => Ok(FieldValue::Json(raw.clone())),
            FieldKind::Nested(schema) => match raw {
                Value::Object(map) => {
                    Record::from_stored(schema, map.clone()).map(FieldValue::Record)
                }
                other => Err(MappingError::mismatch("object", other)),
            },
            FieldKind::List(element) => match raw {
                Value::Array(items) => Ok(FieldValue::List(SequenceView::owned(
                    items.clone(),
                    Arc::clone(element),
                ))),
                other => Err(MappingError::mismatch("array", other)),
            },
        }
    }

    /// Convert a typed (or still raw) value to raw form. Null stays null.
    pub fn to_raw(&self, value: FieldValue) -> Result<Value> {
        self.to_raw_with(value, ConstructOptions::default())
    }

    /// Like [`Field::to_raw`]; nested records are built with `options`
    pub fn to_raw_with(&self, value: FieldValue, options: ConstructOptions) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match &self.kind {
            FieldKind::Leaf(codec) => codec.to_raw(value),
            FieldKind::Opaque => opaque_to_raw(value),
            FieldKind::Nested(schema) => nested_to_raw(schema, value, options),
            FieldKind::List(element) => list_to_raw(element, value, options),
        }
    }

    /// Typed read of this field from a raw store.
    ///
    /// A missing or null slot yields the resolved default, or null.
    pub fn read(&self, store: &Map<String, Value>) -> Result<FieldValue> {
        match store.get(self.key()) {
            Some(raw) if !raw.is_null() => self.to_typed(raw),
            _ => self.materialize_default(),
        }
    }

    /// Typed write of this field into a raw store.
    ///
    /// The conversion runs before the store is touched.
    pub fn write(&self, store: &mut Map<String, Value>, value: FieldValue) -> Result<()> {
        self.write_with(store, value, ConstructOptions::default())
    }

    /// Like [`Field::write`]; nested records are built with `options`
    pub fn write_with(
        &self,
        store: &mut Map<String, Value>,
        value: FieldValue,
        options: ConstructOptions,
    ) -> Result<()> {
        let raw = self.to_raw_with(value, options)?;
        store.insert(self.key().to_string(), raw);
        Ok(())
    }

    fn materialize_default(&self) -> Result<FieldValue> {
        match self.default.resolve() {
            Some(FieldValue::Json(raw)) => {
                tracing::trace!(field = self.key(), "materializing raw default");
                self.to_typed(&raw)
            }
            Some(value) => {
                tracing::trace!(field = self.key(), "materializing default");
                Ok(value)
            }
            None => Ok(FieldValue::Null),
        }
    }
}

impl From<Schema> for Field {
    fn from(schema: Schema) -> Self {
        Field::nested(&schema)
    }
}

impl From<&Schema> for Field {
    fn from(schema: &Schema) -> Self {
        Field::nested(schema)
    }
}

fn opaque_to_raw(value: FieldValue) -> Result<Value> {
    match value {
        FieldValue::Json(raw) => Ok(raw),
        FieldValue::Record(record) => Ok(Value::Object(record.into_raw())),
        FieldValue::List(view) => Ok(Value::Array(view.into_raw())),
        FieldValue::Text(s) => Ok(Value::String(s)),
        FieldValue::Integer(n) => Ok(Value::from(n)),
        FieldValue::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| MappingError::invalid_format("float", f.to_string())),
        FieldValue::Boolean(b) => Ok(Value::Bool(b)),
        other => Err(MappingError::mismatch("raw value", other)),
    }
}

fn nested_to_raw(schema: &Schema, value: FieldValue, options: ConstructOptions) -> Result<Value> {
    let record = match value {
        FieldValue::Record(record) if record.schema().ptr_eq(schema) => record,
        FieldValue::Record(record) => Record::with_options(schema, record.into_raw(), options)?,
        FieldValue::Json(Value::Object(map)) => Record::with_options(schema, map, options)?,
        other => return Err(MappingError::mismatch("record", other)),
    };
    Ok(Value::Object(record.into_raw()))
}

fn list_to_raw(element: &Field, value: FieldValue, options: ConstructOptions) -> Result<Value> {
    let items = match value {
        FieldValue::List(view) => view
            .iter()
            .map(|item| element.to_raw_with(item?, options))
            .collect::<Result<Vec<_>>>()?,
        FieldValue::Items(items) => items
            .into_iter()
            .map(|item| element.to_raw_with(item, options))
            .collect::<Result<Vec<_>>>()?,
        FieldValue::Json(Value::Array(items)) => items
            .into_iter()
            .map(|item| element.to_raw_with(FieldValue::Json(item), options))
            .collect::<Result<Vec<_>>>()?,
        other => return Err(MappingError::mismatch("list", other)),
    };
    Ok(Value::Array(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bound(field: Field, attr: &str) -> Field {
        let mut field = field;
        field.bind_name(attr);
        field
    }

    #[test]
    fn test_plain_field_coerces_to_text() {
        let field = bound(Field::new(), "title");
        let mut store = Map::new();
        field.write(&mut store, FieldValue::Integer(12)).unwrap();
        assert_eq!(store.get("title"), Some(&json!("12")));
    }

    #[test]
    fn test_read_missing_without_default_is_null() {
        let field = bound(Field::integer(), "age");
        assert!(field.read(&Map::new()).unwrap().is_null());
    }

    #[test]
    fn test_null_falls_back_to_default() {
        let field = bound(Field::integer().with_default(5), "age");
        let mut store = Map::new();
        store.insert("age".into(), Value::Null);
        assert_eq!(field.read(&store).unwrap(), FieldValue::Integer(5));
    }

    #[test]
    fn test_write_null_stores_null() {
        let field = bound(Field::integer().with_default(5), "age");
        let mut store = Map::new();
        field.write(&mut store, FieldValue::Null).unwrap();
        assert_eq!(store.get("age"), Some(&Value::Null));
    }

    #[test]
    fn test_producer_runs_per_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let field = bound(
            Field::integer().with_default_fn(move || {
                FieldValue::Integer(counter.fetch_add(1, Ordering::SeqCst) as i64)
            }),
            "n",
        );
        let store = Map::new();
        assert_eq!(field.read(&store).unwrap(), FieldValue::Integer(0));
        assert_eq!(field.read(&store).unwrap(), FieldValue::Integer(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_raw_default_is_typed_on_read() {
        let field = bound(Field::date().with_default(json!("2007-04-01")), "on");
        let value = field.read(&Map::new()).unwrap();
        assert_eq!(value.to_string(), "2007-04-01");
        assert!(value.as_date().is_some());
    }

    #[test]
    fn test_failed_write_leaves_store_untouched() {
        let field = bound(Field::date(), "on");
        let mut store = Map::new();
        store.insert("on".into(), json!("2007-04-01"));
        assert!(field.write(&mut store, FieldValue::from("garbage")).is_err());
        assert_eq!(store.get("on"), Some(&json!("2007-04-01")));
    }

    #[test]
    fn test_opaque_is_identity() {
        let field = bound(Field::opaque(), "extra");
        let raw = json!({"foo": "bar", "n": [1, 2]});
        assert_eq!(field.to_typed(&raw).unwrap(), FieldValue::Json(raw.clone()));
        assert_eq!(field.to_raw(FieldValue::Json(raw.clone())).unwrap(), raw);
    }

    #[test]
    fn test_opaque_accepts_every_scalar() {
        let field = bound(Field::opaque(), "meta");
        assert_eq!(field.to_raw(FieldValue::Float(1.5)).unwrap(), json!(1.5));
        assert_eq!(field.to_raw(FieldValue::Integer(2)).unwrap(), json!(2));
        assert_eq!(field.to_raw(FieldValue::Boolean(true)).unwrap(), json!(true));
        assert_eq!(field.to_raw(FieldValue::from("x")).unwrap(), json!("x"));
        assert!(matches!(
            field.to_raw(FieldValue::Float(f64::INFINITY)),
            Err(MappingError::InvalidFormat { kind: "float", .. })
        ));
    }

    #[test]
    fn test_opaque_default_is_fresh_mapping() {
        let field = bound(Field::opaque(), "extra");
        assert_eq!(field.read(&Map::new()).unwrap(), FieldValue::Json(json!({})));
    }

    #[test]
    fn test_list_to_raw_is_eager() {
        let field = bound(Field::list(Field::date()), "days");
        let raw = field
            .to_raw(FieldValue::Items(vec![
                FieldValue::from("2007-04-01"),
                FieldValue::Json(json!("2007-04-02")),
            ]))
            .unwrap();
        assert_eq!(raw, json!(["2007-04-01", "2007-04-02"]));

        let bad = field.to_raw(FieldValue::Items(vec![FieldValue::from("nope")]));
        assert!(matches!(bad, Err(MappingError::InvalidFormat { .. })));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Field::datetime().kind_name(), "datetime");
        assert_eq!(Field::opaque().kind_name(), "object");
        assert_eq!(Field::list(Field::text()).kind_name(), "list");
    }
}
