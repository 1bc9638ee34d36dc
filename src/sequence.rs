//! Lazily-coercing views over raw JSON arrays
//!
//! A [`SequenceView`] presents a raw array as a mutable sequence of typed
//! values. Nothing is converted up front: reads run the element field's
//! `to_typed` on the touched item, writes run `to_raw` before the array is
//! modified. The array itself only ever holds raw values.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Bound, Range, RangeBounds};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{MappingError, Result};
use crate::field::{Field, FieldKind};
use crate::record::{ConstructOptions, Record};
use crate::value::FieldValue;

enum Backing<'a> {
    Borrowed(&'a mut Vec<Value>),
    Owned(Vec<Value>),
}

impl Backing<'_> {
    fn items(&self) -> &Vec<Value> {
        match self {
            Backing::Borrowed(items) => &**items,
            Backing::Owned(items) => items,
        }
    }

    fn items_mut(&mut self) -> &mut Vec<Value> {
        match self {
            Backing::Borrowed(items) => &mut **items,
            Backing::Owned(items) => items,
        }
    }
}

/// Arguments to [`SequenceView::append`] and [`SequenceView::insert`].
///
/// Exactly one positional value is accepted, or, when the elements are nested
/// records, keyword values naming the new record's fields.
#[derive(Debug, Clone, Default)]
pub struct Args {
    positional: Vec<FieldValue>,
    keywords: Vec<(String, FieldValue)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single positional value
    pub fn one(value: impl Into<FieldValue>) -> Self {
        Self::new().arg(value)
    }

    /// Keyword values only
    pub fn keywords<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        values
            .into_iter()
            .fold(Self::new(), |args, (key, value)| args.kwarg(key, value))
    }

    pub fn arg(mut self, value: impl Into<FieldValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.keywords.push((key.into(), value.into()));
        self
    }
}

/// A typed, mutable view over a raw JSON array.
///
/// A view obtained from [`Record::sequence`] borrows the record's array and
/// mutates it in place. Views produced by reading a field or by slicing own a
/// copy of the raw items.
pub struct SequenceView<'a> {
    items: Backing<'a>,
    element: Arc<Field>,
    options: ConstructOptions,
}

impl<'a> SequenceView<'a> {
    /// A view that mutates `items` in place
    pub fn new(items: &'a mut Vec<Value>, element: Arc<Field>) -> Self {
        Self::with_options(items, element, ConstructOptions::default())
    }

    /// A view that mutates `items` in place and builds nested records with `options`
    pub fn with_options(
        items: &'a mut Vec<Value>,
        element: Arc<Field>,
        options: ConstructOptions,
    ) -> Self {
        Self {
            items: Backing::Borrowed(items),
            element,
            options,
        }
    }

    /// Element field descriptor
    pub fn element(&self) -> &Field {
        &self.element
    }

    /// The raw items
    pub fn raw(&self) -> &[Value] {
        self.items.items()
    }

    pub fn into_raw(self) -> Vec<Value> {
        match self.items {
            Backing::Borrowed(items) => items.clone(),
            Backing::Owned(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.raw().len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.len();
        if index < len {
            Ok(())
        } else {
            Err(MappingError::IndexOutOfRange { index, len })
        }
    }

    /// Typed item at `index`
    pub fn get(&self, index: usize) -> Result<FieldValue> {
        self.check_index(index)?;
        self.element.to_typed(&self.raw()[index])
    }

    /// A new view over a copy of the raw items in `range`.
    ///
    /// Bounds past the end are clamped.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> SequenceView<'static> {
        let range = clamp(range, self.len());
        SequenceView::owned(self.raw()[range].to_vec(), Arc::clone(&self.element))
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            items: self.raw().iter(),
            element: &self.element,
        }
    }

    /// Whether any item equals `value` once converted to typed form
    pub fn contains(&self, value: &FieldValue) -> Result<bool> {
        for item in self.iter() {
            if item? == *value {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Number of items equal to `value` in typed form
    pub fn count(&self, value: &FieldValue) -> Result<usize> {
        let mut count = 0;
        for item in self.iter() {
            if item? == *value {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Position of the first raw item equal to `value` in raw form
    pub fn index(&self, value: impl Into<FieldValue>) -> Result<usize> {
        let raw = self.element.to_raw_with(value.into(), self.options)?;
        self.raw()
            .iter()
            .position(|item| *item == raw)
            .ok_or_else(|| MappingError::ValueNotFound(raw.to_string()))
    }

    pub fn set(&mut self, index: usize, value: impl Into<FieldValue>) -> Result<()> {
        self.check_index(index)?;
        let raw = self.element.to_raw_with(value.into(), self.options)?;
        self.items.items_mut()[index] = raw;
        Ok(())
    }

    /// Replace the items in `range` with `values`, which may differ in length
    pub fn set_slice<I>(&mut self, range: impl RangeBounds<usize>, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<FieldValue>,
    {
        let range = clamp(range, self.len());
        let raw = self.convert_all(values)?;
        self.items.items_mut().splice(range, raw);
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.items.items_mut().remove(index);
        Ok(())
    }

    pub fn delete_slice(&mut self, range: impl RangeBounds<usize>) {
        let range = clamp(range, self.len());
        self.items.items_mut().drain(range).for_each(drop);
    }

    /// Append one item; see [`Args`] for what is accepted
    pub fn append(&mut self, args: Args) -> Result<()> {
        let raw = self.resolve("append", args)?;
        self.items.items_mut().push(raw);
        Ok(())
    }

    /// Append a single typed value
    pub fn push(&mut self, value: impl Into<FieldValue>) -> Result<()> {
        self.append(Args::one(value))
    }

    /// Insert one item before `index`; indexes past the end append
    pub fn insert(&mut self, index: usize, args: Args) -> Result<()> {
        let raw = self.resolve("insert", args)?;
        let index = index.min(self.len());
        self.items.items_mut().insert(index, raw);
        Ok(())
    }

    /// Append every value; nothing is appended if any conversion fails
    pub fn extend<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<FieldValue>,
    {
        let raw = self.convert_all(values)?;
        self.items.items_mut().extend(raw);
        Ok(())
    }

    /// Remove the first raw item equal to `value` in raw form
    pub fn remove(&mut self, value: impl Into<FieldValue>) -> Result<()> {
        let index = self.index(value)?;
        self.items.items_mut().remove(index);
        Ok(())
    }

    /// Remove and return the last item
    pub fn pop(&mut self) -> Result<FieldValue> {
        match self.len() {
            0 => Err(MappingError::IndexOutOfRange { index: 0, len: 0 }),
            len => self.pop_at(len - 1),
        }
    }

    /// Remove and return the item at `index`
    pub fn pop_at(&mut self, index: usize) -> Result<FieldValue> {
        self.check_index(index)?;
        let typed = self.element.to_typed(&self.raw()[index])?;
        self.items.items_mut().remove(index);
        Ok(typed)
    }

    fn convert_all<I>(&self, values: I) -> Result<Vec<Value>>
    where
        I: IntoIterator,
        I::Item: Into<FieldValue>,
    {
        values
            .into_iter()
            .map(|value| self.element.to_raw_with(value.into(), self.options))
            .collect()
    }

    fn resolve(&self, method: &'static str, args: Args) -> Result<Value> {
        let Args {
            mut positional,
            keywords,
        } = args;

        if positional.is_empty() {
            if let FieldKind::Nested(schema) = self.element.kind() {
                let record = Record::from_values_with(schema, keywords, self.options)?;
                return self.element.to_raw_with(FieldValue::Record(record), self.options);
            }
            return Err(MappingError::InvalidArity {
                method,
                given: keywords.len(),
            });
        }

        if positional.len() != 1 || !keywords.is_empty() {
            return Err(MappingError::InvalidArity {
                method,
                given: positional.len() + keywords.len(),
            });
        }

        let value = positional.swap_remove(0);
        self.element.to_raw_with(value, self.options)
    }
}

impl SequenceView<'static> {
    /// A view owning `items`
    pub fn owned(items: Vec<Value>, element: Arc<Field>) -> Self {
        Self {
            items: Backing::Owned(items),
            element,
            options: ConstructOptions::default(),
        }
    }
}

/// Typed iterator over a view
pub struct Iter<'v> {
    items: std::slice::Iter<'v, Value>,
    element: &'v Field,
}

impl Iterator for Iter<'_> {
    type Item = Result<FieldValue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(|raw| self.element.to_typed(raw))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<'v> IntoIterator for &'v SequenceView<'_> {
    type Item = Result<FieldValue>;
    type IntoIter = Iter<'v>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Clone for SequenceView<'_> {
    fn clone(&self) -> Self {
        Self {
            items: Backing::Owned(self.raw().to_vec()),
            element: Arc::clone(&self.element),
            options: self.options,
        }
    }
}

impl PartialEq<SequenceView<'_>> for SequenceView<'_> {
    fn eq(&self, other: &SequenceView<'_>) -> bool {
        self.raw() == other.raw()
    }
}

impl PartialEq<Vec<Value>> for SequenceView<'_> {
    fn eq(&self, other: &Vec<Value>) -> bool {
        self.raw() == other.as_slice()
    }
}

impl PartialEq<[Value]> for SequenceView<'_> {
    fn eq(&self, other: &[Value]) -> bool {
        self.raw() == other
    }
}

impl PartialOrd<SequenceView<'_>> for SequenceView<'_> {
    fn partial_cmp(&self, other: &SequenceView<'_>) -> Option<Ordering> {
        compare_items(self.raw(), other.raw())
    }
}

impl PartialOrd<Vec<Value>> for SequenceView<'_> {
    fn partial_cmp(&self, other: &Vec<Value>) -> Option<Ordering> {
        compare_items(self.raw(), other)
    }
}

impl fmt::Display for SequenceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = serde_json::to_string(self.raw()).map_err(|_| fmt::Error)?;
        f.write_str(&raw)
    }
}

impl fmt::Debug for SequenceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn clamp(range: impl RangeBounds<usize>, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end.saturating_add(1),
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };
    let end = end.min(len);
    start.min(end)..end
}

/// Orders raw values the way JSON scalars naturally compare. Values of
/// different kinds, and unequal objects, are unordered.
fn compare_raw(a: &Value, b: &Value) -> Option<Ordering> {
    if a == b {
        return Some(Ordering::Equal);
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.partial_cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => x.partial_cmp(y),
        (Value::Array(x), Value::Array(y)) => compare_items(x, y),
        _ => None,
    }
}

fn compare_items(a: &[Value], b: &[Value]) -> Option<Ordering> {
    for (x, y) in a.iter().zip(b) {
        match compare_raw(x, y)? {
            Ordering::Equal => continue,
            unequal => return Some(unequal),
        }
    }
    Some(a.len().cmp(&b.len()))
}
