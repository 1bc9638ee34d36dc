//! Scalar leaf codecs
//!
//! Each codec is a pure conversion pair between a raw JSON scalar and a typed
//! [`FieldValue`]. `to_raw` accepts values that are still in raw form
//! (`FieldValue::Json`) and normalizes them through `to_typed` first, so a
//! record can be built from either representation.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{MappingError, Result};
use crate::value::FieldValue;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Conversion contract for a scalar field kind
pub trait LeafCodec: fmt::Debug + Send + Sync {
    /// Kind name, e.g. "date"
    fn kind(&self) -> &'static str;

    /// Convert a non-null raw value to its typed form
    fn to_typed(&self, raw: &Value) -> Result<FieldValue>;

    /// Convert a non-null typed value to its raw form
    fn to_raw(&self, value: FieldValue) -> Result<Value>;
}

/// Text, the coercion used by plain fields
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl LeafCodec for TextCodec {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        Ok(FieldValue::Text(match raw {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn to_raw(&self, value: FieldValue) -> Result<Value> {
        match value {
            FieldValue::Text(s) => Ok(Value::String(s)),
            // keeps the fractional part of whole floats: 1.0 -> "1.0"
            FieldValue::Float(f) => Ok(Value::String(format!("{:?}", f))),
            FieldValue::Json(raw) => self.to_raw(self.to_typed(&raw)?),
            other => Ok(Value::String(other.to_string())),
        }
    }
}

/// 64-bit integers
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

/// Long integers; same storage as [`IntegerCodec`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LongCodec;

// 2^63 is exact in f64; i64::MAX is not.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Truncate toward zero, rejecting values an i64 cannot hold
fn truncate_float(kind: &'static str, f: f64) -> Result<i64> {
    let t = f.trunc();
    if t.is_finite() && (-I64_BOUND..I64_BOUND).contains(&t) {
        Ok(t as i64)
    } else {
        Err(MappingError::invalid_format(kind, f.to_string()))
    }
}

fn parse_integer(kind: &'static str, raw: &Value) -> Result<i64> {
    match raw {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(i),
            (None, Some(f)) if !n.is_u64() => truncate_float(kind, f),
            _ => Err(MappingError::invalid_format(kind, n.to_string())),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| MappingError::invalid_format(kind, s.as_str())),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(MappingError::mismatch(kind, other)),
    }
}

fn integer_of(kind: &'static str, value: FieldValue) -> Result<i64> {
    match value {
        FieldValue::Integer(n) => Ok(n),
        FieldValue::Float(f) => truncate_float(kind, f),
        FieldValue::Boolean(b) => Ok(i64::from(b)),
        FieldValue::Decimal(d) => d
            .trunc()
            .to_i64()
            .ok_or_else(|| MappingError::invalid_format(kind, d.to_string())),
        FieldValue::Text(s) => parse_integer(kind, &Value::String(s)),
        FieldValue::Json(raw) => parse_integer(kind, &raw),
        other => Err(MappingError::mismatch(kind, other)),
    }
}

impl LeafCodec for IntegerCodec {
    fn kind(&self) -> &'static str {
        "integer"
    }

    fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        parse_integer(self.kind(), raw).map(FieldValue::Integer)
    }

    fn to_raw(&self, value: FieldValue) -> Result<Value> {
        integer_of(self.kind(), value).map(Value::from)
    }
}

impl LeafCodec for LongCodec {
    fn kind(&self) -> &'static str {
        "long"
    }

    fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        parse_integer(self.kind(), raw).map(FieldValue::Integer)
    }

    fn to_raw(&self, value: FieldValue) -> Result<Value> {
        integer_of(self.kind(), value).map(Value::from)
    }
}

/// 64-bit floating point
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatCodec;

fn parse_float(raw: &Value) -> Result<f64> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| MappingError::invalid_format("float", n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| MappingError::invalid_format("float", s.as_str())),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(MappingError::mismatch("float", other)),
    }
}

impl LeafCodec for FloatCodec {
    fn kind(&self) -> &'static str {
        "float"
    }

    fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        parse_float(raw).map(FieldValue::Float)
    }

    fn to_raw(&self, value: FieldValue) -> Result<Value> {
        let f = match value {
            FieldValue::Float(f) => f,
            FieldValue::Integer(n) => n as f64,
            FieldValue::Boolean(b) => parse_float(&Value::Bool(b))?,
            FieldValue::Decimal(d) => d
                .to_f64()
                .ok_or_else(|| MappingError::invalid_format("float", d.to_string()))?,
            FieldValue::Text(s) => parse_float(&Value::String(s))?,
            FieldValue::Json(raw) => parse_float(&raw)?,
            other => return Err(MappingError::mismatch("float", other)),
        };
        // NaN and infinities have no JSON form
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| MappingError::invalid_format("float", f.to_string()))
    }
}

/// Booleans, coerced by truthiness
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

impl LeafCodec for BooleanCodec {
    fn kind(&self) -> &'static str {
        "boolean"
    }

    fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        Ok(FieldValue::Boolean(truthy(raw)))
    }

    fn to_raw(&self, value: FieldValue) -> Result<Value> {
        let b = match value {
            FieldValue::Boolean(b) => b,
            FieldValue::Integer(n) => n != 0,
            FieldValue::Float(f) => f != 0.0,
            FieldValue::Decimal(d) => !d.is_zero(),
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Json(raw) => truthy(&raw),
            FieldValue::Items(items) => !items.is_empty(),
            FieldValue::List(view) => !view.is_empty(),
            other => return Err(MappingError::mismatch("boolean", other)),
        };
        Ok(Value::Bool(b))
    }
}

/// Exact decimals, stored as text
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalCodec;

fn parse_decimal(text: &str) -> Result<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| MappingError::invalid_format("decimal", text))
}

impl LeafCodec for DecimalCodec {
    fn kind(&self) -> &'static str {
        "decimal"
    }

    fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        match raw {
            Value::String(s) => parse_decimal(s).map(FieldValue::Decimal),
            Value::Number(n) => parse_decimal(&n.to_string()).map(FieldValue::Decimal),
            other => Err(MappingError::mismatch("decimal", other)),
        }
    }

    fn to_raw(&self, value: FieldValue) -> Result<Value> {
        let d = match value {
            FieldValue::Decimal(d) => d,
            FieldValue::Integer(n) => Decimal::from(n),
            FieldValue::Float(f) => Decimal::try_from(f)
                .map_err(|_| MappingError::invalid_format("decimal", f.to_string()))?,
            FieldValue::Text(s) => parse_decimal(&s)?,
            FieldValue::Json(raw) => return self.to_raw(self.to_typed(&raw)?),
            other => return Err(MappingError::mismatch("decimal", other)),
        };
        Ok(Value::String(d.to_string()))
    }
}

/// Calendar dates as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCodec;

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| MappingError::invalid_format("date", text))
}

impl LeafCodec for DateCodec {
    fn kind(&self) -> &'static str {
        "date"
    }

    fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        match raw {
            Value::String(s) => parse_date(s).map(FieldValue::Date),
            other => Err(MappingError::mismatch("date", other)),
        }
    }

    fn to_raw(&self, value: FieldValue) -> Result<Value> {
        let date = match value {
            FieldValue::Date(d) => d,
            FieldValue::DateTime(dt) => dt.date(),
            FieldValue::Text(s) => parse_date(&s)?,
            FieldValue::Json(raw) => return self.to_raw(self.to_typed(&raw)?),
            other => return Err(MappingError::mismatch("date", other)),
        };
        Ok(Value::String(date.format(DATE_FORMAT).to_string()))
    }
}

/// Date-times as `YYYY-MM-DDTHH:MM:SSZ`, seconds precision
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCodec;

/// Drops any fractional seconds and trailing `Z` before parsing.
fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    let trimmed = text.split_once('.').map_or(text, |(head, _)| head);
    let trimmed = trimmed.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT)
        .map_err(|_| MappingError::invalid_format("datetime", text))
}

impl LeafCodec for DateTimeCodec {
    fn kind(&self) -> &'static str {
        "datetime"
    }

    fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        match raw {
            Value::String(s) => parse_datetime(s).map(FieldValue::DateTime),
            other => Err(MappingError::mismatch("datetime", other)),
        }
    }

    fn to_raw(&self, value: FieldValue) -> Result<Value> {
        let dt = match value {
            FieldValue::DateTime(dt) => dt,
            FieldValue::Date(d) => d.and_time(NaiveTime::default()),
            FieldValue::Text(s) => parse_datetime(&s)?,
            FieldValue::Json(raw) => return self.to_raw(self.to_typed(&raw)?),
            other => return Err(MappingError::mismatch("datetime", other)),
        };
        Ok(Value::String(format!("{}Z", dt.format(DATETIME_FORMAT))))
    }
}

/// Times of day as `HH:MM:SS`
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeCodec;

fn parse_time(text: &str) -> Result<NaiveTime> {
    let trimmed = text.split_once('.').map_or(text, |(head, _)| head);
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|_| MappingError::invalid_format("time", text))
}

impl LeafCodec for TimeCodec {
    fn kind(&self) -> &'static str {
        "time"
    }

    fn to_typed(&self, raw: &Value) -> Result<FieldValue> {
        match raw {
            Value::String(s) => parse_time(s).map(FieldValue::Time),
            other => Err(MappingError::mismatch("time", other)),
        }
    }

    fn to_raw(&self, value: FieldValue) -> Result<Value> {
        let time = match value {
            FieldValue::Time(t) => t,
            FieldValue::DateTime(dt) => dt.time(),
            FieldValue::Text(s) => parse_time(&s)?,
            FieldValue::Json(raw) => return self.to_raw(self.to_typed(&raw)?),
            other => return Err(MappingError::mismatch("time", other)),
        };
        Ok(Value::String(time.format(TIME_FORMAT).to_string()))
    }
}
