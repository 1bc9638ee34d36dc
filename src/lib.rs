//! Familiar JSON Mapper
//!
//! Schema-driven mapping between raw JSON value trees and typed records.
//! A record keeps its data in raw form and converts on every read and write,
//! so the stored mapping is always ready to serialize.
//!
//! ## Features
//!
//! - **Declarative Schemas**: Fields declared once, with defaults and storage names
//! - **Inheritance**: Schemas extend parents, own fields win on collision
//! - **Nested Records**: Mappings whose shape is itself a schema
//! - **Lazy Sequences**: List views that convert elements only when touched
//! - **Leaf Codecs**: Text, numbers, booleans, decimals, dates, datetimes, times
//!
//! ## Architecture
//!
//! ```text
//!   raw JSON (serde_json::Value)          typed form (FieldValue)
//!   ┌──────────────────────────┐  read   ┌──────────────────────────┐
//!   │ Record                   │ ──────> │ Field::to_typed          │
//!   │  └─ Map<String, Value>   │ <────── │ Field::to_raw            │
//!   └──────────────────────────┘  write  └──────────────────────────┘
//!              │ list field
//!              v
//!   SequenceView ── element Field ── LeafCodec / nested Schema
//! ```
//!
//! ## Example
//!
//! ```
//! use familiar_jsonmap::{Args, Field, Record, Schema};
//! use serde_json::json;
//!
//! let author = Schema::builder("Author")
//!     .field("name", Field::text())
//!     .field("email", Field::text())
//!     .build();
//! let post = Schema::builder("Post")
//!     .field("author", Field::nested(&author))
//!     .field("published", Field::list(Field::datetime()))
//!     .build();
//!
//! let mut record = Record::empty(&post).unwrap();
//! record
//!     .sequence("published")
//!     .unwrap()
//!     .append(Args::one("2007-04-01T15:30:00.25"))
//!     .unwrap();
//! assert_eq!(record.raw("published"), Some(&json!(["2007-04-01T15:30:00Z"])));
//! ```

pub mod config;
pub mod declare;
pub mod error;
pub mod field;
pub mod leaf;
pub mod record;
pub mod schema;
pub mod sequence;
pub mod value;

pub use config::{MapperConfig, OutputFormat};
pub use declare::{SchemaFile, SchemaSet};
pub use error::{MappingError, Result};
pub use field::{Field, FieldDefault, FieldKind};
pub use leaf::{
    BooleanCodec, DateCodec, DateTimeCodec, DecimalCodec, FloatCodec, IntegerCodec, LeafCodec,
    LongCodec, TextCodec, TimeCodec,
};
pub use record::{ConstructOptions, Record, UnknownKeys};
pub use schema::{Schema, SchemaBuilder};
pub use sequence::{Args, SequenceView};
pub use value::FieldValue;
