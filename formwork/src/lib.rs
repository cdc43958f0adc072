//! Schema-driven field templates
//!
//! `formwork` compiles a template document into a tree of typed [`Field`]s and
//! uses it to validate and convert value documents. Both templates and values
//! travel as a generic [`Document`]; decoding JSON or YAML into a `Document`
//! is left to serde.
//!
//! # Architecture
//!
//! - **Templates**: `Schema::load_template` / `dump_template` convert between a
//!   template document and a compiled [`Schema`]
//! - **Values**: `Schema::load_value` checks a value document against the
//!   compiled schema and returns a fresh [`ValueSchema`]; `dump_value` renders it back
//! - **Fail-fast**: every load either succeeds or returns the first
//!   [`SchemaError`], annotated with the path of the offending field
//! - **Read-only templates**: loading values never mutates the template, so a
//!   compiled schema can be shared between threads
//!
//! ```rust
//! use formwork::{Document, Schema};
//!
//! # fn main() -> formwork::Result<()> {
//! let template = Document::from_yaml_str(
//!     "id: settings
//! name: Settings
//! fields:
//!   - id: theme
//!     name: Theme
//!     kind: select
//!     select: [light, dark]
//! ",
//! )?;
//! let schema = Schema::load_template(&template)?;
//!
//! let input = Document::from_json_str(r#"{"settings": {"theme": "dark"}}"#)?;
//! let values = schema.load_value(&input)?;
//! assert_eq!(values.field("theme").and_then(|f| f.as_str()), Some("dark"));
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod error;
pub mod field;
pub mod kind;
pub mod options;
pub mod schema;
pub mod validation;

pub use document::{Document, DocumentMap};
pub use error::{ErrorKind, FieldPath, Result, SchemaError};
pub use field::{Field, FieldSpec, FieldValue, ValueField};
pub use kind::FieldKind;
pub use options::LoadOptions;
pub use schema::{Schema, ValueSchema};
pub use validation::{NoValidation, ValueValidator};
