//! The closed set of field kinds and their document tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FieldPath, SchemaError};

/// The kind of a field. Determines its template payload and value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single line of free text
    String,
    /// Multiline free text
    Text,
    Number,
    Password,
    /// Flat list of unconstrained strings
    Append,
    /// One value from a fixed candidate list
    Select,
    /// Subset of a fixed candidate list
    SelectArray,
    /// Sub-record of named child fields
    Array,
    /// Exactly one child, chosen by presence in the value map
    NestSelect,
    /// Any number of children, chosen by presence in the value map
    NestSelectArray,
    /// Each child maps to zero or more repeated values
    IncrementArray,
}

impl FieldKind {
    pub const ALL: [FieldKind; 11] = [
        FieldKind::String,
        FieldKind::Text,
        FieldKind::Number,
        FieldKind::Password,
        FieldKind::Append,
        FieldKind::Select,
        FieldKind::SelectArray,
        FieldKind::Array,
        FieldKind::NestSelect,
        FieldKind::NestSelectArray,
        FieldKind::IncrementArray,
    ];

    /// The tag used for `kind` in documents, and as the payload key for list kinds.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Password => "password",
            FieldKind::Append => "append",
            FieldKind::Select => "select",
            FieldKind::SelectArray => "selectarray",
            FieldKind::Array => "array",
            FieldKind::NestSelect => "nestselect",
            FieldKind::NestSelectArray => "nestselectarray",
            FieldKind::IncrementArray => "incrementarray",
        }
    }

    /// Kinds holding a single typed scalar value.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            FieldKind::String | FieldKind::Text | FieldKind::Number | FieldKind::Password
        )
    }

    /// Kinds whose template carries a candidate list.
    pub fn has_options(self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::SelectArray)
    }

    /// Kinds whose template carries child fields.
    pub fn has_children(self) -> bool {
        matches!(
            self,
            FieldKind::Array
                | FieldKind::NestSelect
                | FieldKind::NestSelectArray
                | FieldKind::IncrementArray
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SchemaError::UnsupportedKind {
                path: FieldPath::root(),
                kind: s.to_string(),
            })
    }
}
