//! Error types for template and value transforms
//!
//! Every domain error carries a [`FieldPath`] naming the field it was raised
//! for. Recursive transforms prepend the parent's ID as the error bubbles up,
//! so the caller sees the full chain from the outermost field down to the
//! offending one.

use std::fmt;

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Ordered field IDs from the outermost known ancestor to the offending field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// An empty path, used when the offending field has no ID yet.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A path holding a single field ID.
    pub fn of(id: impl Into<String>) -> Self {
        Self(vec![id.into()])
    }

    /// Push an ancestor ID onto the front of the path.
    pub fn prepend(&mut self, id: impl Into<String>) {
        self.0.insert(0, id.into());
    }

    /// The ID of the innermost field, if any.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

/// Coarse classification of [`SchemaError`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StructuralType,
    UnsupportedKind,
    RequiredFieldMissing,
    InvalidChoice,
    ValidatorRejected,
    DepthExceeded,
    Codec,
}

/// Errors raised while loading or dumping templates and values
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A required key is missing or holds the wrong document type
    #[error("{path}: {message}")]
    StructuralType { path: FieldPath, message: String },

    /// The `kind` tag is not one of the recognized field kinds
    #[error("{path}: unsupported field kind '{kind}'")]
    UnsupportedKind { path: FieldPath, kind: String },

    /// A required child is absent from a value document
    #[error("{path}: required field '{field}' is missing")]
    RequiredFieldMissing { path: FieldPath, field: String },

    /// A select or selectarray value is not one of the template's options
    #[error("{path}: invalid select value '{value}'")]
    InvalidChoice { path: FieldPath, value: String },

    /// A caller-supplied validator refused a resolved value
    #[error("{path}: validator '{validator}' rejected value: {message}")]
    ValidatorRejected {
        path: FieldPath,
        validator: String,
        message: String,
    },

    /// Nesting went past the configured `max_depth`
    #[error("{path}: nesting depth exceeds limit of {limit}")]
    DepthExceeded { path: FieldPath, limit: usize },

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SchemaError {
    pub fn structural(path: FieldPath, message: impl Into<String>) -> Self {
        Self::StructuralType {
            path,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StructuralType { .. } => ErrorKind::StructuralType,
            Self::UnsupportedKind { .. } => ErrorKind::UnsupportedKind,
            Self::RequiredFieldMissing { .. } => ErrorKind::RequiredFieldMissing,
            Self::InvalidChoice { .. } => ErrorKind::InvalidChoice,
            Self::ValidatorRejected { .. } => ErrorKind::ValidatorRejected,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::Json(_) | Self::Yaml(_) => ErrorKind::Codec,
        }
    }

    /// The path of the offending field, if this is a domain error.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::StructuralType { path, .. }
            | Self::UnsupportedKind { path, .. }
            | Self::RequiredFieldMissing { path, .. }
            | Self::InvalidChoice { path, .. }
            | Self::ValidatorRejected { path, .. }
            | Self::DepthExceeded { path, .. } => Some(path),
            Self::Json(_) | Self::Yaml(_) => None,
        }
    }

    /// Annotate the error with the ID of an enclosing field.
    pub fn within(mut self, id: &str) -> Self {
        match &mut self {
            Self::StructuralType { path, .. }
            | Self::UnsupportedKind { path, .. }
            | Self::RequiredFieldMissing { path, .. }
            | Self::InvalidChoice { path, .. }
            | Self::ValidatorRejected { path, .. }
            | Self::DepthExceeded { path, .. } => path.prepend(id),
            Self::Json(_) | Self::Yaml(_) => {}
        }
        self
    }
}
