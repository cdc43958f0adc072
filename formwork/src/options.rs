//! Load-time limits.
//!
//! The transforms themselves are unbounded; callers that accept templates or
//! values from untrusted sources can cap nesting here. `LoadOptions` derives
//! `Deserialize` with defaults so it can sit inside a larger config file.

use serde::{Deserialize, Serialize};

use crate::error::{FieldPath, Result, SchemaError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Maximum nesting depth of fields. A top-level field is at depth 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Fail when `depth` is past the configured limit.
    pub(crate) fn check_depth(&self, depth: usize, id: &str) -> Result<()> {
        match self.max_depth {
            Some(limit) if depth > limit => Err(SchemaError::DepthExceeded {
                path: FieldPath::of(id),
                limit,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded() {
        let opts = LoadOptions::default();
        assert!(opts.max_depth.is_none());
        assert!(opts.check_depth(10_000, "deep").is_ok());
    }

    #[test]
    fn limit_is_inclusive() {
        let opts = LoadOptions::new().with_max_depth(2);
        assert!(opts.check_depth(2, "f").is_ok());
        let err = opts.check_depth(3, "f").unwrap_err();
        assert!(err.to_string().contains("limit of 2"));
    }

    #[test]
    fn deserializes_from_partial_yaml() {
        let opts: LoadOptions = serde_yaml_ng::from_str("max_depth: 8\n").unwrap();
        assert_eq!(opts.max_depth, Some(8));

        let empty: LoadOptions = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(empty, LoadOptions::default());
    }
}
