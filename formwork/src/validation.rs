//! Caller-supplied interpretation of `validator` tags.
//!
//! The core carries a field's `validator` tag through template load and dump
//! without reading it. Callers that give those tags meaning implement
//! [`ValueValidator`] and pass it to `load_value_with`; it runs once for every
//! resolved value whose template names a validator and whose kind is one of
//! `string`, `text`, `number` or `password`. Those are the only kinds that
//! keep their validator through a template dump, so other kinds never reach
//! the hook.

use crate::field::ValueField;

pub trait ValueValidator {
    /// Check a resolved value against the rule named by `tag`.
    ///
    /// Return `Err` with a human-readable reason to reject the value.
    fn validate(&self, tag: &str, value: &ValueField) -> std::result::Result<(), String>;
}

/// Accepts everything. Used by the plain `load_value` entry points.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl ValueValidator for NoValidation {
    fn validate(&self, _tag: &str, _value: &ValueField) -> std::result::Result<(), String> {
        Ok(())
    }
}

impl<F> ValueValidator for F
where
    F: Fn(&str, &ValueField) -> std::result::Result<(), String>,
{
    fn validate(&self, tag: &str, value: &ValueField) -> std::result::Result<(), String> {
        self(tag, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;

    fn sample() -> ValueField {
        ValueField {
            id: "f".into(),
            name: "F".into(),
            value: FieldValue::String("x".into()),
        }
    }

    #[test]
    fn no_validation_accepts_anything() {
        assert!(NoValidation.validate("anything", &sample()).is_ok());
    }

    #[test]
    fn closures_are_validators() {
        let reject = |tag: &str, _: &ValueField| -> std::result::Result<(), String> {
            Err(format!("{tag} says no"))
        };
        let validator: &dyn ValueValidator = &reject;
        assert_eq!(validator.validate("strict", &sample()).unwrap_err(), "strict says no");
    }
}
