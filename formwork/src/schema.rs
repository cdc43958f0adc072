//! Schema: a named list of top-level fields.
//!
//! A loaded [`Schema`] is a compiled template: it is read-only and can
//! validate any number of value documents. Each call to
//! [`Schema::load_value`] produces an independent [`ValueSchema`].
//!
//! Value documents are wrapped in a single envelope key equal to the schema ID:
//!
//! ```text
//! { "<schema id>": { "<field id>": <field value>, ... } }
//! ```

use tracing::debug;

use crate::document::{Document, DocumentMap};
use crate::error::{FieldPath, Result, SchemaError};
use crate::field::{Field, ValueContext, ValueField};
use crate::options::LoadOptions;
use crate::validation::{NoValidation, ValueValidator};

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub id: String,
    pub name: String,
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a top-level field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// First top-level field with the given ID.
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Build a schema from its template document.
    ///
    /// `id` and `name` must be strings. `fields`, when it is a sequence, must
    /// hold field templates; a missing or non-sequence `fields` gives an empty
    /// schema. The first failing field aborts the load.
    pub fn load_template(doc: &Document) -> Result<Self> {
        Self::load_template_with(doc, &LoadOptions::default())
    }

    pub fn load_template_with(doc: &Document, options: &LoadOptions) -> Result<Self> {
        let Some(map) = doc.as_map() else {
            return Err(SchemaError::structural(
                FieldPath::root(),
                format!("schema template must be a map, found {}", doc.kind_name()),
            ));
        };

        let id = map.get("id").and_then(Document::as_str).ok_or_else(|| {
            SchemaError::structural(FieldPath::root(), "id is required or value is not string")
        })?;
        let name = map.get("name").and_then(Document::as_str).ok_or_else(|| {
            SchemaError::structural(FieldPath::of(id), "name is required or value is not string")
        })?;

        let mut fields = Vec::new();
        if let Some(items) = map.get("fields").and_then(Document::as_sequence) {
            for item in items {
                if item.as_map().is_none() {
                    return Err(SchemaError::structural(
                        FieldPath::of(id),
                        format!("field element is not a map, found {}", item.kind_name()),
                    ));
                }
                let field = Field::parse_template(item, options, 1).map_err(|e| e.within(id))?;
                fields.push(field);
            }
        }

        debug!(schema = %id, fields = fields.len(), "loaded schema template");

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            fields,
        })
    }

    /// Render the schema back to its template document. Always emits `fields`.
    pub fn dump_template(&self) -> Document {
        let mut map = DocumentMap::new();
        map.insert("id".into(), self.id.as_str().into());
        map.insert("name".into(), self.name.as_str().into());
        let fields = self.fields.iter().map(Field::dump_template).collect::<Vec<_>>();
        map.insert("fields".into(), fields.into());
        Document::Map(map)
    }

    /// Validate a value document against this schema.
    pub fn load_value(&self, doc: &Document) -> Result<ValueSchema> {
        self.load_value_with(doc, &LoadOptions::default(), &NoValidation)
    }

    /// Like [`Schema::load_value`], with depth limits and a validator hook.
    pub fn load_value_with(
        &self,
        doc: &Document,
        options: &LoadOptions,
        validator: &dyn ValueValidator,
    ) -> Result<ValueSchema> {
        let Some(envelope) = doc.get(&self.id) else {
            return Err(SchemaError::structural(
                FieldPath::root(),
                format!("schema {} not found in value document", self.id),
            ));
        };
        let Some(values) = envelope.as_map() else {
            return Err(SchemaError::structural(
                FieldPath::root(),
                format!("schema {} value must be a map, found {}", self.id, envelope.kind_name()),
            ));
        };

        let ctx = ValueContext { options, validator };
        let mut fields = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            match values.get(&field.id) {
                Some(raw) => {
                    let resolved = field.resolve(raw, &ctx, 1).map_err(|e| e.within(&self.id))?;
                    fields.push(resolved);
                }
                None if field.required => {
                    return Err(SchemaError::RequiredFieldMissing {
                        path: FieldPath::of(&self.id),
                        field: field.id.clone(),
                    });
                }
                None => {}
            }
        }

        debug!(schema = %self.id, fields = fields.len(), "resolved schema value");

        Ok(ValueSchema {
            id: self.id.clone(),
            name: self.name.clone(),
            fields,
        })
    }
}

/// A schema resolved against a value document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSchema {
    pub id: String,
    pub name: String,
    pub fields: Vec<ValueField>,
}

impl ValueSchema {
    /// First resolved top-level field with the given ID.
    pub fn field(&self, id: &str) -> Option<&ValueField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Render the values back to a document wrapped in the schema envelope.
    pub fn dump_value(&self) -> Result<Document> {
        let mut values = DocumentMap::new();
        for field in &self.fields {
            let dumped = field.dump_value().map_err(|e| e.within(&self.id))?;
            values.insert(field.id.clone(), dumped);
        }
        let mut envelope = DocumentMap::new();
        envelope.insert(self.id.clone(), Document::Map(values));
        Ok(Document::Map(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::field::FieldSpec;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::from(value)
    }

    fn profile_schema() -> Schema {
        Schema::load_template(&doc(json!({
            "id": "profile",
            "name": "Profile",
            "fields": [
                {"id": "nickname", "name": "Nickname", "kind": "string", "required": true},
                {"id": "age", "name": "Age", "kind": "number"},
                {"id": "theme", "name": "Theme", "kind": "select", "select": ["light", "dark"]},
            ]
        })))
        .unwrap()
    }

    #[test]
    fn loads_fields_in_order() {
        let schema = profile_schema();
        assert_eq!(schema.id, "profile");
        assert_eq!(schema.name, "Profile");
        let ids: Vec<_> = schema.fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["nickname", "age", "theme"]);
        assert!(schema.field("theme").is_some());
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn missing_fields_key_gives_empty_schema() {
        let schema = Schema::load_template(&doc(json!({"id": "s", "name": "S"}))).unwrap();
        assert!(schema.fields.is_empty());

        let source = doc(json!({"id": "s", "name": "S", "fields": "x"}));
        let schema = Schema::load_template(&source).unwrap();
        assert!(schema.fields.is_empty());
    }

    #[test]
    fn non_map_field_element_fails() {
        let source = doc(json!({"id": "s", "name": "S", "fields": ["x"]}));
        let err = Schema::load_template(&source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralType);
        assert!(err.to_string().contains("field element is not a map"));
    }

    #[test]
    fn first_field_error_wins() {
        let err = Schema::load_template(&doc(json!({
            "id": "s", "name": "S",
            "fields": [
                {"id": "a", "name": "A", "kind": "nope"},
                {"id": "b", "name": 1, "kind": "string"},
            ]
        })))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedKind);
        assert_eq!(err.path().unwrap().segments(), ["s", "a"]);
    }

    #[test]
    fn missing_schema_id_fails() {
        let err = Schema::load_template(&doc(json!({"name": "S"}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralType);
    }

    #[test]
    fn dump_template_always_has_fields() {
        let schema = Schema::new("s", "S");
        assert_eq!(
            schema.dump_template(),
            doc(json!({"id": "s", "name": "S", "fields": []}))
        );
    }

    #[test]
    fn value_envelope_is_required() {
        let schema = profile_schema();
        let err = schema.load_value(&doc(json!({"other": {}}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralType);
        assert!(err.to_string().contains("profile not found"));

        let err = schema.load_value(&doc(json!({"profile": []}))).unwrap_err();
        assert!(err.to_string().contains("must be a map"));
    }

    #[test]
    fn required_top_level_field_enforced() {
        let schema = profile_schema();
        let err = schema.load_value(&doc(json!({"profile": {"age": 3}}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequiredFieldMissing);
        assert_eq!(err.to_string(), "profile: required field 'nickname' is missing");
    }

    #[test]
    fn value_round_trip() {
        let schema = profile_schema();
        let input = doc(json!({"profile": {"nickname": "ada", "age": 36, "theme": "dark"}}));
        let values = schema.load_value(&input).unwrap();
        assert_eq!(values.id, "profile");
        assert_eq!(values.field("theme").unwrap().as_str(), Some("dark"));
        assert_eq!(values.dump_value().unwrap(), input);
    }

    #[test]
    fn absent_optional_top_level_field_is_omitted() {
        let schema = profile_schema();
        let values = schema.load_value(&doc(json!({"profile": {"nickname": "ada"}}))).unwrap();
        assert_eq!(values.fields.len(), 1);
        assert_eq!(
            values.dump_value().unwrap(),
            doc(json!({"profile": {"nickname": "ada"}}))
        );
    }

    #[test]
    fn nested_errors_are_prefixed_with_schema_id() {
        let schema = profile_schema();
        let err = schema
            .load_value(&doc(json!({"profile": {"nickname": "ada", "theme": "neon"}})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidChoice);
        assert_eq!(err.to_string(), "profile.theme: invalid select value 'neon'");
    }

    #[test]
    fn built_schema_matches_loaded_schema() {
        let built = Schema::new("profile", "Profile")
            .with_field(Field::new("nickname", "Nickname", FieldSpec::String).required())
            .with_field(Field::new("age", "Age", FieldSpec::Number))
            .with_field(Field::new(
                "theme",
                "Theme",
                FieldSpec::Select {
                    options: vec!["light".into(), "dark".into()],
                },
            ));
        assert_eq!(built, profile_schema());
    }

    #[test]
    fn validator_runs_through_schema() {
        let schema = Schema::new("s", "S")
            .with_field(Field::new("pin", "PIN", FieldSpec::Password).with_validator("digits"));
        let digits = |_: &str, value: &ValueField| -> std::result::Result<(), String> {
            if value.as_str().is_some_and(|s| s.chars().all(|c| c.is_ascii_digit())) {
                Ok(())
            } else {
                Err("digits only".into())
            }
        };

        let opts = LoadOptions::default();
        let ok = schema.load_value_with(&doc(json!({"s": {"pin": "1234"}})), &opts, &digits);
        assert!(ok.is_ok());

        let err = schema
            .load_value_with(&doc(json!({"s": {"pin": "12ab"}})), &opts, &digits)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidatorRejected);
        assert_eq!(err.path().unwrap().segments(), ["s", "pin"]);
    }
}
