//! Template fields and the values resolved from them.
//!
//! A [`Field`] is a node of a compiled template: its [`FieldSpec`] decides
//! what payload it carries (nothing, a candidate list, or child fields) and
//! how a raw value document is checked against it. Resolving a value never
//! touches the template; it builds a fresh [`ValueField`] tree.

use std::collections::{BTreeMap, HashSet};

use tracing::{trace, warn};

use crate::document::{Document, DocumentMap};
use crate::error::{FieldPath, Result, SchemaError};
use crate::kind::FieldKind;
use crate::options::LoadOptions;
use crate::validation::{NoValidation, ValueValidator};

/// Kind-specific template payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    String,
    Text,
    Number,
    Password,
    Append,
    Select { options: Vec<String> },
    SelectArray { options: Vec<String> },
    Array { children: Vec<Field> },
    NestSelect { children: Vec<Field> },
    NestSelectArray { children: Vec<Field> },
    IncrementArray { children: Vec<Field> },
}

impl FieldSpec {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldSpec::String => FieldKind::String,
            FieldSpec::Text => FieldKind::Text,
            FieldSpec::Number => FieldKind::Number,
            FieldSpec::Password => FieldKind::Password,
            FieldSpec::Append => FieldKind::Append,
            FieldSpec::Select { .. } => FieldKind::Select,
            FieldSpec::SelectArray { .. } => FieldKind::SelectArray,
            FieldSpec::Array { .. } => FieldKind::Array,
            FieldSpec::NestSelect { .. } => FieldKind::NestSelect,
            FieldSpec::NestSelectArray { .. } => FieldKind::NestSelectArray,
            FieldSpec::IncrementArray { .. } => FieldKind::IncrementArray,
        }
    }
}

/// A template field.
///
/// The kind is fixed by the payload variant chosen at construction or load.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: String,
    pub name: String,
    /// Only consulted when a parent resolves its children.
    pub required: bool,
    pub desc: Option<String>,
    /// Opaque tag, interpreted by a caller-supplied [`ValueValidator`].
    pub validator: Option<String>,
    spec: FieldSpec,
}

/// Shared state threaded through value resolution.
pub(crate) struct ValueContext<'a> {
    pub options: &'a LoadOptions,
    pub validator: &'a dyn ValueValidator,
}

/// Intermediate element of a template payload list.
enum ListItem {
    Text(String),
    Number,
    Field(Field),
}

impl Field {
    pub fn new(id: impl Into<String>, name: impl Into<String>, spec: FieldSpec) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            required: false,
            desc: None,
            validator: None,
            spec,
        }
    }

    /// Mark the field as required under its parent.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into()).filter(|d| !d.is_empty());
        self
    }

    pub fn with_validator(mut self, tag: impl Into<String>) -> Self {
        self.validator = Some(tag.into()).filter(|v| !v.is_empty());
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.spec.kind()
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Candidate list of a select or selectarray field; empty for other kinds.
    pub fn options(&self) -> &[String] {
        match &self.spec {
            FieldSpec::Select { options } | FieldSpec::SelectArray { options } => options,
            _ => &[],
        }
    }

    /// Child templates of a recursive field; empty for other kinds.
    pub fn children(&self) -> &[Field] {
        match &self.spec {
            FieldSpec::Array { children }
            | FieldSpec::NestSelect { children }
            | FieldSpec::NestSelectArray { children }
            | FieldSpec::IncrementArray { children } => children,
            _ => &[],
        }
    }

    /// First child with the given ID.
    pub fn child(&self, id: &str) -> Option<&Field> {
        self.children().iter().find(|c| c.id == id)
    }

    // --- Template transforms ---

    /// Build a template field from its document form.
    pub fn load_template(doc: &Document) -> Result<Self> {
        Self::load_template_with(doc, &LoadOptions::default())
    }

    pub fn load_template_with(doc: &Document, options: &LoadOptions) -> Result<Self> {
        Self::parse_template(doc, options, 1)
    }

    pub(crate) fn parse_template(
        doc: &Document,
        options: &LoadOptions,
        depth: usize,
    ) -> Result<Self> {
        let Some(map) = doc.as_map() else {
            return Err(SchemaError::structural(
                FieldPath::root(),
                format!("field template must be a map, found {}", doc.kind_name()),
            ));
        };

        let id = required_str(map, "id", FieldPath::root())?;
        options.check_depth(depth, id)?;
        let name = required_str(map, "name", FieldPath::of(id))?;
        let tag = required_str(map, "kind", FieldPath::of(id))?;
        let kind: FieldKind = tag.parse().map_err(|e: SchemaError| e.within(id))?;

        let payload = map.get(tag);
        let list = || load_list(id, kind, payload, options, depth);
        let spec = match kind {
            FieldKind::String => FieldSpec::String,
            FieldKind::Text => FieldSpec::Text,
            FieldKind::Number => FieldSpec::Number,
            FieldKind::Password => FieldSpec::Password,
            FieldKind::Append => FieldSpec::Append,
            FieldKind::Select => FieldSpec::Select {
                options: into_options(id, kind, list()?)?,
            },
            FieldKind::SelectArray => FieldSpec::SelectArray {
                options: into_options(id, kind, list()?)?,
            },
            FieldKind::Array => FieldSpec::Array {
                children: into_children(id, kind, list()?)?,
            },
            FieldKind::NestSelect => FieldSpec::NestSelect {
                children: into_children(id, kind, list()?)?,
            },
            FieldKind::NestSelectArray => FieldSpec::NestSelectArray {
                children: into_children(id, kind, list()?)?,
            },
            FieldKind::IncrementArray => FieldSpec::IncrementArray {
                children: into_children(id, kind, list()?)?,
            },
        };

        // Optional keys of the wrong type are ignored rather than rejected.
        let required = map.get("required").and_then(Document::as_bool).unwrap_or(false);
        let desc = optional_str(map, "desc");
        let validator = optional_str(map, "validator");

        trace!(field = %id, %kind, depth, "loaded field template");

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            required,
            desc,
            validator,
            spec,
        })
    }

    /// Render the template back to its document form.
    pub fn dump_template(&self) -> Document {
        let kind = self.kind();
        let mut map = DocumentMap::new();
        map.insert("id".into(), self.id.as_str().into());
        map.insert("name".into(), self.name.as_str().into());
        map.insert("kind".into(), kind.as_str().into());

        if self.required {
            map.insert("required".into(), true.into());
        }
        if let Some(desc) = self.desc.as_deref().filter(|d| !d.is_empty()) {
            map.insert("desc".into(), desc.into());
        }

        match &self.spec {
            FieldSpec::Select { options } | FieldSpec::SelectArray { options } => {
                map.insert(kind.as_str().into(), options.clone().into());
            }
            FieldSpec::Array { children }
            | FieldSpec::NestSelect { children }
            | FieldSpec::NestSelectArray { children }
            | FieldSpec::IncrementArray { children } => {
                let dumped = children.iter().map(Field::dump_template).collect::<Vec<_>>();
                map.insert(kind.as_str().into(), dumped.into());
            }
            FieldSpec::String | FieldSpec::Text | FieldSpec::Number | FieldSpec::Password => {
                if let Some(validator) = self.scalar_validator() {
                    map.insert("validator".into(), validator.into());
                }
            }
            FieldSpec::Append => {}
        }

        Document::Map(map)
    }

    // --- Value transforms ---

    /// Check a raw value against this template and resolve it into a value tree.
    pub fn load_value(&self, raw: &Document) -> Result<ValueField> {
        self.load_value_with(raw, &LoadOptions::default(), &NoValidation)
    }

    /// Like [`Field::load_value`], with depth limits and a validator hook.
    pub fn load_value_with(
        &self,
        raw: &Document,
        options: &LoadOptions,
        validator: &dyn ValueValidator,
    ) -> Result<ValueField> {
        let ctx = ValueContext { options, validator };
        self.resolve(raw, &ctx, 1)
    }

    pub(crate) fn resolve(
        &self,
        raw: &Document,
        ctx: &ValueContext<'_>,
        depth: usize,
    ) -> Result<ValueField> {
        ctx.options.check_depth(depth, &self.id)?;
        trace!(field = %self.id, kind = %self.kind(), depth, "resolving value");

        let value = match &self.spec {
            FieldSpec::String => FieldValue::String(self.expect_str(raw)?.to_string()),
            FieldSpec::Text => FieldValue::Text(self.expect_str(raw)?.to_string()),
            FieldSpec::Password => FieldValue::Password(self.expect_str(raw)?.to_string()),
            FieldSpec::Number => match raw.as_f64() {
                Some(n) => FieldValue::Number(n),
                None => return Err(self.mismatch(raw, "a number")),
            },
            FieldSpec::Append => {
                let items = self.expect_sequence(raw)?;
                FieldValue::Append(items.iter().map(Document::to_plain_string).collect())
            }
            FieldSpec::Select { options } => {
                let chosen = self.expect_str(raw)?;
                if !options.iter().any(|o| o == chosen) {
                    return Err(self.invalid_choice(chosen));
                }
                FieldValue::Select(chosen.to_string())
            }
            FieldSpec::SelectArray { options } => {
                let items = self.expect_sequence(raw)?;
                let mut chosen = Vec::with_capacity(items.len());
                for item in items {
                    let text = item.to_plain_string();
                    if !options.contains(&text) {
                        return Err(self.invalid_choice(&text));
                    }
                    chosen.push(text);
                }
                FieldValue::SelectArray(chosen)
            }
            FieldSpec::Array { children } => {
                FieldValue::Array(self.resolve_present(children, raw, ctx, depth, false)?)
            }
            FieldSpec::NestSelectArray { children } => {
                FieldValue::NestSelectArray(self.resolve_present(children, raw, ctx, depth, false)?)
            }
            FieldSpec::NestSelect { children } => {
                let chosen = self.resolve_present(children, raw, ctx, depth, true)?;
                FieldValue::NestSelect(chosen.into_iter().next().map(Box::new))
            }
            FieldSpec::IncrementArray { children } => {
                let map = self.expect_map(raw)?;
                let mut resolved = Vec::new();
                // Absent children are skipped even when required: zero repetitions is valid.
                for child in children {
                    let Some(child_raw) = map.get(&child.id) else {
                        continue;
                    };
                    let Some(items) = child_raw.as_sequence() else {
                        return Err(child.mismatch(child_raw, "a sequence").within(&self.id));
                    };
                    for item in items {
                        resolved.push(self.resolve_child(child, item, ctx, depth)?);
                    }
                }
                FieldValue::IncrementArray(resolved)
            }
        };

        let field = ValueField {
            id: self.id.clone(),
            name: self.name.clone(),
            value,
        };

        // Only scalar kinds keep their validator through a template dump.
        if let Some(tag) = self.scalar_validator() {
            ctx.validator
                .validate(tag, &field)
                .map_err(|message| SchemaError::ValidatorRejected {
                    path: FieldPath::of(&self.id),
                    validator: tag.to_string(),
                    message,
                })?;
        }

        Ok(field)
    }

    /// Resolve every child whose ID is a key of `raw`, in template order.
    ///
    /// A required child that is absent fails the call if it is reached before
    /// the walk stops. With `first_only`, the walk stops at the first present child.
    fn resolve_present(
        &self,
        children: &[Field],
        raw: &Document,
        ctx: &ValueContext<'_>,
        depth: usize,
        first_only: bool,
    ) -> Result<Vec<ValueField>> {
        let map = self.expect_map(raw)?;
        let mut resolved = Vec::new();
        for child in children {
            match map.get(&child.id) {
                Some(child_raw) => {
                    resolved.push(self.resolve_child(child, child_raw, ctx, depth)?);
                    if first_only {
                        break;
                    }
                }
                None if child.required => {
                    return Err(SchemaError::RequiredFieldMissing {
                        path: FieldPath::of(&self.id),
                        field: child.id.clone(),
                    });
                }
                None => {}
            }
        }
        Ok(resolved)
    }

    fn resolve_child(
        &self,
        child: &Field,
        raw: &Document,
        ctx: &ValueContext<'_>,
        depth: usize,
    ) -> Result<ValueField> {
        child
            .resolve(raw, ctx, depth + 1)
            .map_err(|e| e.within(&self.id))
    }

    /// The validator tag, when the kind is one that honors it.
    fn scalar_validator(&self) -> Option<&str> {
        self.validator
            .as_deref()
            .filter(|v| !v.is_empty() && self.kind().is_scalar())
    }

    fn expect_str<'d>(&self, raw: &'d Document) -> Result<&'d str> {
        raw.as_str().ok_or_else(|| self.mismatch(raw, "a string"))
    }

    fn expect_sequence<'d>(&self, raw: &'d Document) -> Result<&'d [Document]> {
        raw.as_sequence().ok_or_else(|| self.mismatch(raw, "a sequence"))
    }

    fn expect_map<'d>(&self, raw: &'d Document) -> Result<&'d DocumentMap> {
        raw.as_map().ok_or_else(|| self.mismatch(raw, "a map"))
    }

    fn mismatch(&self, raw: &Document, expected: &str) -> SchemaError {
        SchemaError::structural(
            FieldPath::of(&self.id),
            format!(
                "{} value must be {expected}, found {}",
                self.kind(),
                raw.kind_name()
            ),
        )
    }

    fn invalid_choice(&self, value: &str) -> SchemaError {
        SchemaError::InvalidChoice {
            path: FieldPath::of(&self.id),
            value: value.to_string(),
        }
    }
}

fn required_str<'d>(map: &'d DocumentMap, key: &str, path: FieldPath) -> Result<&'d str> {
    map.get(key).and_then(Document::as_str).ok_or_else(|| {
        SchemaError::structural(path, format!("{key} is required or value is not string"))
    })
}

fn optional_str(map: &DocumentMap, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Document::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Decode the payload list shared by every list-shaped kind.
///
/// Strings and numbers pass through, maps are parsed as child templates.
/// Whether an element fits the kind is decided by the caller.
fn load_list(
    id: &str,
    kind: FieldKind,
    payload: Option<&Document>,
    options: &LoadOptions,
    depth: usize,
) -> Result<Vec<ListItem>> {
    let Some(items) = payload.and_then(Document::as_sequence) else {
        return Err(SchemaError::structural(
            FieldPath::of(id),
            format!("field kind {kind} is not list"),
        ));
    };

    items
        .iter()
        .map(|item| match item {
            Document::String(s) => Ok(ListItem::Text(s.clone())),
            Document::Number(_) => Ok(ListItem::Number),
            Document::Map(_) => Field::parse_template(item, options, depth + 1)
                .map(ListItem::Field)
                .map_err(|e| e.within(id)),
            other => Err(SchemaError::structural(
                FieldPath::of(id),
                format!("{kind} element has invalid type {}", other.kind_name()),
            )),
        })
        .collect()
}

fn into_options(id: &str, kind: FieldKind, items: Vec<ListItem>) -> Result<Vec<String>> {
    items
        .into_iter()
        .map(|item| match item {
            ListItem::Text(s) => Ok(s),
            ListItem::Number | ListItem::Field(_) => Err(SchemaError::structural(
                FieldPath::of(id),
                format!("{kind} element type is not string"),
            )),
        })
        .collect()
}

fn into_children(id: &str, kind: FieldKind, items: Vec<ListItem>) -> Result<Vec<Field>> {
    let children = items
        .into_iter()
        .map(|item| match item {
            ListItem::Field(field) => Ok(field),
            ListItem::Text(_) | ListItem::Number => Err(SchemaError::structural(
                FieldPath::of(id),
                format!("{kind} element type is not a field template"),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for child in &children {
        if !seen.insert(child.id.as_str()) {
            warn!(parent = %id, child = %child.id, "duplicate sibling field id, first match wins");
        }
    }

    Ok(children)
}

/// Resolved payload of a value field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Text(String),
    Number(f64),
    Password(String),
    Append(Vec<String>),
    Select(String),
    SelectArray(Vec<String>),
    Array(Vec<ValueField>),
    /// `None` when no child was present in the value map.
    NestSelect(Option<Box<ValueField>>),
    NestSelectArray(Vec<ValueField>),
    /// One entry per repetition, grouped by child in template order.
    IncrementArray(Vec<ValueField>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Password(_) => FieldKind::Password,
            FieldValue::Append(_) => FieldKind::Append,
            FieldValue::Select(_) => FieldKind::Select,
            FieldValue::SelectArray(_) => FieldKind::SelectArray,
            FieldValue::Array(_) => FieldKind::Array,
            FieldValue::NestSelect(_) => FieldKind::NestSelect,
            FieldValue::NestSelectArray(_) => FieldKind::NestSelectArray,
            FieldValue::IncrementArray(_) => FieldKind::IncrementArray,
        }
    }
}

/// A field resolved against its template, holding only the value payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueField {
    pub id: String,
    pub name: String,
    pub value: FieldValue,
}

impl ValueField {
    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }

    /// Resolved children of a recursive value; empty for other kinds.
    pub fn children(&self) -> &[ValueField] {
        match &self.value {
            FieldValue::Array(children)
            | FieldValue::NestSelectArray(children)
            | FieldValue::IncrementArray(children) => children,
            FieldValue::NestSelect(Some(child)) => std::slice::from_ref(child.as_ref()),
            _ => &[],
        }
    }

    /// First resolved child with the given ID.
    pub fn child(&self, id: &str) -> Option<&ValueField> {
        self.children().iter().find(|c| c.id == id)
    }

    /// Text of a string, text, password or select value.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            FieldValue::String(s)
            | FieldValue::Text(s)
            | FieldValue::Password(s)
            | FieldValue::Select(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Items of a selectarray or append value.
    pub fn as_list(&self) -> Option<&[String]> {
        match &self.value {
            FieldValue::SelectArray(items) | FieldValue::Append(items) => Some(items),
            _ => None,
        }
    }

    /// Render the value back to its document form.
    pub fn dump_value(&self) -> Result<Document> {
        let doc = match &self.value {
            FieldValue::String(s)
            | FieldValue::Text(s)
            | FieldValue::Password(s)
            | FieldValue::Select(s) => Document::String(s.clone()),
            FieldValue::Number(n) => Document::Number(*n),
            FieldValue::SelectArray(items) | FieldValue::Append(items) => items.clone().into(),
            FieldValue::Array(children) | FieldValue::NestSelectArray(children) => {
                let mut map = DocumentMap::new();
                for child in children {
                    map.insert(child.id.clone(), child.dump_child(&self.id)?);
                }
                Document::Map(map)
            }
            FieldValue::NestSelect(chosen) => {
                let mut map = DocumentMap::new();
                if let Some(child) = chosen {
                    map.insert(child.id.clone(), child.dump_child(&self.id)?);
                }
                Document::Map(map)
            }
            FieldValue::IncrementArray(children) => {
                let mut groups: BTreeMap<String, Vec<Document>> = BTreeMap::new();
                for child in children {
                    groups
                        .entry(child.id.clone())
                        .or_default()
                        .push(child.dump_child(&self.id)?);
                }
                Document::Map(
                    groups
                        .into_iter()
                        .map(|(id, items)| (id, Document::Sequence(items)))
                        .collect(),
                )
            }
        };
        Ok(doc)
    }

    fn dump_child(&self, parent: &str) -> Result<Document> {
        self.dump_value().map_err(|e| e.within(parent))
    }
}
