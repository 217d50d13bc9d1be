//! Declarative collection schemas and the field validation the store runs
//! on every write.
//!
//! A [`CollectionSchema`] lists the fields a collection accepts. Writes are
//! sanitized against it: unknown keys are dropped, defaults are applied on
//! create, and each present value is checked against its [`FieldKind`].
//! Uniqueness and relationship existence need the store itself and are
//! checked by the store implementation.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use crate::errors::FieldError;
use crate::models::Document;

const REQUIRED: &str = "This field is required.";

/// The type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Textarea,
    Email,
    Number,
    /// ISO-8601 timestamp or `YYYY-MM-DD` date, stored normalized to UTC.
    Date,
    /// One of a fixed set of string options.
    Select(Vec<String>),
    /// Array of objects, each validated against the nested fields.
    Array(Vec<FieldSpec>),
    /// Id of a record in another collection.
    Relationship { relation_to: String },
}

/// A single field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    pub default: Option<Value>,
}

impl FieldSpec {
    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            unique: false,
            default: None,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn textarea(name: &str) -> Self {
        Self::new(name, FieldKind::Textarea)
    }

    pub fn email(name: &str) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn select(name: &str, options: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Select(options.iter().map(|o| o.to_string()).collect()),
        )
    }

    pub fn array(name: &str, fields: Vec<FieldSpec>) -> Self {
        Self::new(name, FieldKind::Array(fields))
    }

    pub fn relationship(name: &str, relation_to: &str) -> Self {
        Self::new(
            name,
            FieldKind::Relationship {
                relation_to: relation_to.to_string(),
            },
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Field declarations for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    pub slug: String,
    pub fields: Vec<FieldSpec>,
}

impl CollectionSchema {
    pub fn new(slug: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            slug: slug.to_string(),
            fields,
        }
    }

    /// Top-level fields that must hold unique values.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.unique)
    }

    /// Top-level relationship fields with their target collection.
    pub fn relationships(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|f| match &f.kind {
            FieldKind::Relationship { relation_to } => Some((f.name.as_str(), relation_to.as_str())),
            _ => None,
        })
    }

    /// Validates `input` for a create, applying defaults.
    pub fn sanitize_create(&self, input: &Document) -> Result<Document, Vec<FieldError>> {
        let mut merged = Map::new();
        for field in &self.fields {
            match input.get(&field.name) {
                Some(value) if !value.is_null() => {
                    merged.insert(field.name.clone(), value.clone());
                }
                _ => {
                    if let Some(default) = &field.default {
                        merged.insert(field.name.clone(), default.clone());
                    }
                }
            }
        }
        sanitize_fields(&self.fields, &merged, "")
    }

    /// Validates `patch` applied over `existing` for an update.
    ///
    /// Keys in `patch` that the schema does not declare are ignored; a
    /// `null` in the patch clears an optional field.
    pub fn sanitize_update(
        &self,
        existing: &Document,
        patch: &Document,
    ) -> Result<Document, Vec<FieldError>> {
        let mut merged = Map::new();
        for field in &self.fields {
            let value = match patch.get(&field.name) {
                Some(value) => Some(value),
                None => existing.get(&field.name),
            };
            if let Some(value) = value.filter(|v| !v.is_null()) {
                merged.insert(field.name.clone(), value.clone());
            }
        }
        sanitize_fields(&self.fields, &merged, "")
    }
}

fn sanitize_fields(
    fields: &[FieldSpec],
    input: &Map<String, Value>,
    prefix: &str,
) -> Result<Document, Vec<FieldError>> {
    let mut out = Map::new();
    let mut errors = Vec::new();

    for field in fields {
        let path = format!("{prefix}{}", field.name);
        match input.get(&field.name).filter(|v| !v.is_null()) {
            None => {
                if field.required {
                    errors.push(FieldError::new(path, REQUIRED));
                }
            }
            Some(value) => match check_value(field, value, &path) {
                Ok(Some(clean)) => {
                    out.insert(field.name.clone(), clean);
                }
                Ok(None) => {
                    if field.required {
                        errors.push(FieldError::new(path, REQUIRED));
                    }
                }
                Err(mut errs) => errors.append(&mut errs),
            },
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

/// Returns the normalized value, `None` for an empty value, or errors.
fn check_value(field: &FieldSpec, value: &Value, path: &str) -> Result<Option<Value>, Vec<FieldError>> {
    let invalid = |message: &str| vec![FieldError::new(path, message)];

    match &field.kind {
        FieldKind::Text | FieldKind::Textarea => match value {
            Value::String(s) if s.trim().is_empty() && field.required => Ok(None),
            Value::String(s) => Ok(Some(Value::String(s.clone()))),
            _ => Err(invalid("This field must be text.")),
        },
        FieldKind::Email => match value {
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) if is_valid_email(s.trim()) => {
                Ok(Some(Value::String(s.trim().to_lowercase())))
            }
            _ => Err(invalid("Please enter a valid email address.")),
        },
        FieldKind::Number => match value {
            Value::Number(n) => Ok(Some(Value::Number(n.clone()))),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(|n| Some(Value::Number(n)))
                .ok_or_else(|| invalid("This field must be a number.")),
            _ => Err(invalid("This field must be a number.")),
        },
        FieldKind::Date => match value.as_str().and_then(parse_date) {
            Some(date) => Ok(Some(Value::String(
                date.to_rfc3339_opts(SecondsFormat::Millis, true),
            ))),
            None => Err(invalid("This field must be a valid date.")),
        },
        FieldKind::Select(options) => match value {
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) if options.iter().any(|o| o == s) => Ok(Some(value.clone())),
            _ => Err(invalid("This field has an invalid selection.")),
        },
        FieldKind::Relationship { .. } => match value {
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(_) => Ok(Some(value.clone())),
            _ => Err(invalid("This relationship field has an invalid value.")),
        },
        FieldKind::Array(sub_fields) => {
            let Value::Array(items) = value else {
                return Err(invalid("This field must be an array."));
            };
            let mut clean = Vec::with_capacity(items.len());
            let mut errors = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}.{i}.");
                match item {
                    Value::Object(obj) => match sanitize_fields(sub_fields, obj, &item_path) {
                        Ok(row) => clean.push(Value::Object(row)),
                        Err(mut errs) => errors.append(&mut errs),
                    },
                    _ => errors.push(FieldError::new(
                        format!("{path}.{i}"),
                        "Each row must be an object.",
                    )),
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            if clean.is_empty() && field.required {
                return Ok(None);
            }
            Ok(Some(Value::Array(clean)))
        }
    }
}

fn is_valid_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !s.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn wallets() -> CollectionSchema {
        CollectionSchema::new(
            "wallets",
            vec![
                FieldSpec::text("label").required(),
                FieldSpec::select("kind", &["hot", "cold"]).required(),
                FieldSpec::textarea("notes").default_value(""),
                FieldSpec::number("balance"),
                FieldSpec::array(
                    "history",
                    vec![
                        FieldSpec::number("value").required(),
                        FieldSpec::date("timestamp").required(),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_create_applies_defaults_and_drops_unknown() {
        let out = wallets()
            .sanitize_create(&doc(json!({"label": "main", "kind": "cold", "extra": 1})))
            .unwrap();
        assert_eq!(out.get("notes"), Some(&json!("")));
        assert!(out.get("extra").is_none());
    }

    #[test]
    fn test_create_reports_every_missing_field() {
        let errs = wallets().sanitize_create(&doc(json!({"label": "  "}))).unwrap_err();
        let fields: Vec<_> = errs.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["label", "kind"]);
    }

    #[test]
    fn test_select_rejects_unknown_option() {
        let errs = wallets()
            .sanitize_create(&doc(json!({"label": "a", "kind": "lukewarm"})))
            .unwrap_err();
        assert_eq!(errs[0].message, "This field has an invalid selection.");
    }

    #[test]
    fn test_number_coerces_numeric_strings() {
        let out = wallets()
            .sanitize_create(&doc(json!({"label": "a", "kind": "hot", "balance": "1.5"})))
            .unwrap();
        assert_eq!(out.get("balance"), Some(&json!(1.5)));
    }

    #[test]
    fn test_array_rows_are_validated_with_paths() {
        let errs = wallets()
            .sanitize_create(&doc(json!({
                "label": "a",
                "kind": "hot",
                "history": [{"value": 1, "timestamp": "2024-01-01"}, {"value": 2}]
            })))
            .unwrap_err();
        assert_eq!(errs, vec![FieldError::new("history.1.timestamp", REQUIRED)]);
    }

    #[test]
    fn test_dates_are_normalized() {
        let out = wallets()
            .sanitize_create(&doc(json!({
                "label": "a",
                "kind": "hot",
                "history": [{"value": 1, "timestamp": "2024-01-01"}]
            })))
            .unwrap();
        assert_eq!(
            out["history"][0]["timestamp"],
            json!("2024-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_update_merges_over_existing() {
        let schema = wallets();
        let existing = schema
            .sanitize_create(&doc(json!({"label": "a", "kind": "hot", "notes": "n"})))
            .unwrap();
        let out = schema
            .sanitize_update(&existing, &doc(json!({"kind": "cold", "notes": null})))
            .unwrap();
        assert_eq!(out.get("label"), Some(&json!("a")));
        assert_eq!(out.get("kind"), Some(&json!("cold")));
        assert!(out.get("notes").is_none());
    }

    #[test]
    fn test_email_is_normalized() {
        let schema = CollectionSchema::new("users", vec![FieldSpec::email("email").required()]);
        let out = schema
            .sanitize_create(&doc(json!({"email": " Alice@Example.com "})))
            .unwrap();
        assert_eq!(out.get("email"), Some(&json!("alice@example.com")));
        assert!(schema.sanitize_create(&doc(json!({"email": "nope"}))).is_err());
    }
}
