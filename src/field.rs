//! Field data model: a closed, tagged union of field kinds.
//!
//! Every record carries the base attributes (`title`, `description`,
//! `required`) plus the kind-specific attributes of its variant. Invariants
//! are enforced eagerly: construction is all-or-nothing, and a violation
//! surfaces as [`SchemaError::FieldValidation`] naming the offending
//! attributes. Adding a kind means adding a variant here and registering a
//! strategy that produces it; the registry and service never special-case
//! kinds, and `match` exhaustiveness flags every site a new variant must
//! touch.
//!
//! Serialization is dual:
//! - structured mode uses the derived `Serialize` impls and omits attributes
//!   that were never set;
//! - the legacy text mode ([`Field::legacy_json`]) renders every declared
//!   attribute in declaration order with `null` placeholders, which the
//!   service then rewrites per the historical front-end contract.

use std::fmt;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    error::{Result, SchemaError},
    strategy::Attributes,
};

const TITLE_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 500;

/// Discriminant of the field union; its wire form is the `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Date,
    Category,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Category => "category",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base attributes present on every field kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldBase {
    pub title: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldBase {
    /// Builds the base record, validating length bounds on `title`
    /// (1-100 chars) and `description` (at most 500 chars).
    pub fn new(title: impl Into<String>, required: bool, description: Option<String>) -> Result<Self> {
        let title = title.into();
        let title_chars = title.chars().count();
        if title_chars == 0 || title_chars > TITLE_MAX_CHARS {
            return Err(SchemaError::FieldValidation {
                field: title.clone(),
                attributes: vec!["title".to_string()],
                reason: format!("title must be 1-{TITLE_MAX_CHARS} characters, got {title_chars}"),
            });
        }
        if let Some(desc) = &description {
            let desc_chars = desc.chars().count();
            if desc_chars > DESCRIPTION_MAX_CHARS {
                return Err(SchemaError::FieldValidation {
                    field: title.clone(),
                    attributes: vec!["description".to_string()],
                    reason: format!(
                        "description must be at most {DESCRIPTION_MAX_CHARS} characters, got {desc_chars}"
                    ),
                });
            }
        }
        Ok(Self {
            title,
            required,
            description,
        })
    }
}

/// A category option or selected value: the front-end accepts either plain
/// strings or integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Integer(i64),
    Text(String),
}

impl fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceValue::Integer(n) => write!(f, "{n}"),
            ChoiceValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Free-form text input. The optional `pattern` must compile as a Rust
/// [`regex`] expression, which has no look-around or backreferences; patterns
/// carried over from ECMAScript or PCRE producers may need rewriting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TextAttrs {
    value: Option<String>,
    placeholder: Option<String>,
    #[serde(rename = "minLength")]
    min_length: Option<u64>,
    #[serde(rename = "maxLength")]
    max_length: Option<u64>,
    pattern: Option<String>,
}

impl TextField {
    fn from_attrs(base: FieldBase, attrs: Attributes) -> Result<Self> {
        let attrs: TextAttrs = parse_attrs(&base.title, attrs)?;
        let field = Self {
            base,
            value: attrs.value,
            placeholder: attrs.placeholder,
            min_length: attrs.min_length,
            max_length: attrs.max_length,
            pattern: attrs.pattern,
        };
        field.validate()?;
        Ok(field)
    }

    fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length)
            && min > max
        {
            return Err(self.invalid(
                &["minLength", "maxLength"],
                format!("minLength ({min}) must be <= maxLength ({max})"),
            ));
        }
        if let Some(pattern) = &self.pattern
            && let Err(err) = Regex::new(pattern)
        {
            return Err(self.invalid(&["pattern"], format!("pattern does not compile: {err}")));
        }
        Ok(())
    }

    fn invalid(&self, attributes: &[&str], reason: String) -> SchemaError {
        validation_error(&self.base.title, attributes, reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NumberAttrs {
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
    placeholder: Option<String>,
    value: Option<f64>,
    unit: Option<String>,
}

impl NumberField {
    fn from_attrs(base: FieldBase, attrs: Attributes) -> Result<Self> {
        let attrs: NumberAttrs = parse_attrs(&base.title, attrs)?;
        let field = Self {
            base,
            min: attrs.min,
            max: attrs.max,
            step: attrs.step,
            placeholder: attrs.placeholder,
            value: attrs.value,
            unit: attrs.unit,
        };
        field.validate()?;
        Ok(field)
    }

    fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(self.invalid(
                &["min", "max"],
                format!("min ({min}) must be <= max ({max})"),
            ));
        }
        if let Some(value) = self.value {
            if let Some(min) = self.min
                && value < min
            {
                return Err(self.invalid(
                    &["value", "min"],
                    format!("value ({value}) must be >= min ({min})"),
                ));
            }
            if let Some(max) = self.max
                && value > max
            {
                return Err(self.invalid(
                    &["value", "max"],
                    format!("value ({value}) must be <= max ({max})"),
                ));
            }
        }
        Ok(())
    }

    fn invalid(&self, attributes: &[&str], reason: String) -> SchemaError {
        validation_error(&self.base.title, attributes, reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BooleanAttrs {
    value: Option<bool>,
}

impl BooleanField {
    fn from_attrs(base: FieldBase, attrs: Attributes) -> Result<Self> {
        let attrs: BooleanAttrs = parse_attrs(&base.title, attrs)?;
        Ok(Self {
            base,
            value: attrs.value,
        })
    }
}

const DEFAULT_DATE_STEP: u32 = 1;

fn default_date_step() -> u32 {
    DEFAULT_DATE_STEP
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<NaiveDate>,
    /// Increment in days for the front-end date control.
    pub step: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DateAttrs {
    value: Option<NaiveDate>,
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
    #[serde(default = "default_date_step")]
    step: u32,
}

impl DateField {
    fn from_attrs(base: FieldBase, attrs: Attributes) -> Result<Self> {
        let attrs: DateAttrs = parse_attrs(&base.title, attrs)?;
        let field = Self {
            base,
            value: attrs.value,
            min: attrs.min,
            max: attrs.max,
            step: attrs.step,
        };
        field.validate()?;
        Ok(field)
    }

    fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(self.invalid(&["step"], "step must be a positive integer".to_string()));
        }
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(self.invalid(
                &["min", "max"],
                format!("min ({min}) must be on or before max ({max})"),
            ));
        }
        if let Some(value) = self.value {
            if let Some(min) = self.min
                && value < min
            {
                return Err(self.invalid(
                    &["value", "min"],
                    format!("value ({value}) must be on or after min ({min})"),
                ));
            }
            if let Some(max) = self.max
                && value > max
            {
                return Err(self.invalid(
                    &["value", "max"],
                    format!("value ({value}) must be on or before max ({max})"),
                ));
            }
        }
        Ok(())
    }

    fn invalid(&self, attributes: &[&str], reason: String) -> SchemaError {
        validation_error(&self.base.title, attributes, reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ChoiceValue>,
    pub options: Vec<ChoiceValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryAttrs {
    value: Option<ChoiceValue>,
    #[serde(default)]
    options: Vec<ChoiceValue>,
}

impl CategoryField {
    fn from_attrs(base: FieldBase, attrs: Attributes) -> Result<Self> {
        let attrs: CategoryAttrs = parse_attrs(&base.title, attrs)?;
        let field = Self {
            base,
            value: attrs.value,
            options: attrs.options,
        };
        field.validate()?;
        Ok(field)
    }

    fn validate(&self) -> Result<()> {
        if self.options.is_empty() {
            return Err(self.invalid(
                &["options"],
                "options must contain at least one entry".to_string(),
            ));
        }
        if let Some(value) = &self.value
            && !self.options.contains(value)
        {
            return Err(self.invalid(
                &["value", "options"],
                format!("value ({value}) must be one of the declared options"),
            ));
        }
        Ok(())
    }

    fn invalid(&self, attributes: &[&str], reason: String) -> SchemaError {
        validation_error(&self.base.title, attributes, reason)
    }
}

/// One resolved column, tagged by its `type` attribute on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Field {
    Text(TextField),
    Number(NumberField),
    Boolean(BooleanField),
    Date(DateField),
    Category(CategoryField),
}

impl Field {
    /// Constructs and validates the variant matching `kind` from base
    /// attributes plus a strategy-derived attribute map. Unknown attribute
    /// keys (including the reserved base keys) are rejected outright.
    pub fn build(kind: FieldKind, base: FieldBase, attrs: Attributes) -> Result<Field> {
        match kind {
            FieldKind::Text => TextField::from_attrs(base, attrs).map(Field::Text),
            FieldKind::Number => NumberField::from_attrs(base, attrs).map(Field::Number),
            FieldKind::Boolean => BooleanField::from_attrs(base, attrs).map(Field::Boolean),
            FieldKind::Date => DateField::from_attrs(base, attrs).map(Field::Date),
            FieldKind::Category => CategoryField::from_attrs(base, attrs).map(Field::Category),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Text(_) => FieldKind::Text,
            Field::Number(_) => FieldKind::Number,
            Field::Boolean(_) => FieldKind::Boolean,
            Field::Date(_) => FieldKind::Date,
            Field::Category(_) => FieldKind::Category,
        }
    }

    pub fn base(&self) -> &FieldBase {
        match self {
            Field::Text(f) => &f.base,
            Field::Number(f) => &f.base,
            Field::Boolean(f) => &f.base,
            Field::Date(f) => &f.base,
            Field::Category(f) => &f.base,
        }
    }

    /// Compact JSON for the legacy text contract: every declared attribute is
    /// present in declaration order, with `null` for unset ones. The caller
    /// rewrites `null` tokens afterwards.
    pub(crate) fn legacy_json(&self) -> String {
        let mut record = LegacyRecord::new();
        let base = self.base();
        record.push("title", &base.title);
        record.push("required", &base.required);
        record.push("description", &base.description);
        record.push("type", &self.kind().as_str());
        match self {
            Field::Text(f) => {
                record.push("value", &f.value);
                record.push("placeholder", &f.placeholder);
                record.push("minLength", &f.min_length);
                record.push("maxLength", &f.max_length);
                record.push("pattern", &f.pattern);
            }
            Field::Number(f) => {
                record.push("min", &f.min);
                record.push("max", &f.max);
                record.push("step", &f.step);
                record.push("placeholder", &f.placeholder);
                record.push("value", &f.value);
                record.push("unit", &f.unit);
            }
            Field::Boolean(f) => {
                record.push("value", &f.value);
            }
            Field::Date(f) => {
                record.push("value", &f.value);
                record.push("min", &f.min);
                record.push("max", &f.max);
                record.push("step", &f.step);
            }
            Field::Category(f) => {
                record.push("value", &f.value);
                record.push("options", &f.options);
            }
        }
        record.finish()
    }
}

/// Writes `"key":value` pairs in insertion order; unset options encode as
/// `null` so the envelope-level rewrite can turn them into `undefined`.
struct LegacyRecord {
    body: String,
}

impl LegacyRecord {
    fn new() -> Self {
        Self {
            body: String::from("{"),
        }
    }

    fn push<T: Serialize>(&mut self, key: &str, value: &T) {
        if self.body.len() > 1 {
            self.body.push(',');
        }
        let encoded = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
        self.body.push('"');
        self.body.push_str(key);
        self.body.push_str("\":");
        self.body.push_str(&encoded);
    }

    fn finish(mut self) -> String {
        self.body.push('}');
        self.body
    }
}

fn parse_attrs<T: for<'de> Deserialize<'de>>(title: &str, attrs: Attributes) -> Result<T> {
    serde_json::from_value(JsonValue::Object(attrs)).map_err(|err| SchemaError::FieldValidation {
        field: title.to_string(),
        attributes: Vec::new(),
        reason: err.to_string(),
    })
}

fn validation_error(field: &str, attributes: &[&str], reason: String) -> SchemaError {
    SchemaError::FieldValidation {
        field: field.to_string(),
        attributes: attributes.iter().map(|a| a.to_string()).collect(),
        reason,
    }
}
