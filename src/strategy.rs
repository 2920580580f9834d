//! Strategy: the extension contract binding a field kind to data-types.
//!
//! A [`Strategy`] is an immutable value object: a unique `type_name`, the
//! [`FieldKind`] it produces, the canonical dtypes it claims, and an optional
//! attribute-derivation hook. The hook is the open extension point: it reads
//! a column and returns extra attributes for the field record. It must never
//! emit the reserved base keys (`title`, `required`, `description`, `type`);
//! the field model rejects them outright.

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::{
    column::{Column, Dtype},
    error::{Result, SchemaError},
    field::FieldKind,
};

/// Extra key/value pairs a strategy derives for one column.
pub type Attributes = Map<String, JsonValue>;

/// Optional per-column attribute derivation.
///
/// Implementations may read the column through its accessor surface but never
/// mutate anything. Errors propagate unmodified to the `build` caller; the
/// service performs no recovery. Closures of the matching shape implement
/// this trait directly.
pub trait DeriveAttributes: Send + Sync {
    fn derive(&self, column: &dyn Column) -> anyhow::Result<Attributes>;
}

impl<F> DeriveAttributes for F
where
    F: Fn(&dyn Column) -> anyhow::Result<Attributes> + Send + Sync,
{
    fn derive(&self, column: &dyn Column) -> anyhow::Result<Attributes> {
        self(column)
    }
}

/// Hook returning no extra attributes; the base attributes alone suffice.
struct NoAttributes;

impl DeriveAttributes for NoAttributes {
    fn derive(&self, _column: &dyn Column) -> anyhow::Result<Attributes> {
        Ok(Attributes::new())
    }
}

/// A named policy binding one field kind to the data-types it recognizes.
#[derive(Clone)]
pub struct Strategy {
    type_name: String,
    kind: FieldKind,
    dtypes: Vec<String>,
    derive: Arc<dyn DeriveAttributes>,
}

impl Strategy {
    /// Builds a strategy with the default no-op derivation hook.
    ///
    /// Dtypes are canonicalized once here; duplicates within one strategy are
    /// harmless, duplicates across strategies are a registry-level conflict.
    pub fn new(
        type_name: impl Into<String>,
        kind: FieldKind,
        dtypes: impl IntoIterator<Item = impl Into<Dtype>>,
    ) -> Result<Self> {
        Self::with_derive(type_name, kind, dtypes, NoAttributes)
    }

    /// Builds a strategy with a custom attribute-derivation hook.
    pub fn with_derive(
        type_name: impl Into<String>,
        kind: FieldKind,
        dtypes: impl IntoIterator<Item = impl Into<Dtype>>,
        derive: impl DeriveAttributes + 'static,
    ) -> Result<Self> {
        let type_name = type_name.into();
        if type_name.trim().is_empty() {
            return Err(SchemaError::InvalidStrategy(
                "type_name must be a non-empty string".to_string(),
            ));
        }
        let dtypes: Vec<String> = dtypes
            .into_iter()
            .map(|dt| dt.into().canonical())
            .collect();
        if dtypes.is_empty() {
            return Err(SchemaError::InvalidStrategy(format!(
                "strategy '{type_name}' must claim at least one dtype"
            )));
        }
        Ok(Self {
            type_name,
            kind,
            dtypes,
            derive: Arc::new(derive),
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Canonical dtype identifiers this strategy claims.
    pub fn dtypes(&self) -> &[String] {
        &self.dtypes
    }

    pub fn derive_attributes(&self, column: &dyn Column) -> anyhow::Result<Attributes> {
        self.derive.derive(column)
    }
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("dtypes", &self.dtypes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_type_name() {
        let err = Strategy::new("", FieldKind::Text, ["object"]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidStrategy(_)));

        let err = Strategy::new("   ", FieldKind::Text, ["object"]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidStrategy(_)));
    }

    #[test]
    fn rejects_empty_dtype_set() {
        let err = Strategy::new("text", FieldKind::Text, Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidStrategy(_)));
    }

    #[test]
    fn canonicalizes_claimed_dtypes() {
        let structured = Dtype::Structured {
            name: "record".to_string(),
            fields: vec![("x".to_string(), "f4".to_string())],
        };
        let strategy =
            Strategy::new("custom", FieldKind::Text, [structured.clone()]).expect("strategy");
        assert_eq!(strategy.dtypes(), &[structured.canonical()]);
    }

    #[test]
    fn default_hook_returns_no_attributes() {
        use crate::frame::Frame;

        let strategy = Strategy::new("boolean", FieldKind::Boolean, ["bool"]).expect("strategy");
        let frame = Frame::builder()
            .boolean_column("flag", [Some(true), Some(false)])
            .build()
            .expect("frame");
        let columns = crate::column::Dataset::columns(&frame);
        let attrs = strategy.derive_attributes(columns[0]).expect("derive");
        assert!(attrs.is_empty());
    }
}
