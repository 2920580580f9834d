//! Boundary contract with the tabular data source.
//!
//! The engine never touches cell values directly; it sees an ordered
//! collection of named [`Column`]s, each exposing a [`Dtype`] descriptor, a
//! presence check, and the handful of value accessors that attribute-deriving
//! strategies may need (distinct values, numeric extremes). Any table-like
//! collaborator can implement these traits; [`crate::frame::Frame`] is the
//! in-crate implementation.

use std::fmt;

use serde_json::Value as JsonValue;

/// Descriptor of a column's data-type as supplied by the data source.
///
/// A dtype may arrive as a plain name, as a structured record type carrying
/// per-field detail, or as an arbitrary token the source could not classify.
/// All registry traffic goes through [`Dtype::canonical`], so the same
/// logical type always resolves to the same key regardless of which
/// representation was supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dtype {
    /// A simple logical name, e.g. `int64` or `object`.
    Named(String),
    /// A parameterized record type; the field list is part of its identity.
    Structured {
        name: String,
        fields: Vec<(String, String)>,
    },
    /// Anything else; its display form is used verbatim.
    Opaque(String),
}

impl Dtype {
    pub fn named(name: impl Into<String>) -> Self {
        Dtype::Named(name.into())
    }

    /// Canonical string identity used as the registry lookup key.
    ///
    /// Structured dtypes render their full representation so that record
    /// types differing only in field layout stay distinct; simple dtypes
    /// canonicalize to their name; opaque tokens pass through unchanged.
    pub fn canonical(&self) -> String {
        match self {
            Dtype::Named(name) => name.clone(),
            Dtype::Structured { .. } => self.to_string(),
            Dtype::Opaque(repr) => repr.clone(),
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dtype::Named(name) => write!(f, "{name}"),
            Dtype::Structured { name, fields } => {
                write!(f, "{name}[")?;
                for (idx, (field, ty)) in fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "('{field}', '{ty}')")?;
                }
                write!(f, "]")
            }
            Dtype::Opaque(repr) => write!(f, "{repr}"),
        }
    }
}

impl From<&str> for Dtype {
    fn from(name: &str) -> Self {
        Dtype::Named(name.to_string())
    }
}

impl From<String> for Dtype {
    fn from(name: String) -> Self {
        Dtype::Named(name)
    }
}

/// A named sequence of values in the source dataset.
///
/// The default accessor implementations return "nothing known"; a data source
/// only implements the ones its registered strategies actually consume.
pub trait Column {
    fn name(&self) -> &str;

    fn dtype(&self) -> Dtype;

    /// True iff the column has no missing values.
    fn is_fully_present(&self) -> bool;

    /// Distinct non-missing values, in first-seen order.
    fn distinct_values(&self) -> Vec<JsonValue> {
        Vec::new()
    }

    fn numeric_min(&self) -> Option<f64> {
        None
    }

    fn numeric_max(&self) -> Option<f64> {
        None
    }
}

/// An ordered collection of named columns.
pub trait Dataset {
    fn columns(&self) -> Vec<&dyn Column>;
}
