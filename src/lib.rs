//! Typed form-field schema inference for tabular datasets.
//!
//! Each column of a dataset is resolved to a pluggable [`Strategy`] by its
//! canonical data-type, turned into a validated field record, and collected
//! into the `{"input": [...]}` envelope a form-rendering front-end consumes.
//!
//! ```
//! use tabform::{builtin, frame::Frame, FieldService};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut service = FieldService::new();
//! service.register_all(builtin::default_strategies()?)?;
//!
//! let frame = Frame::builder()
//!     .integer_column("age", [Some(25), Some(30), Some(35)])
//!     .text_column("name", [Some("Ana"), Some("Luis"), None])
//!     .build()?;
//!
//! let form = service.build(&frame)?;
//! assert_eq!(form.input.len(), 2);
//! assert_eq!(form.input[0].base().title, "age");
//! # Ok(())
//! # }
//! ```
//!
//! Two serialization modes exist and never mix: the structured envelope
//! ([`FieldService::build`], standard JSON, unset attributes omitted) and
//! the legacy text payload ([`FieldService::build_text`], every attribute
//! present with `undefined` placeholders) kept for front-end compatibility.

pub mod builtin;
pub mod column;
pub mod error;
pub mod field;
pub mod frame;
pub mod registry;
pub mod service;
pub mod strategy;

pub use column::{Column, Dataset, Dtype};
pub use error::SchemaError;
pub use field::{Field, FieldBase, FieldKind};
pub use registry::Registry;
pub use service::{FALLBACK_TYPE_NAME, FieldService, Form};
pub use strategy::{Attributes, DeriveAttributes, Strategy};
