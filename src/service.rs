//! Per-column strategy resolution and envelope assembly.
//!
//! The service owns a [`Registry`] and exposes thin registration
//! delegations plus the two build paths: [`FieldService::build`] returns the
//! structured [`Form`] envelope, [`FieldService::build_text`] the legacy
//! wire string the historical front-end consumes. Resolution per column:
//! lookup by canonical dtype, then by the reserved fallback name `"text"`,
//! then a fatal [`SchemaError::NoStrategy`]. No partial envelope is ever
//! produced.

use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;

use crate::{
    column::{Column, Dataset},
    error::{Result, SchemaError},
    field::{Field, FieldBase},
    registry::Registry,
    strategy::Strategy,
};

/// Reserved `type_name` of the fallback strategy.
pub const FALLBACK_TYPE_NAME: &str = "text";

/// Top-level envelope: one field record per column, in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form {
    pub input: Vec<Field>,
}

#[derive(Debug, Default)]
pub struct FieldService {
    registry: Registry,
}

impl FieldService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a strategy, failing on name or dtype conflicts.
    pub fn register(&mut self, strategy: Strategy) -> Result<()> {
        self.registry.register(strategy, false)
    }

    /// Registers strategies in order, stopping at the first conflict.
    pub fn register_all(&mut self, strategies: impl IntoIterator<Item = Strategy>) -> Result<()> {
        for strategy in strategies {
            self.register(strategy)?;
        }
        Ok(())
    }

    /// Removes the strategy registered under `type_name`, if any.
    pub fn unregister(&mut self, type_name: &str) {
        self.registry.unregister(type_name);
    }

    /// Replaces the strategy with the same `type_name`, registering it as
    /// new when absent.
    pub fn update(&mut self, strategy: Strategy) -> Result<()> {
        self.registry.update(strategy)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Builds the structured envelope: one validated field record per column,
    /// preserving column order. Fails on the first unresolvable column,
    /// derivation error, or invariant violation.
    pub fn build(&self, dataset: &impl Dataset) -> Result<Form> {
        let columns = dataset.columns();
        if columns.is_empty() {
            return Err(SchemaError::EmptyInput);
        }
        let mut input = Vec::with_capacity(columns.len());
        for column in columns {
            input.push(self.field_for(column)?);
        }
        info!("Built form schema for {} column(s)", input.len());
        Ok(Form { input })
    }

    /// Builds the legacy text payload.
    ///
    /// The historical contract is JSON-like but not JSON: every declared
    /// attribute is present, and the token `null` is rewritten to the bare
    /// `undefined` globally, matching the historical producer. The
    /// trailing semicolon is conventionally appended by callers, not here.
    pub fn build_text(&self, dataset: &impl Dataset) -> Result<String> {
        let form = self.build(dataset)?;
        let records = form.input.iter().map(Field::legacy_json).join(", ");
        Ok(format!(r#"{{"input": [{records}]}}"#).replace("null", "undefined"))
    }

    fn resolve(&self, column: &dyn Column) -> Result<&Strategy> {
        let dtype = column.dtype();
        if let Some(strategy) = self.registry.strategy_for_dtype(&dtype) {
            debug!(
                "Column '{}' ({dtype}) resolved to strategy '{}'",
                column.name(),
                strategy.type_name()
            );
            return Ok(strategy.as_ref());
        }
        if let Some(fallback) = self.registry.strategy_for_name(FALLBACK_TYPE_NAME) {
            debug!(
                "Column '{}' ({dtype}) fell back to strategy '{}'",
                column.name(),
                fallback.type_name()
            );
            return Ok(fallback.as_ref());
        }
        Err(SchemaError::NoStrategy {
            column: column.name().to_string(),
            dtype: dtype.canonical(),
        })
    }

    fn field_for(&self, column: &dyn Column) -> Result<Field> {
        let strategy = self.resolve(column)?;
        let base = FieldBase::new(column.name(), column.is_fully_present(), None)?;
        let attrs = strategy.derive_attributes(column)?;
        Field::build(strategy.kind(), base, attrs)
    }
}
