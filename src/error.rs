use thiserror::Error;

/// Failure taxonomy for registry mutation and schema construction.
///
/// Every error surfaces synchronously to the `register`/`build` caller;
/// nothing is retried or recovered internally, and `build` never returns a
/// partial envelope.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A strategy with this `type_name` is already registered and
    /// `overwrite` was not requested.
    #[error("strategy '{name}' already exists")]
    StrategyExists { name: String },

    /// One of the strategy's canonical dtypes is already claimed by a
    /// different strategy and `overwrite` was not requested.
    #[error("dtype '{dtype}' already linked to strategy '{owner}'")]
    DtypeBound { dtype: String, owner: String },

    /// The dataset submitted to `build` has zero columns.
    #[error("dataset contains no columns")]
    EmptyInput,

    /// A column's dtype matched no strategy and no fallback strategy is
    /// registered under the reserved name `"text"`.
    #[error("no strategy for column '{column}' (dtype '{dtype}') and no fallback 'text' strategy registered")]
    NoStrategy { column: String, dtype: String },

    /// A constructed field record violated its kind's invariants.
    #[error("invalid {attributes:?} on field '{field}': {reason}")]
    FieldValidation {
        field: String,
        attributes: Vec<String>,
        reason: String,
    },

    /// A strategy was constructed with an empty `type_name` or an empty
    /// dtype set.
    #[error("invalid strategy: {0}")]
    InvalidStrategy(String),

    /// An error raised inside a strategy's attribute-derivation hook,
    /// propagated unmodified.
    #[error(transparent)]
    Derive(#[from] anyhow::Error),
}

impl SchemaError {
    /// True for either registration-conflict shape.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SchemaError::StrategyExists { .. } | SchemaError::DtypeBound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
