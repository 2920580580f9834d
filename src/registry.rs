//! Dual-indexed strategy catalogue.
//!
//! One logical entity with two access paths: by `type_name` and by canonical
//! dtype. Both indices mutate atomically inside each operation, so the
//! coherence invariants hold at every return:
//!
//! - every dtype key points at a strategy whose claimed set contains it;
//! - at most one entry per `type_name`.
//!
//! Not safe for concurrent mutation; the intended lifecycle is configure
//! once, read many.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::{
    column::Dtype,
    error::{Result, SchemaError},
    strategy::Strategy,
};

#[derive(Debug, Default)]
pub struct Registry {
    by_name: HashMap<String, Arc<Strategy>>,
    by_dtype: HashMap<String, Arc<Strategy>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a strategy under its `type_name` and every claimed dtype.
    ///
    /// Without `overwrite`, an existing name or an already-claimed dtype is a
    /// conflict and nothing is written. With `overwrite`, name and dtype keys
    /// are unconditionally replaced; dtype keys previously owned by a
    /// different strategy under a different name are silently reassigned,
    /// which can leave that strategy reachable by name but by no dtype. That
    /// trade-off is accepted: same-name replacement goes through [`update`].
    ///
    /// [`update`]: Registry::update
    pub fn register(&mut self, strategy: Strategy, overwrite: bool) -> Result<()> {
        if !overwrite {
            if self.by_name.contains_key(strategy.type_name()) {
                return Err(SchemaError::StrategyExists {
                    name: strategy.type_name().to_string(),
                });
            }
            for dtype in strategy.dtypes() {
                if let Some(owner) = self.by_dtype.get(dtype) {
                    return Err(SchemaError::DtypeBound {
                        dtype: dtype.clone(),
                        owner: owner.type_name().to_string(),
                    });
                }
            }
        }

        let strategy = Arc::new(strategy);
        debug!(
            "Registering strategy '{}' for dtypes {:?}",
            strategy.type_name(),
            strategy.dtypes()
        );
        self.by_name
            .insert(strategy.type_name().to_string(), Arc::clone(&strategy));
        for dtype in strategy.dtypes() {
            self.by_dtype.insert(dtype.clone(), Arc::clone(&strategy));
        }
        Ok(())
    }

    /// Replaces the strategy with the same `type_name`; registers it as new
    /// when absent.
    pub fn update(&mut self, strategy: Strategy) -> Result<()> {
        self.register(strategy, true)
    }

    /// Removes the name entry and purges every dtype key in the strategy's
    /// declared set. No-op for unknown names.
    pub fn unregister(&mut self, type_name: &str) {
        if let Some(strategy) = self.by_name.remove(type_name) {
            debug!("Unregistering strategy '{type_name}'");
            for dtype in strategy.dtypes() {
                self.by_dtype.remove(dtype);
            }
        }
    }

    pub fn strategy_for_name(&self, type_name: &str) -> Option<&Arc<Strategy>> {
        self.by_name.get(type_name)
    }

    pub fn strategy_for_dtype(&self, dtype: &Dtype) -> Option<&Arc<Strategy>> {
        self.by_dtype.get(&dtype.canonical())
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    fn strategy(name: &str, dtypes: &[&str]) -> Strategy {
        Strategy::new(name, FieldKind::Text, dtypes.iter().copied()).expect("strategy")
    }

    #[test]
    fn register_then_lookup_by_both_paths() {
        let mut registry = Registry::new();
        registry
            .register(strategy("text", &["object", "string"]), false)
            .expect("register");

        assert_eq!(
            registry.strategy_for_name("text").map(|s| s.type_name()),
            Some("text")
        );
        assert_eq!(
            registry
                .strategy_for_dtype(&Dtype::named("string"))
                .map(|s| s.type_name()),
            Some("text")
        );
        assert!(registry.strategy_for_dtype(&Dtype::named("int64")).is_none());
    }

    #[test]
    fn duplicate_name_conflicts_without_overwrite() {
        let mut registry = Registry::new();
        registry
            .register(strategy("text", &["object"]), false)
            .expect("first register");
        let err = registry
            .register(strategy("text", &["string"]), false)
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(err, SchemaError::StrategyExists { .. }));
    }

    #[test]
    fn overlapping_dtype_conflicts_without_overwrite() {
        let mut registry = Registry::new();
        registry
            .register(strategy("text", &["object"]), false)
            .expect("first register");
        let err = registry
            .register(strategy("raw", &["object"]), false)
            .unwrap_err();
        assert!(matches!(err, SchemaError::DtypeBound { .. }));
        // Conflict detection precedes any write: the loser is absent from
        // both indices.
        assert!(registry.strategy_for_name("raw").is_none());
        assert_eq!(
            registry
                .strategy_for_dtype(&Dtype::named("object"))
                .map(|s| s.type_name()),
            Some("text")
        );
    }

    #[test]
    fn overwrite_reassigns_shared_dtype() {
        let mut registry = Registry::new();
        registry
            .register(strategy("text", &["object"]), false)
            .expect("first register");
        registry
            .register(strategy("raw", &["object"]), true)
            .expect("overwrite register");

        assert_eq!(
            registry
                .strategy_for_dtype(&Dtype::named("object"))
                .map(|s| s.type_name()),
            Some("raw")
        );
        // The displaced strategy stays reachable by name; that is the
        // documented trade-off of cross-name overwrite.
        assert!(registry.strategy_for_name("text").is_some());
    }

    #[test]
    fn update_always_succeeds() {
        let mut registry = Registry::new();
        registry.update(strategy("text", &["object"])).expect("fresh update");
        registry
            .update(strategy("text", &["object", "string"]))
            .expect("replacing update");
        assert_eq!(registry.len(), 1);
        assert!(
            registry
                .strategy_for_dtype(&Dtype::named("string"))
                .is_some()
        );
    }

    #[test]
    fn unregister_purges_both_indices() {
        let mut registry = Registry::new();
        registry
            .register(strategy("text", &["object", "string"]), false)
            .expect("register");
        registry.unregister("text");

        assert!(registry.strategy_for_name("text").is_none());
        assert!(registry.strategy_for_dtype(&Dtype::named("object")).is_none());
        assert!(registry.strategy_for_dtype(&Dtype::named("string")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_unknown_name_is_noop() {
        let mut registry = Registry::new();
        registry
            .register(strategy("text", &["object"]), false)
            .expect("register");
        registry.unregister("number");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_canonicalizes_structured_dtypes() {
        let structured = Dtype::Structured {
            name: "record".to_string(),
            fields: vec![("x".to_string(), "f4".to_string())],
        };
        let mut registry = Registry::new();
        registry
            .register(
                Strategy::new("composite", FieldKind::Text, [structured.clone()])
                    .expect("strategy"),
                false,
            )
            .expect("register");

        // The same logical dtype resolves regardless of representation.
        assert!(registry.strategy_for_dtype(&structured).is_some());
        assert!(
            registry
                .strategy_for_dtype(&Dtype::Opaque(structured.canonical()))
                .is_some()
        );
    }
}
