use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::target::{CallFn, CallTarget, HandlerFn, TargetId, TaskHandler};

/// Miss behavior for call-target resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MockMode {
    /// Fall back to the real implementation when no mapping exists.
    #[default]
    Permissive,
    /// Fail the call effect when no mapping exists.
    Strict,
}

/// Result of a registry lookup. The caller chooses what an `Unmapped`
/// target means (fall back or fail), rather than the registry deciding.
pub enum Resolved<T> {
    Substituted(T),
    Unmapped,
}

/// One (original target -> substitute) pair.
#[derive(Clone)]
pub enum MockMapping {
    Call {
        original: TargetId,
        name: Arc<str>,
        substitute: CallFn,
    },
    Handler {
        original: TargetId,
        name: Arc<str>,
        substitute: HandlerFn,
    },
}

impl MockMapping {
    /// Substitute a call target with a raw callable.
    pub fn call(original: &CallTarget, substitute: CallFn) -> Self {
        MockMapping::Call {
            original: original.id(),
            name: original.name().into(),
            substitute,
        }
    }

    /// Substitute a call target with another target's implementation.
    pub fn call_target(original: &CallTarget, substitute: &CallTarget) -> Self {
        MockMapping::call(original, substitute.func())
    }

    /// Substitute an entire watched routine with another handler.
    pub fn handler(original: &TaskHandler, substitute: &TaskHandler) -> Self {
        MockMapping::Handler {
            original: original.id(),
            name: original.name().into(),
            substitute: substitute.func(),
        }
    }

    /// Substitute an entire watched routine with a raw handler function.
    pub fn handler_fn(original: &TaskHandler, substitute: HandlerFn) -> Self {
        MockMapping::Handler {
            original: original.id(),
            name: original.name().into(),
            substitute,
        }
    }
}

/// Identity-keyed substitution table for one harness instance.
#[derive(Clone, Default)]
pub struct MockRegistry {
    calls: HashMap<TargetId, CallFn>,
    handlers: HashMap<TargetId, HandlerFn>,
}

impl MockRegistry {
    /// Compile an ordered mapping list into lookup tables. A later mapping
    /// for the same identity overwrites the earlier one.
    pub fn compile(mappings: &[MockMapping]) -> Self {
        let mut registry = MockRegistry::default();
        for mapping in mappings {
            match mapping {
                MockMapping::Call {
                    original,
                    substitute,
                    ..
                } => {
                    registry.calls.insert(*original, Arc::clone(substitute));
                }
                MockMapping::Handler {
                    original,
                    substitute,
                    ..
                } => {
                    registry.handlers.insert(*original, Arc::clone(substitute));
                }
            }
        }
        registry
    }

    pub fn resolve_call(&self, target: &CallTarget) -> Resolved<CallFn> {
        match self.calls.get(&target.id()) {
            Some(substitute) => {
                debug!(target = %target.name(), "substituting call target");
                Resolved::Substituted(Arc::clone(substitute))
            }
            None => Resolved::Unmapped,
        }
    }

    /// Substitute or original routine. Resolution happens at the
    /// handler-invocation boundary, so substitutes inherit the watch's
    /// cancellation semantics.
    pub fn resolve_handler(&self, handler: &TaskHandler) -> HandlerFn {
        match self.handlers.get(&handler.id()) {
            Some(substitute) => {
                debug!(handler = %handler.name(), "substituting watched handler");
                Arc::clone(substitute)
            }
            None => handler.func(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.handlers.is_empty()
    }
}

impl CallTarget {
    pub(crate) fn func(&self) -> CallFn {
        // Identity is deliberately not carried over: the substitute runs in
        // place of the original and is itself never subject to resolution.
        let target = self.clone();
        Arc::new(move |args| target.invoke(args))
    }
}

/// Convert two name-keyed bags into an ordered mapping list, pairing each
/// name present in both. Names in `mocks` absent from `original` are
/// dropped without error, a convenience for declaring partial overrides
/// against a known set of real targets.
pub fn structured_mocks(
    original: &BTreeMap<String, CallTarget>,
    mocks: &BTreeMap<String, CallFn>,
) -> Vec<MockMapping> {
    mocks
        .iter()
        .filter_map(|(name, substitute)| {
            original
                .get(name)
                .map(|target| MockMapping::call(target, Arc::clone(substitute)))
        })
        .collect()
}
