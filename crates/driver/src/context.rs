use std::sync::Arc;

use futures::future::{self, BoxFuture};
use tracing::warn;

use rewire_store::{Action, ActionPattern, Store, Value};

use crate::effect::{Effect, EffectOutcome, TaskRef};
use crate::error::EffectError;
use crate::mock::{MockMode, MockRegistry, Resolved};
use crate::target::{CallTarget, HandlerFn, TaskHandler};

/// Working context of one harness instance: the bound store, the compiled
/// mock registry and the miss mode. Built by the binder and cloned into
/// every watcher and handler; there is no process-global context, so
/// multiple harnesses never collide.
///
/// Every call effect and every watched-handler invocation resolves through
/// the registry here; this is the single interception surface.
#[derive(Clone)]
pub struct SagaContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    store: Option<Store>,
    mocks: MockRegistry,
    mode: MockMode,
}

impl SagaContext {
    pub(crate) fn bound(store: Store, mocks: MockRegistry, mode: MockMode) -> Self {
        SagaContext {
            inner: Arc::new(ContextInner {
                store: Some(store),
                mocks,
                mode,
            }),
        }
    }

    /// Context with no store, for exercising handlers outside a harness.
    /// Any store access through it is a configuration error naming the
    /// attempted operation.
    pub fn unbound() -> Self {
        SagaContext {
            inner: Arc::new(ContextInner {
                store: None,
                mocks: MockRegistry::default(),
                mode: MockMode::default(),
            }),
        }
    }

    pub fn store(&self) -> Option<&Store> {
        self.inner.store.as_ref()
    }

    pub fn mock_mode(&self) -> MockMode {
        self.inner.mode
    }

    fn store_for(&self, op: &'static str) -> Result<&Store, EffectError> {
        self.inner
            .store
            .as_ref()
            .ok_or(EffectError::NoStore { op })
    }

    /// Call effect. Resolves `target` through the registry: a substitute
    /// entirely replaces the original; an unmapped target runs for real in
    /// permissive mode and fails in strict mode.
    pub async fn call(
        &self,
        target: &CallTarget,
        args: Vec<Value>,
    ) -> Result<Value, EffectError> {
        match self.inner.mocks.resolve_call(target) {
            Resolved::Substituted(substitute) => substitute(args).await,
            Resolved::Unmapped => match self.inner.mode {
                MockMode::Permissive => target.invoke(args).await,
                MockMode::Strict => Err(EffectError::UnmockedCall(target.name().to_string())),
            },
        }
    }

    /// Dispatch `action` into the bound store, synchronously.
    pub fn put(&self, action: Action) -> Result<(), EffectError> {
        self.store_for("dispatch an action")?.dispatch(action);
        Ok(())
    }

    /// Snapshot of the current store state.
    pub fn select(&self) -> Result<Value, EffectError> {
        Ok(self.store_for("read state")?.state())
    }

    /// Suspend until an action matching `pattern` is dispatched. Only
    /// actions dispatched after the take begins are observed.
    pub async fn take(&self, pattern: &ActionPattern) -> Result<Action, EffectError> {
        let mut rx = self.store_for("take an action")?.subscribe();
        while let Some(action) = rx.recv().await {
            if pattern.matches(&action) {
                return Ok(action);
            }
        }
        Err(EffectError::ChannelClosed)
    }

    /// Run `handler` as an independent task with the real routine: spawn
    /// is pass-through, not mockable.
    pub fn spawn(&self, handler: &TaskHandler, action: Action) -> TaskRef {
        self.spawn_with(handler.name_arc(), handler.func(), action)
    }

    /// Spawn a handler invocation after registry resolution. Used by the
    /// watch driver, so substitutes share the watch's cancellation fate.
    pub(crate) fn spawn_resolved(&self, handler: &TaskHandler, action: Action) -> TaskRef {
        let resolved = self.inner.mocks.resolve_handler(handler);
        self.spawn_with(handler.name_arc(), resolved, action)
    }

    fn spawn_with(&self, name: Arc<str>, f: HandlerFn, action: Action) -> TaskRef {
        let ctx = self.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = f(action, ctx).await {
                warn!(handler = %name, error = %err, "handler failed");
            }
        });
        TaskRef::new(handle)
    }

    pub fn cancel(&self, task: &TaskRef) {
        task.cancel();
    }

    /// First effect to complete wins; the losing branches are dropped at
    /// their current suspension point.
    pub async fn race(&self, effects: Vec<Effect>) -> Result<(usize, EffectOutcome), EffectError> {
        if effects.is_empty() {
            return Err(EffectError::EmptyRace);
        }
        let branches: Vec<_> = effects.into_iter().map(|e| self.apply(e)).collect();
        let (outcome, index, _rest) = future::select_all(branches).await;
        outcome.map(|o| (index, o))
    }

    /// Descriptor-driven entry point: apply one effect and report what it
    /// produced.
    pub fn apply(&self, effect: Effect) -> BoxFuture<'static, Result<EffectOutcome, EffectError>> {
        let ctx = self.clone();
        Box::pin(async move {
            match effect {
                Effect::Call { target, args } => {
                    ctx.call(&target, args).await.map(EffectOutcome::Value)
                }
                Effect::Put(action) => ctx.put(action).map(|()| EffectOutcome::Done),
                Effect::Take(pattern) => ctx.take(&pattern).await.map(EffectOutcome::Action),
                Effect::Select => ctx.select().map(EffectOutcome::State),
                Effect::Race(effects) => ctx.race(effects).await.map(|(index, outcome)| {
                    EffectOutcome::Raced {
                        index,
                        outcome: Box::new(outcome),
                    }
                }),
                Effect::Spawn { handler, action } => {
                    Ok(EffectOutcome::Task(ctx.spawn(&handler, action)))
                }
                Effect::Cancel(task) => {
                    task.cancel();
                    Ok(EffectOutcome::Done)
                }
            }
        })
    }
}
