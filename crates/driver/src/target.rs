use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture};

use rewire_store::{Action, Value};

use crate::context::SagaContext;
use crate::error::EffectError;

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity for a mockable target.
///
/// Rust functions carry no comparable identity, so every target is assigned
/// an explicit id at construction; mock mappings key on it. Clones of a
/// target share the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

impl TargetId {
    fn next() -> Self {
        TargetId(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub type CallFuture = BoxFuture<'static, Result<Value, EffectError>>;

/// Callable invoked by a call effect (or standing in for one as a mock).
pub type CallFn = Arc<dyn Fn(Vec<Value>) -> CallFuture + Send + Sync>;

/// Build a `CallFn` from a synchronous closure.
pub fn call_fn<F>(f: F) -> CallFn
where
    F: Fn(Vec<Value>) -> Result<Value, EffectError> + Send + Sync + 'static,
{
    Arc::new(move |args| {
        let result = f(args);
        Box::pin(future::ready(result)) as CallFuture
    })
}

/// Build a `CallFn` from an async closure.
pub fn async_call_fn<F, Fut>(f: F) -> CallFn
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, EffectError>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)) as CallFuture)
}

/// A named side-effecting call target with explicit identity.
#[derive(Clone)]
pub struct CallTarget {
    id: TargetId,
    name: Arc<str>,
    f: CallFn,
}

impl CallTarget {
    /// Target backed by a synchronous closure.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, EffectError> + Send + Sync + 'static,
    {
        CallTarget {
            id: TargetId::next(),
            name: name.into().into(),
            f: call_fn(f),
        }
    }

    /// Target backed by an async closure.
    pub fn new_async<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EffectError>> + Send + 'static,
    {
        CallTarget {
            id: TargetId::next(),
            name: name.into().into(),
            f: async_call_fn(f),
        }
    }

    /// Target backed by a method bound to an object. When the target is
    /// invoked unmapped, `method` runs against the captured `object` with
    /// the forwarded arguments.
    pub fn from_method<T, F>(name: impl Into<String>, object: Arc<T>, method: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T, Vec<Value>) -> Result<Value, EffectError> + Send + Sync + 'static,
    {
        CallTarget::new(name, move |args| method(&object, args))
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the real implementation. A call effect resolves exactly once;
    /// the driver never re-invokes a resolved target implicitly.
    pub(crate) fn invoke(&self, args: Vec<Value>) -> CallFuture {
        (self.f)(args)
    }
}

impl fmt::Debug for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallTarget")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub type HandlerFuture = BoxFuture<'static, Result<(), EffectError>>;

/// Routine run per matching action by a watch registration.
pub type HandlerFn = Arc<dyn Fn(Action, SagaContext) -> HandlerFuture + Send + Sync>;

/// Build a `HandlerFn` from an async closure.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Action, SagaContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), EffectError>> + Send + 'static,
{
    Arc::new(move |action, ctx| Box::pin(f(action, ctx)) as HandlerFuture)
}

/// A named watched-handler routine with explicit identity, so an entire
/// reactive routine can be substituted through the same mock surface as a
/// call target.
#[derive(Clone)]
pub struct TaskHandler {
    id: TargetId,
    name: Arc<str>,
    f: HandlerFn,
}

impl TaskHandler {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Action, SagaContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), EffectError>> + Send + 'static,
    {
        TaskHandler {
            id: TargetId::next(),
            name: name.into().into(),
            f: handler_fn(f),
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub(crate) fn func(&self) -> HandlerFn {
        Arc::clone(&self.f)
    }
}

impl fmt::Debug for TaskHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandler")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
