use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use tokio::time::sleep;

use rewire_driver::{async_call_fn, call_fn, handler_fn, CallFn, HandlerFn, TaskHandler};
use rewire_store::{Action, Value};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records every invocation's arguments while standing in for a call
/// target. One recorder can back several substitutes; they share the log.
#[derive(Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<Vec<Value>>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        CallRecorder::default()
    }

    /// Substitute that records its arguments and resolves to `value`.
    pub fn returning(&self, value: Value) -> CallFn {
        let calls = Arc::clone(&self.calls);
        call_fn(move |args| {
            lock(&calls).push(args);
            Ok(value.clone())
        })
    }

    /// Substitute that records, waits out `delay`, then resolves to
    /// `value`. Used to keep a handler suspended across a cancellation
    /// window.
    pub fn returning_after(&self, value: Value, delay: Duration) -> CallFn {
        let calls = Arc::clone(&self.calls);
        async_call_fn(move |args| {
            lock(&calls).push(args);
            let value = value.clone();
            async move {
                sleep(delay).await;
                Ok(value)
            }
        })
    }

    /// Substitute that records and then never resolves.
    pub fn pending(&self) -> CallFn {
        let calls = Arc::clone(&self.calls);
        async_call_fn(move |args| {
            lock(&calls).push(args);
            future::pending()
        })
    }

    pub fn calls(&self) -> Vec<Vec<Value>> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn called_with(&self, args: &[Value]) -> bool {
        lock(&self.calls).iter().any(|call| call == args)
    }
}

/// Records every action a substituted handler was invoked with.
#[derive(Clone, Default)]
pub struct HandlerRecorder {
    seen: Arc<Mutex<Vec<Action>>>,
}

impl HandlerRecorder {
    pub fn new() -> Self {
        HandlerRecorder::default()
    }

    /// Raw recording handler, for `MockMapping::handler_fn`.
    pub fn handler_fn(&self) -> HandlerFn {
        let seen = Arc::clone(&self.seen);
        handler_fn(move |action, _ctx| {
            lock(&seen).push(action);
            future::ready(Ok(()))
        })
    }

    /// Named recording handler, for watch registration or spawning.
    pub fn handler(&self, name: impl Into<String>) -> TaskHandler {
        let seen = Arc::clone(&self.seen);
        TaskHandler::new(name, move |action, _ctx| {
            lock(&seen).push(action);
            future::ready(Ok(()))
        })
    }

    pub fn actions(&self) -> Vec<Action> {
        lock(&self.seen).clone()
    }
}
