use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::action::Action;
use crate::error::StoreError;
use crate::reducer::Reducer;
use crate::value::Value;

/// Canonical holder of state for one harness instance.
///
/// Dispatch is synchronous: the reducer runs, the new state is installed,
/// the action is appended to the dispatch log and forwarded to every
/// subscriber, all before `dispatch` returns. Subscriber channels are
/// unbounded, so notification never blocks and ordering is FIFO as issued.
/// Cheap to clone; clones share the same container.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<Value>,
    reducer: Reducer,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Action>>>,
    dispatched: Mutex<Vec<Action>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Build a store with the given reducer and initial state.
    /// A `ByDomain` reducer requires a map-shaped (or null) root.
    pub fn new(reducer: Reducer, initial: Value) -> Result<Self, StoreError> {
        if matches!(reducer, Reducer::ByDomain(_))
            && !matches!(initial, Value::Map(_) | Value::Null)
        {
            return Err(StoreError::CompositeState(initial.type_name()));
        }
        let initial = match initial {
            Value::Null => Value::empty_map(),
            other => other,
        };
        Ok(Store {
            inner: Arc::new(StoreInner {
                state: Mutex::new(initial),
                reducer,
                subscribers: Mutex::new(Vec::new()),
                dispatched: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Snapshot of the current state at call time.
    pub fn state(&self) -> Value {
        lock(&self.inner.state).clone()
    }

    /// Apply the reducer and notify subscribers, synchronously and in order.
    pub fn dispatch(&self, action: Action) {
        debug!(kind = %action.kind, "dispatch");
        {
            let mut state = lock(&self.inner.state);
            let next = self.inner.reducer.apply(&state, &action);
            *state = next;
        }
        lock(&self.inner.dispatched).push(action.clone());
        lock(&self.inner.subscribers).retain(|tx| tx.send(action.clone()).is_ok());
    }

    /// Register a subscriber; every subsequently dispatched action is
    /// delivered to the returned receiver. Closed receivers are pruned on
    /// the next dispatch.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Action> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.inner.subscribers).push(tx);
        rx
    }

    /// Every action ever dispatched into this store, in dispatch order.
    pub fn dispatched(&self) -> Vec<Action> {
        lock(&self.inner.dispatched).clone()
    }

    /// Current state serialized as pretty JSON.
    pub fn snapshot(&self) -> String {
        let json = serde_json::Value::from(&self.state());
        serde_json::to_string_pretty(&json).unwrap_or_default()
    }
}
