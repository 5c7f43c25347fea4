use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use rewire_store::{Action, ActionPattern, Value};

use crate::target::{CallTarget, TaskHandler};

/// Plain instruction describing a desired effect. Descriptors are data;
/// nothing runs until the context applies them. Only `Call` is subject to
/// mock interception here; `Put` routes through the bound store; the rest
/// pass through unaltered.
#[derive(Clone)]
pub enum Effect {
    Call { target: CallTarget, args: Vec<Value> },
    Put(Action),
    Take(ActionPattern),
    Select,
    Race(Vec<Effect>),
    Spawn { handler: TaskHandler, action: Action },
    Cancel(TaskRef),
}

/// What applying an effect produced.
#[derive(Debug)]
pub enum EffectOutcome {
    /// Result of a `Call`.
    Value(Value),
    /// The action matched by a `Take`.
    Action(Action),
    /// State snapshot from a `Select`.
    State(Value),
    /// First-completed branch of a `Race`.
    Raced {
        index: usize,
        outcome: Box<EffectOutcome>,
    },
    /// Task started by a `Spawn`.
    Task(TaskRef),
    /// `Put` or `Cancel` completed.
    Done,
}

/// Handle to a spawned handler invocation.
#[derive(Clone)]
pub struct TaskRef {
    handle: Arc<JoinHandle<()>>,
}

impl TaskRef {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        TaskRef {
            handle: Arc::new(handle),
        }
    }

    /// Cancel the task. Takes effect at its next suspension point; a task
    /// that has not yet been polled never runs.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl fmt::Debug for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRef")
            .field("finished", &self.is_finished())
            .finish()
    }
}
