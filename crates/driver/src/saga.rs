use rewire_store::ActionPattern;

use crate::target::TaskHandler;

/// Concurrency mode of a watch registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Cancel the in-flight handler invocation when a new match arrives,
    /// before starting the fresh one.
    Latest,
    /// Start an independent invocation per match; never cancel.
    Every,
}

/// One handler registered against an action pattern.
#[derive(Clone)]
pub struct Watch {
    pub(crate) mode: WatchMode,
    pub(crate) pattern: ActionPattern,
    pub(crate) handler: TaskHandler,
}

impl Watch {
    pub fn mode(&self) -> WatchMode {
        self.mode
    }

    pub fn pattern(&self) -> &ActionPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &TaskHandler {
        &self.handler
    }
}

/// A named bundle of watch registrations, alive for the lifetime of the
/// container it is started against.
#[derive(Clone)]
pub struct Saga {
    name: String,
    watches: Vec<Watch>,
}

impl Saga {
    pub fn new(name: impl Into<String>) -> Self {
        Saga {
            name: name.into(),
            watches: Vec::new(),
        }
    }

    pub fn watch_latest(mut self, pattern: impl Into<ActionPattern>, handler: TaskHandler) -> Self {
        self.watches.push(Watch {
            mode: WatchMode::Latest,
            pattern: pattern.into(),
            handler,
        });
        self
    }

    pub fn watch_every(mut self, pattern: impl Into<ActionPattern>, handler: TaskHandler) -> Self {
        self.watches.push(Watch {
            mode: WatchMode::Every,
            pattern: pattern.into(),
            handler,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn watches(&self) -> &[Watch] {
        &self.watches
    }
}
