use std::collections::BTreeMap;
use std::sync::Arc;

use rewire_store::Value;

use crate::error::HarnessError;
use crate::settle::{SettleScheduler, SettledProps};

/// A bound action creator: invoked with call arguments, dispatches into the
/// container as its side effect.
pub type ActionCreator = Arc<dyn Fn(Vec<Value>) + Send + Sync>;

/// Declared shape of the component's bound functions. Leaves are action
/// creators; groups nest one level of named structure per segment.
#[derive(Clone)]
pub enum FunctionTree {
    Leaf(ActionCreator),
    Group(BTreeMap<String, FunctionTree>),
}

impl FunctionTree {
    pub fn leaf<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) + Send + Sync + 'static,
    {
        FunctionTree::Leaf(Arc::new(f))
    }

    pub fn group(entries: BTreeMap<String, FunctionTree>) -> Self {
        FunctionTree::Group(entries)
    }
}

/// The component's function tree with every leaf behind a settle-aware
/// wrapper. Leaves are addressed by dotted path ("load", "group.load").
pub struct BoundFunctions {
    tree: BTreeMap<String, FunctionTree>,
    scheduler: SettleScheduler,
}

impl BoundFunctions {
    pub(crate) fn new(tree: BTreeMap<String, FunctionTree>, scheduler: SettleScheduler) -> Self {
        BoundFunctions { tree, scheduler }
    }

    /// Invoke the leaf at `path` with `args`; resolves to the projected
    /// props once the dispatch has settled.
    pub fn call(&self, path: &str, args: Vec<Value>) -> Result<SettledProps, HarnessError> {
        let leaf = self.resolve(path)?;
        Ok(self.scheduler.settle_after(move || leaf(args)))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    fn resolve(&self, path: &str) -> Result<ActionCreator, HarnessError> {
        let mut current = &self.tree;
        let mut segments = path.split('.').peekable();
        loop {
            let segment = match segments.next() {
                Some(segment) => segment,
                None => return Err(HarnessError::MissingFunction(path.to_string())),
            };
            match current.get(segment) {
                Some(FunctionTree::Leaf(leaf)) if segments.peek().is_none() => {
                    return Ok(Arc::clone(leaf));
                }
                Some(FunctionTree::Group(inner)) if segments.peek().is_some() => {
                    current = inner;
                }
                _ => return Err(HarnessError::MissingFunction(path.to_string())),
            }
        }
    }
}
