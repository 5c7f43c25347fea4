use std::collections::BTreeMap;
use std::sync::Arc;

use crate::action::Action;
use crate::value::Value;

/// Pure state-transition function: (state, action) -> new state.
pub type ReducerFn = Arc<dyn Fn(&Value, &Action) -> Value + Send + Sync>;

/// Wrap a closure into a shareable reducer function.
pub fn reducer_fn<F>(f: F) -> ReducerFn
where
    F: Fn(&Value, &Action) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// State-transition logic for a store: a single reducer over the whole tree,
/// or named sub-reducers merged into one composite reducer over a keyed map.
#[derive(Clone)]
pub enum Reducer {
    Single(ReducerFn),
    ByDomain(BTreeMap<String, ReducerFn>),
}

impl Reducer {
    pub fn single<F>(f: F) -> Self
    where
        F: Fn(&Value, &Action) -> Value + Send + Sync + 'static,
    {
        Reducer::Single(reducer_fn(f))
    }

    /// Reducer that leaves state untouched.
    pub fn identity() -> Self {
        Reducer::single(|state, _| state.clone())
    }

    /// Combine named sub-reducers over a keyed state tree.
    pub fn by_domain<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ReducerFn)>,
    {
        Reducer::ByDomain(entries.into_iter().map(|(k, f)| (k.into(), f)).collect())
    }

    /// Apply the transition. For `ByDomain`, each sub-reducer sees its own
    /// subtree (or `Null` when the domain key is absent) and its output is
    /// written back under the domain key; unrelated keys are preserved.
    pub(crate) fn apply(&self, state: &Value, action: &Action) -> Value {
        match self {
            Reducer::Single(f) => f(state, action),
            Reducer::ByDomain(domains) => {
                let mut tree = match state {
                    Value::Map(m) => m.clone(),
                    _ => BTreeMap::new(),
                };
                for (domain, f) in domains {
                    let sub = tree.get(domain).cloned().unwrap_or(Value::Null);
                    tree.insert(domain.clone(), f(&sub, action));
                }
                Value::Map(tree)
            }
        }
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Reducer::identity()
    }
}
