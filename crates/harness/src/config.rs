use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use rewire_driver::{MockMapping, MockMode, Saga};
use rewire_store::{Action, Reducer, Value};

use crate::functions::FunctionTree;

/// Minimal scheduling delay granted to in-flight handler tasks before
/// derived props are read back. A tuning parameter, not a deadline.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Derived-properties projection: (container state, initial props) -> props.
pub type StateToProps = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;

/// Dispatch entry point handed to `dispatch_to_props`.
pub type Dispatch = Arc<dyn Fn(Action) + Send + Sync>;

/// Builds the bound action-creator tree from a dispatch entry point and the
/// initial props.
pub type DispatchToProps =
    Arc<dyn Fn(Dispatch, &Value) -> BTreeMap<String, FunctionTree> + Send + Sync>;

/// The two optional projection halves of the component under test.
#[derive(Clone, Default)]
pub struct Component {
    pub(crate) state_to_props: Option<StateToProps>,
    pub(crate) dispatch_to_props: Option<DispatchToProps>,
}

impl Component {
    pub fn new() -> Self {
        Component::default()
    }

    pub fn state_to_props<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        self.state_to_props = Some(Arc::new(f));
        self
    }

    pub fn dispatch_to_props<F>(mut self, f: F) -> Self
    where
        F: Fn(Dispatch, &Value) -> BTreeMap<String, FunctionTree> + Send + Sync + 'static,
    {
        self.dispatch_to_props = Some(Arc::new(f));
        self
    }
}

/// Everything `wire` needs to stand up one harness instance.
pub struct WireConfig {
    pub(crate) reducer: Reducer,
    pub(crate) sagas: Vec<Saga>,
    pub(crate) component: Component,
    pub(crate) params: Option<Value>,
    pub(crate) own_props: Value,
    pub(crate) mocks: Vec<MockMapping>,
    pub(crate) initial_store: Value,
    pub(crate) settle_delay: Duration,
    pub(crate) mock_mode: MockMode,
}

impl WireConfig {
    pub fn new() -> Self {
        WireConfig {
            reducer: Reducer::identity(),
            sagas: Vec::new(),
            component: Component::default(),
            params: None,
            own_props: default_own_props(),
            mocks: Vec::new(),
            initial_store: Value::Null,
            settle_delay: DEFAULT_SETTLE_DELAY,
            mock_mode: MockMode::Permissive,
        }
    }

    pub fn reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    pub fn saga(mut self, saga: Saga) -> Self {
        self.sagas.push(saga);
        self
    }

    pub fn component(mut self, component: Component) -> Self {
        self.component = component;
        self
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn own_props(mut self, own_props: Value) -> Self {
        self.own_props = own_props;
        self
    }

    pub fn mocks(mut self, mocks: Vec<MockMapping>) -> Self {
        self.mocks = mocks;
        self
    }

    pub fn mock(mut self, mapping: MockMapping) -> Self {
        self.mocks.push(mapping);
        self
    }

    pub fn initial_store(mut self, initial: Value) -> Self {
        self.initial_store = initial;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn mock_mode(mut self, mode: MockMode) -> Self {
        self.mock_mode = mode;
        self
    }
}

impl Default for WireConfig {
    fn default() -> Self {
        WireConfig::new()
    }
}

fn default_own_props() -> Value {
    Value::from(json!({ "location": { "search": "" } }))
}

/// Initial props handed to both projection halves: own props with `params`
/// overlaid. An explicit `params` wins over any `own_props.params`.
pub(crate) fn initial_props(own_props: &Value, params: Option<&Value>) -> Value {
    match params {
        Some(params) => own_props.set("params", params.clone()),
        None => own_props.clone(),
    }
}
