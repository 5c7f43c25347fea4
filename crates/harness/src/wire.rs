use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use rewire_driver::{bind, SagaContext};
use rewire_store::{Action, Store, Value};

use crate::config::{initial_props, Dispatch, WireConfig};
use crate::error::HarnessError;
use crate::functions::BoundFunctions;
use crate::props::PropsGetter;
use crate::settle::{SettleScheduler, SettledProps};

/// One live harness instance: the container, its working context, and the
/// settle-aware surfaces a test drives it through.
pub struct Wired {
    store: Store,
    ctx: SagaContext,
    functions: BoundFunctions,
    scheduler: SettleScheduler,
    getter: PropsGetter,
}

/// Stand up a harness instance: build the store, start every watch, compile
/// the mocks, and bind the component's projection halves.
///
/// Watches are subscribed before this returns, so nothing dispatched
/// afterwards can miss them. Must be called within a Tokio runtime.
pub fn wire(config: WireConfig) -> Result<Wired, HarnessError> {
    let store = Store::new(config.reducer, config.initial_store)?;
    let ctx = bind(&store, &config.sagas, &config.mocks, config.mock_mode);

    let props_in = initial_props(&config.own_props, config.params.as_ref());
    let getter = PropsGetter::new(
        store.clone(),
        config.component.state_to_props.clone(),
        props_in.clone(),
    );
    let scheduler = SettleScheduler::new(config.settle_delay, getter.clone());

    let tree = match &config.component.dispatch_to_props {
        Some(build) => {
            let dispatch_store = store.clone();
            let dispatch: Dispatch = Arc::new(move |action: Action| dispatch_store.dispatch(action));
            build(dispatch, &props_in)
        }
        None => BTreeMap::new(),
    };
    let functions = BoundFunctions::new(tree, scheduler.clone());

    debug!(sagas = config.sagas.len(), mocks = config.mocks.len(), "harness wired");
    Ok(Wired {
        store,
        ctx,
        functions,
        scheduler,
        getter,
    })
}

impl Wired {
    /// The bound function tree.
    pub fn functions(&self) -> &BoundFunctions {
        &self.functions
    }

    /// Invoke a bound function by dotted path; resolves to settled props.
    pub fn call(&self, path: &str, args: Vec<Value>) -> Result<SettledProps, HarnessError> {
        self.functions.call(path, args)
    }

    /// Raw settle-aware dispatch, for actions with no bound creator.
    pub fn dispatch(&self, action: Action) -> SettledProps {
        let store = self.store.clone();
        self.scheduler.settle_after(move || store.dispatch(action))
    }

    /// Current projected props, without settling.
    pub fn props(&self) -> Value {
        self.getter.get()
    }

    /// The live container, for state and dispatch-log assertions.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The bound working context, for driving effects directly.
    pub fn context(&self) -> &SagaContext {
        &self.ctx
    }
}
