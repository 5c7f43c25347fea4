use rewire_store::{Store, Value};

use crate::config::StateToProps;

/// Projects derived props from the live container. Always reads current
/// state at call time; never caches a snapshot.
#[derive(Clone)]
pub struct PropsGetter {
    store: Store,
    projection: Option<StateToProps>,
    props_in: Value,
}

impl PropsGetter {
    pub(crate) fn new(store: Store, projection: Option<StateToProps>, props_in: Value) -> Self {
        PropsGetter {
            store,
            projection,
            props_in,
        }
    }

    /// Current projected props, or `Value::Null` when the component
    /// declared no projection.
    pub fn get(&self) -> Value {
        match &self.projection {
            Some(projection) => projection(&self.store.state(), &self.props_in),
            None => Value::Null,
        }
    }
}
