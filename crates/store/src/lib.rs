//! State container for the rewire harness: immutable value trees, actions,
//! reducers, and a dispatching store with a subscriber set.

pub mod action;
pub mod error;
pub mod reducer;
pub mod store;
pub mod value;


pub use action::{Action, ActionPattern};
pub use error::StoreError;
pub use reducer::{reducer_fn, Reducer, ReducerFn};
pub use store::Store;
pub use value::Value;
