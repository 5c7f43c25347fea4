//! Top-level test harness: `wire` a reducer, sagas and a component's
//! projection halves into a live container, then drive it through bound
//! functions that resolve to settled props.

pub mod config;
pub mod error;
pub mod functions;
pub mod props;
pub mod settle;
pub mod testing;
pub mod wire;


pub use config::{Component, Dispatch, DispatchToProps, StateToProps, WireConfig, DEFAULT_SETTLE_DELAY};
pub use error::HarnessError;
pub use functions::{ActionCreator, BoundFunctions, FunctionTree};
pub use props::PropsGetter;
pub use settle::{SettleScheduler, SettledProps};
pub use testing::{CallRecorder, HandlerRecorder};
pub use wire::{wire, Wired};
