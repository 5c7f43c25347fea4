//! Workflow driver for the rewire harness: effect descriptors, identity-keyed
//! mock interception, and watch scheduling with latest-wins cancellation.

pub mod bind;
pub mod context;
pub mod effect;
pub mod error;
pub mod mock;
pub mod saga;
pub mod target;

#[cfg(test)]
mod tests;

pub use bind::bind;
pub use context::SagaContext;
pub use effect::{Effect, EffectOutcome, TaskRef};
pub use error::EffectError;
pub use mock::{structured_mocks, MockMapping, MockMode, MockRegistry, Resolved};
pub use saga::{Saga, Watch, WatchMode};
pub use target::{async_call_fn, call_fn, handler_fn, CallFn, CallTarget, HandlerFn, TargetId, TaskHandler};
