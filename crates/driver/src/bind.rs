use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use rewire_store::{Action, Store};

use crate::context::SagaContext;
use crate::effect::TaskRef;
use crate::mock::{MockMapping, MockMode, MockRegistry};
use crate::saga::{Saga, Watch, WatchMode};

/// Bind a harness instance: compile the mock list, install the working
/// context, and start one watcher task per watch registration.
///
/// Subscribers are registered synchronously before this returns, so no
/// dispatch can race a watch registration. Must be called within a Tokio
/// runtime. There is no teardown: watchers park on their channel once the
/// store's senders are gone.
pub fn bind(store: &Store, sagas: &[Saga], mocks: &[MockMapping], mode: MockMode) -> SagaContext {
    let registry = MockRegistry::compile(mocks);
    let ctx = SagaContext::bound(store.clone(), registry, mode);
    for saga in sagas {
        for watch in saga.watches() {
            let rx = store.subscribe();
            debug!(
                saga = %saga.name(),
                handler = %watch.handler().name(),
                mode = ?watch.mode(),
                "watch started"
            );
            tokio::spawn(run_watch(ctx.clone(), watch.clone(), rx));
        }
    }
    ctx
}

/// Watcher loop for one registration. `Latest` holds at most one in-flight
/// handler task and cancels it the moment a new match arrives; `Every`
/// spawns unconditionally. Handler resolution happens per invocation, so a
/// substituted routine is cancelled exactly like the original would be.
///
/// `Latest` cancellation is issued when this loop processes the superseding
/// action, one scheduler hop after its dispatch; a handler whose pending
/// call resolves within that hop can still land its effects first.
async fn run_watch(ctx: SagaContext, watch: Watch, mut rx: UnboundedReceiver<Action>) {
    let mut in_flight: Option<TaskRef> = None;
    while let Some(action) = rx.recv().await {
        if !watch.pattern().matches(&action) {
            continue;
        }
        if watch.mode() == WatchMode::Latest {
            if let Some(previous) = in_flight.take() {
                if !previous.is_finished() {
                    debug!(handler = %watch.handler().name(), "cancelling in-flight handler");
                }
                previous.cancel();
            }
        }
        let task = ctx.spawn_resolved(watch.handler(), action);
        if watch.mode() == WatchMode::Latest {
            in_flight = Some(task);
        }
    }
}
