use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::sleep;

use rewire_store::Value;

use crate::props::PropsGetter;

/// Future resolving to the projected props once in-flight work has had its
/// scheduling window.
pub type SettledProps = BoxFuture<'static, Value>;

/// Wraps a synchronous trigger in a future that waits out the configured
/// delay before reading props back. The delay applies uniformly whether or
/// not anything asynchronous is pending, so settled reads are deterministic
/// with respect to task scheduling.
#[derive(Clone)]
pub struct SettleScheduler {
    delay: Duration,
    getter: PropsGetter,
}

impl SettleScheduler {
    pub(crate) fn new(delay: Duration, getter: PropsGetter) -> Self {
        SettleScheduler { delay, getter }
    }

    /// Run `trigger` now, then resolve to the projected props after the
    /// settle delay.
    pub fn settle_after(&self, trigger: impl FnOnce()) -> SettledProps {
        trigger();
        let delay = self.delay;
        let getter = self.getter.clone();
        Box::pin(async move {
            sleep(delay).await;
            getter.get()
        })
    }
}
