//! Watch streams
//!
//! A watch turns a [`BlockingResource`] into a stream of changes. Nothing
//! runs in the background: each item is fetched when the stream is polled,
//! and dropping the stream stops the watch.

use std::time::Duration;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tracing::{debug, warn};

use crate::blocking::{BlockingResource, ConsistencyIndex, next_baseline, poll};
use crate::error::Result;

/// Blocking wait used by watches unless configured otherwise
pub const DEFAULT_WATCH_WAIT: Duration = Duration::from_secs(600);

const MAX_ERROR_BACKOFF_STEPS: u64 = 180;

/// A change observed by a watch
#[derive(Debug, Clone, PartialEq)]
pub struct WatchUpdate<T> {
    /// Value before the change; `None` for the first result
    pub prev: Option<T>,
    pub next: T,
    pub index: Option<ConsistencyIndex>,
}

/// Timing of a watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    pub wait: Duration,
    /// Pause after a result identical to the previous one
    pub unchanged_pause: Duration,
    /// The n-th consecutive failure delays the next fetch by
    /// `min(n², 180)` of these
    pub error_backoff_unit: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            wait: DEFAULT_WATCH_WAIT,
            unchanged_pause: Duration::from_secs(1),
            error_backoff_unit: Duration::from_secs(1),
        }
    }
}

impl WatchOptions {
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn error_backoff(&self, failures: u32) -> Duration {
        let steps = (failures as u64).saturating_mul(failures as u64);
        self.error_backoff_unit
            .saturating_mul(steps.min(MAX_ERROR_BACKOFF_STEPS) as u32)
    }
}

struct WatchState<R: BlockingResource> {
    resource: R,
    options: WatchOptions,
    index: Option<ConsistencyIndex>,
    current: Option<R::Output>,
    failures: u32,
    delay: Option<Duration>,
}

/// Watch `resource` with default timing
pub fn watch<R>(resource: R) -> BoxStream<'static, Result<WatchUpdate<R::Output>>>
where
    R: BlockingResource + 'static,
    R::Output: Clone + PartialEq + 'static,
{
    watch_with(resource, WatchOptions::default())
}

/// Watch `resource`. Errors are yielded and the watch continues after a
/// backoff; stop by dropping the stream.
pub fn watch_with<R>(
    resource: R,
    options: WatchOptions,
) -> BoxStream<'static, Result<WatchUpdate<R::Output>>>
where
    R: BlockingResource + 'static,
    R::Output: Clone + PartialEq + 'static,
{
    let state = WatchState {
        resource,
        options,
        index: None,
        current: None,
        failures: 0,
        delay: None,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(delay) = state.delay.take() {
                tokio::time::sleep(delay).await;
            }

            match poll(&state.resource, state.index, Some(state.options.wait)).await {
                Ok(result) => {
                    state.failures = 0;
                    let baseline = next_baseline(state.index, result.meta.index);
                    let unchanged =
                        baseline == state.index && state.current.as_ref() == Some(&result.value);
                    state.index = baseline;

                    if unchanged {
                        debug!("{} unchanged at {:?}", state.resource.describe(), baseline);
                        state.delay = Some(state.options.unchanged_pause);
                        continue;
                    }

                    let prev = state.current.replace(result.value.clone());
                    let update = WatchUpdate {
                        prev,
                        next: result.value,
                        index: baseline,
                    };
                    return Some((Ok(update), state));
                }
                Err(e) => {
                    state.failures += 1;
                    let delay = state.options.error_backoff(state.failures);
                    warn!(
                        "watch of {} failed ({} in a row): {}, next attempt in {:?}",
                        state.resource.describe(),
                        state.failures,
                        e,
                        delay
                    );
                    state.delay = Some(delay);
                    return Some((Err(e), state));
                }
            }
        }
    })
    .boxed()
}
