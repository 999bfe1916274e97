//! Polling refresh controllers
//!
//! A [`RefreshHook`] owns the data produced by one async fetch function and
//! republishes it on a `watch` channel every time a fetch settles. Data is
//! kept across failures, the error is cleared when a fetch starts, and
//! `last_updated` only moves on success.
//!
//! Fetches are never de-duplicated. When two overlap, whichever settles last
//! wins, and `loading` stays true while any of them is still running. A
//! fetch whose future is dropped before it settles releases its slot without
//! touching the data.

use crate::{
    aggregator::TokenAggregator,
    constants::REFRESH_INTERVAL_MS,
    polling::PollingSession,
    types::PriceQuote,
};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Lifecycle of the hook's fetches
///
/// `Loading` while any fetch is in flight, otherwise the outcome of the last
/// settled one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Observable state of a [`RefreshHook`]
#[derive(Debug, Clone)]
pub struct RefreshState<T> {
    pub status: RefreshStatus,
    /// Last successful result, kept when later fetches fail
    pub data: Option<T>,
    /// True while at least one fetch is in flight
    pub loading: bool,
    /// Message of the last failed fetch, cleared when a fetch starts
    pub error: Option<String>,
    /// Time of the last successful fetch
    pub last_updated: Option<DateTime<Utc>>,
    in_flight: usize,
}

impl<T> Default for RefreshState<T> {
    fn default() -> Self {
        Self {
            status: RefreshStatus::Idle,
            data: None,
            loading: false,
            error: None,
            last_updated: None,
            in_flight: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub auto_refresh: bool,
    pub refresh_interval: Duration,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            auto_refresh: false,
            refresh_interval: Duration::from_millis(REFRESH_INTERVAL_MS),
        }
    }
}

impl RefreshOptions {
    /// Auto refresh every `interval`
    pub fn every(interval: Duration) -> Self {
        Self {
            auto_refresh: true,
            refresh_interval: interval,
        }
    }
}

type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

struct Shared<T> {
    fetch: FetchFn<T>,
    state: watch::Sender<RefreshState<T>>,
    mounted: AtomicBool,
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
    /// Registers one fetch as in flight until the returned guard settles or drops
    fn begin(self: &Arc<Self>) -> InFlight<T> {
        self.state.send_modify(|state| {
            state.in_flight += 1;
            state.loading = true;
            state.status = RefreshStatus::Loading;
            state.error = None;
        });
        InFlight {
            shared: self.clone(),
            settled: false,
        }
    }

    fn finish(&self, result: Result<T, String>) {
        // Late results of an unmounted hook are dropped
        if !self.mounted.load(Ordering::Acquire) {
            return;
        }

        self.state.send_modify(|state| {
            state.in_flight = state.in_flight.saturating_sub(1);
            state.loading = state.in_flight > 0;
            let settled = match result {
                Ok(data) => {
                    state.data = Some(data);
                    state.error = None;
                    state.last_updated = Some(Utc::now());
                    RefreshStatus::Success
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Refresh failed");
                    state.error = Some(error);
                    RefreshStatus::Error
                }
            };
            state.status = if state.loading {
                RefreshStatus::Loading
            } else {
                settled
            };
        });
    }

    /// Releases a fetch that was cancelled before it settled
    fn abandon(&self) {
        self.state.send_modify(|state| {
            state.in_flight = state.in_flight.saturating_sub(1);
            state.loading = state.in_flight > 0;
            state.status = if state.loading {
                RefreshStatus::Loading
            } else if state.error.is_some() {
                RefreshStatus::Error
            } else if state.data.is_some() {
                RefreshStatus::Success
            } else {
                RefreshStatus::Idle
            };
        });
    }

    async fn run(self: &Arc<Self>) {
        let pending = self.begin();
        let result = (self.fetch)().await;
        pending.settle(result);
    }
}

/// One in-flight fetch; dropping it unsettled releases its `in_flight` slot
struct InFlight<T: Clone + Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
    settled: bool,
}

impl<T: Clone + Send + Sync + 'static> InFlight<T> {
    fn settle(mut self, result: Result<T, String>) {
        self.settled = true;
        self.shared.finish(result);
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for InFlight<T> {
    fn drop(&mut self) {
        if !self.settled {
            self.shared.abandon();
        }
    }
}

/// Polling controller over one fetch function
///
/// Creating the hook starts the first fetch immediately; with
/// `auto_refresh` a timer fetches again every `refresh_interval`. Dropping
/// the hook stops the timer and discards results that arrive afterwards.
pub struct RefreshHook<T: Clone + Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
    initial: JoinHandle<()>,
    session: Option<PollingSession>,
}

impl<T: Clone + Send + Sync + 'static> RefreshHook<T> {
    /// Must be called from within a Tokio runtime
    pub fn new<F, Fut, E>(fetch: F, options: RefreshOptions) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display,
    {
        let fetch: FetchFn<T> = Arc::new(move || {
            let pending = fetch();
            async move { pending.await.map_err(|e| e.to_string()) }.boxed()
        });
        let (state, _) = watch::channel(RefreshState::default());
        let shared = Arc::new(Shared {
            fetch,
            state,
            mounted: AtomicBool::new(true),
        });

        // Loading is visible before the first poll of the spawned fetch
        let pending = shared.begin();
        let initial = {
            let shared = shared.clone();
            tokio::spawn(async move {
                let result = (shared.fetch)().await;
                pending.settle(result);
            })
        };

        let session = options.auto_refresh.then(|| {
            let shared = shared.clone();
            PollingSession::start("refresh", options.refresh_interval, false, move |_| {
                let shared = shared.clone();
                async move { shared.run().await }
            })
        });

        Self {
            shared,
            initial,
            session,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> RefreshState<T> {
        self.shared.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.shared.state.borrow().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.shared.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.borrow().error.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.shared.state.borrow().last_updated
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<RefreshState<T>> {
        self.shared.state.subscribe()
    }

    /// Fetches now, with the same effect as a timer tick
    pub async fn refetch(&self) {
        self.shared.run().await;
    }

    /// Id of the auto-refresh timer, if one is running
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(PollingSession::id)
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for RefreshHook<T> {
    fn drop(&mut self) {
        self.shared.mounted.store(false, Ordering::Release);
        self.initial.abort();
        if let Some(session) = &self.session {
            session.cancel();
        }
    }
}

/// Latest outcome of a price subscription
#[derive(Debug, Clone, Default)]
pub struct PriceFeedState {
    /// Last quote received, kept when later polls fail
    pub price: Option<PriceQuote>,
    /// Message of the last poll if it failed
    pub error: Option<String>,
}

/// Live price of the tracked token, polled through `subscribe_to_price`
pub struct PriceFeed {
    state: watch::Receiver<PriceFeedState>,
    subscription: crate::aggregator::Subscription,
}

impl PriceFeed {
    pub fn new(aggregator: &TokenAggregator, interval: Duration) -> Self {
        let (tx, state) = watch::channel(PriceFeedState::default());
        let subscription = aggregator.subscribe_to_price(
            move |result| {
                tx.send_modify(|state| match result {
                    Ok(quote) => {
                        state.price = Some(quote);
                        state.error = None;
                    }
                    Err(e) => state.error = Some(e.to_string()),
                });
            },
            interval,
        );

        Self {
            state,
            subscription,
        }
    }

    pub fn price(&self) -> Option<PriceQuote> {
        self.state.borrow().price.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PriceFeedState> {
        self.state.clone()
    }

    pub fn subscription_id(&self) -> Uuid {
        self.subscription.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::{quote, sources_with};
    use crate::config::TokenIdentity;
    use crate::provider::mock::{MockFailure, MockSource};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::time::sleep;

    type Step = (u64, Result<u32, &'static str>);

    /// Fetch function replaying `(delay_ms, result)` steps; the last one repeats
    fn scripted(
        steps: Vec<Step>,
    ) -> (
        impl Fn() -> BoxFuture<'static, Result<u32, String>> + Send + Sync + 'static,
        Arc<AtomicUsize>,
    ) {
        let steps = Arc::new(Mutex::new(VecDeque::from(steps)));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let fetch = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let step = {
                let mut steps = steps.lock().unwrap();
                if steps.len() > 1 {
                    steps.pop_front()
                } else {
                    steps.front().cloned()
                }
            };
            async move {
                let (delay_ms, result) = step.unwrap_or((0, Err("empty script")));
                sleep(Duration::from_millis(delay_ms)).await;
                result.map_err(str::to_string)
            }
            .boxed()
        };
        (fetch, calls)
    }

    async fn settled(hook: &RefreshHook<u32>) {
        hook.subscribe().wait_for(|s| !s.loading).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load() {
        let (fetch, calls) = scripted(vec![(50, Ok(7))]);
        let hook = RefreshHook::new(fetch, RefreshOptions::default());

        let state = hook.state();
        assert!(state.loading);
        assert_eq!(state.status, RefreshStatus::Loading);
        assert_eq!(state.data, None);
        assert!(hook.session_id().is_none());

        settled(&hook).await;
        let state = hook.state();
        assert_eq!(state.status, RefreshStatus::Success);
        assert_eq!(state.data, Some(7));
        assert!(state.error.is_none());
        assert!(state.last_updated.is_some());

        sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_data_until_recovery() {
        let (fetch, _) = scripted(vec![(0, Ok(1)), (0, Err("boom")), (0, Ok(2))]);
        let hook = RefreshHook::new(fetch, RefreshOptions::default());
        settled(&hook).await;
        let first_update = hook.last_updated();

        hook.refetch().await;
        assert_eq!(hook.data(), Some(1));
        assert_eq!(hook.error().as_deref(), Some("boom"));
        assert_eq!(hook.state().status, RefreshStatus::Error);
        assert_eq!(hook.last_updated(), first_update);

        std::thread::sleep(std::time::Duration::from_millis(2));
        hook.refetch().await;
        assert_eq!(hook.data(), Some(2));
        assert!(hook.error().is_none());
        assert!(hook.last_updated() > first_update);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_stops_on_drop() {
        let (fetch, calls) = scripted(vec![(0, Ok(1))]);
        let hook = RefreshHook::new(fetch, RefreshOptions::every(Duration::from_secs(10)));
        assert!(hook.session_id().is_some());

        settled(&hook).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(25)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(hook);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_fetches_last_write_wins() {
        let (fetch, _) = scripted(vec![(0, Ok(1)), (5_000, Ok(2)), (100, Ok(3))]);
        let hook = RefreshHook::new(fetch, RefreshOptions::default());
        settled(&hook).await;

        tokio::join!(
            hook.refetch(),
            async {
                sleep(Duration::from_millis(10)).await;
                hook.refetch().await;
            },
            async {
                sleep(Duration::from_secs(1)).await;
                let state = hook.state();
                assert_eq!(state.data, Some(3));
                assert!(state.loading);
                assert_eq!(state.status, RefreshStatus::Loading);
            }
        );

        let state = hook.state();
        assert_eq!(state.data, Some(2));
        assert!(!state.loading);
        assert_eq!(state.status, RefreshStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_refetch_releases_loading() {
        let (fetch, _) = scripted(vec![(0, Ok(1)), (60_000, Ok(9)), (0, Ok(2))]);
        let hook = RefreshHook::new(fetch, RefreshOptions::default());
        settled(&hook).await;

        let timed_out = tokio::time::timeout(Duration::from_secs(1), hook.refetch()).await;
        assert!(timed_out.is_err());

        let state = hook.state();
        assert!(!state.loading);
        assert_eq!(state.status, RefreshStatus::Success);
        assert_eq!(state.data, Some(1));

        sleep(Duration::from_secs(300)).await;
        hook.refetch().await;
        let state = hook.state();
        assert!(!state.loading);
        assert_eq!(state.status, RefreshStatus::Success);
        assert_eq!(state.data, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmounted_hook_ignores_late_results() {
        let (fetch, _) = scripted(vec![(5_000, Ok(1))]);
        let hook = RefreshHook::new(fetch, RefreshOptions::default());
        let rx = hook.subscribe();

        drop(hook);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(rx.borrow().data, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_price_feed_keeps_last_quote_on_error() {
        let script = MockSource::scripted(vec![
            Ok(quote(1.0, None)),
            Err(MockFailure::Status(503)),
            Ok(quote(2.0, None)),
        ]);
        let aggregator = TokenAggregator::new(TokenIdentity::bscreener(), sources_with(script));
        let feed = PriceFeed::new(&aggregator, Duration::from_secs(10));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(feed.price().map(|q| q.price), Some(1.0));
        assert!(feed.error().is_none());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(feed.price().map(|q| q.price), Some(1.0));
        assert!(feed.error().unwrap().contains("HTTP 503"));

        sleep(Duration::from_secs(10)).await;
        assert_eq!(feed.price().map(|q| q.price), Some(2.0));
        assert!(feed.error().is_none());
    }
}
