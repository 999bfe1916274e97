//! Cancellable polling timers
//!
//! A [`PollingSession`] owns one recurring timer task. Every tick spawns an
//! independent fetch; ticks are neither queued nor coalesced, so a slow fetch
//! may overlap the next one. Cancelling the session (or dropping it) stops the
//! timer and aborts the fetches it spawned.

use crate::constants::MIN_POLL_INTERVAL_MS;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

/// Handle given to every tick, used to check the session is still live
/// before publishing a result
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    active: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// A running polling timer; stopped on [`cancel`](Self::cancel) or drop
#[derive(Debug)]
pub struct PollingSession {
    handle: SessionHandle,
    timer: JoinHandle<()>,
}

impl PollingSession {
    /// Starts a timer firing every `period`
    ///
    /// With `immediate` the first tick fires right away, otherwise after one
    /// period. Periods below `MIN_POLL_INTERVAL_MS` are raised to it. Must be
    /// called from within a Tokio runtime.
    pub fn start<F, Fut>(label: &'static str, period: Duration, immediate: bool, tick: F) -> Self
    where
        F: Fn(SessionHandle) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(MIN_POLL_INTERVAL_MS));
        let handle = SessionHandle {
            id: Uuid::new_v4(),
            active: Arc::new(AtomicBool::new(true)),
        };

        tracing::info!(
            session_id = %handle.id,
            label,
            period_ms = period.as_millis() as u64,
            "Starting polling session"
        );

        let session = handle.clone();
        let timer = tokio::spawn(async move {
            let start = if immediate {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // Owned here so aborting the timer aborts in-flight ticks
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        in_flight.spawn(tick(session.clone()));
                    }
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(e) = joined {
                            if e.is_panic() {
                                tracing::error!(session_id = %session.id, label, "Polling tick panicked");
                            }
                        }
                    }
                }
            }
        });

        Self { handle, timer }
    }

    pub fn id(&self) -> Uuid {
        self.handle.id
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    /// Stops the timer; idempotent
    pub fn cancel(&self) {
        if self.handle.active.swap(false, Ordering::AcqRel) {
            tracing::info!(session_id = %self.handle.id, "Stopping polling session");
        }
        self.timer.abort();
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counting(count: Arc<AtomicUsize>) -> impl Fn(SessionHandle) -> futures::future::Ready<()> {
        move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_session_ticks_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let session = PollingSession::start(
            "test",
            Duration::from_secs(10),
            true,
            counting(count.clone()),
        );

        sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        session.cancel();
        assert!(!session.is_active());
        sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_session_waits_one_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let session = PollingSession::start(
            "test",
            Duration::from_secs(10),
            false,
            counting(count.clone()),
        );

        sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        drop(session);
        sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ticks_overlap() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (r, p) = (running.clone(), peak.clone());

        let _session = PollingSession::start("test", Duration::from_secs(1), true, move |_| {
            let (running, peak) = (r.clone(), p.clone());
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(3500)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }
        });

        sleep(Duration::from_secs(10)).await;
        assert!(peak.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiny_periods_are_raised() {
        let count = Arc::new(AtomicUsize::new(0));
        let _session =
            PollingSession::start("test", Duration::ZERO, true, counting(count.clone()));

        sleep(Duration::from_millis(MIN_POLL_INTERVAL_MS * 5 + 50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }
}
