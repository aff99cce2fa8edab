//! Single-slot refresh timer.
//!
//! At most one timer task is live per scheduler. Arming replaces (and aborts)
//! the pending one; every timer carries a sequence number so a timer that lost
//! a race with `arm`/`cancel` never runs its callback.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Armed,
    Firing,
}

enum Slot {
    Idle,
    Armed {
        seq: u64,
        deadline: Instant,
        handle: AbortHandle,
    },
    Firing {
        seq: u64,
    },
}

struct Timers {
    slot: Slot,
    next_seq: u64,
}

pub struct RefreshScheduler {
    timers: Arc<Mutex<Timers>>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timers: Arc::new(Mutex::new(Timers {
                slot: Slot::Idle,
                next_seq: 0,
            })),
        }
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        match lock(&self.timers).slot {
            Slot::Idle => SchedulerState::Idle,
            Slot::Armed { .. } => SchedulerState::Armed,
            Slot::Firing { .. } => SchedulerState::Firing,
        }
    }

    /// Deadline of the pending timer, if one is armed.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match lock(&self.timers).slot {
            Slot::Armed { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    /// Schedule `on_fire` at `deadline`, replacing any pending timer.
    ///
    /// A callback that is already running is left alone; it may call `arm`
    /// itself to schedule the next cycle. Must be called from within a tokio
    /// runtime.
    pub fn arm<F, Fut>(&self, deadline: Instant, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), AuthError>> + Send + 'static,
    {
        let mut timers = lock(&self.timers);
        if let Slot::Armed { handle, .. } = &timers.slot {
            handle.abort();
        }
        timers.next_seq += 1;
        let seq = timers.next_seq;

        // The slot lock is held until the handle is stored, so the timer task
        // cannot observe the slot before it names this sequence number.
        let shared = Arc::clone(&self.timers);
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            fire(&shared, seq, on_fire).await;
        });
        timers.slot = Slot::Armed {
            seq,
            deadline,
            handle: task.abort_handle(),
        };
        tracing::trace!(seq, "refresh timer armed");
    }

    /// Drop the pending timer. No-op when idle.
    pub fn cancel(&self) {
        let mut timers = lock(&self.timers);
        match std::mem::replace(&mut timers.slot, Slot::Idle) {
            Slot::Armed { seq, handle, .. } => {
                handle.abort();
                tracing::trace!(seq, "refresh timer cancelled");
            }
            Slot::Firing { seq } => {
                tracing::trace!(seq, "refresh timer released while firing");
            }
            Slot::Idle => {}
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Slot::Armed { handle, .. } = &lock(&self.timers).slot {
            handle.abort();
        }
    }
}

async fn fire<F, Fut>(timers: &Mutex<Timers>, seq: u64, on_fire: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), AuthError>> + Send + 'static,
{
    {
        let mut guard = lock(timers);
        match guard.slot {
            Slot::Armed { seq: live, .. } if live == seq => {}
            _ => return,
        }
        guard.slot = Slot::Firing { seq };
    }

    tracing::debug!(seq, "refresh timer fired");
    // Run in a nested task so a panicking callback still lets the slot settle.
    match tokio::spawn(async move { on_fire().await }).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => tracing::warn!(%error, seq, "scheduled refresh failed"),
        Err(error) => tracing::error!(%error, seq, "scheduled refresh panicked"),
    }

    let mut guard = lock(timers);
    if matches!(guard.slot, Slot::Firing { seq: live } if live == seq) {
        guard.slot = Slot::Idle;
    }
}

/// Time to wait before refreshing a token that expires at `expiration`.
///
/// `expiration - now - margin`, clamped at zero.
#[must_use]
pub fn delay_until(expiration: DateTime<Utc>, now: DateTime<Utc>, margin: Duration) -> Duration {
    let Ok(margin) = TimeDelta::from_std(margin) else {
        return Duration::ZERO;
    };
    (expiration - now)
        .checked_sub(&margin)
        .and_then(|delay| delay.to_std().ok())
        .unwrap_or(Duration::ZERO)
}

fn lock(timers: &Mutex<Timers>) -> MutexGuard<'_, Timers> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn bump(
        count: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::future::Ready<Result<(), AuthError>> + Send + 'static {
        let count = Arc::clone(count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    #[test]
    fn delay_subtracts_margin() {
        let now = Utc::now();
        let delay = delay_until(now + TimeDelta::seconds(3600), now, Duration::from_secs(2));
        assert_eq!(delay, Duration::from_secs(3598));
    }

    #[test]
    fn delay_clamps_to_zero() {
        let now = Utc::now();
        assert_eq!(
            delay_until(now + TimeDelta::seconds(1), now, Duration::from_secs(2)),
            Duration::ZERO
        );
        assert_eq!(
            delay_until(now - TimeDelta::seconds(60), now, Duration::ZERO),
            Duration::ZERO
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_at_deadline_then_idles() {
        let scheduler = RefreshScheduler::new();
        let fired = counter();
        scheduler.arm(Instant::now() + Duration::from_secs(10), bump(&fired));
        assert_eq!(scheduler.state(), SchedulerState::Armed);

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_pending_timer() {
        let scheduler = RefreshScheduler::new();
        let first = counter();
        let second = counter();

        scheduler.arm(Instant::now() + Duration::from_secs(5), bump(&first));
        scheduler.arm(Instant::now() + Duration::from_secs(20), bump(&second));
        assert_eq!(scheduler.state(), SchedulerState::Armed);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0, "replaced timer must never fire");
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let scheduler = RefreshScheduler::new();
        let fired = counter();
        scheduler.arm(Instant::now() + Duration::from_secs(5), bump(&fired));

        scheduler.cancel();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.deadline().is_none());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_when_idle_is_noop() {
        let scheduler = RefreshScheduler::new();
        scheduler.cancel();
        scheduler.cancel();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn past_deadline_fires_immediately() {
        let scheduler = RefreshScheduler::new();
        let fired = counter();
        scheduler.arm(Instant::now(), bump(&fired));

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_callback_returns_to_idle() {
        let scheduler = RefreshScheduler::new();
        scheduler.arm(Instant::now() + Duration::from_secs(1), || async {
            Err(AuthError::Network("connection refused".into()))
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_callback_returns_to_idle() {
        let scheduler = RefreshScheduler::new();
        scheduler.arm(
            Instant::now() + Duration::from_secs(1),
            || -> std::future::Ready<Result<(), AuthError>> { panic!("refresh blew up") },
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn callback_can_rearm_itself() {
        let scheduler = Arc::new(RefreshScheduler::new());
        let fired = counter();

        let inner_scheduler = Arc::clone(&scheduler);
        let inner_fired = Arc::clone(&fired);
        scheduler.arm(Instant::now() + Duration::from_secs(1), move || async move {
            inner_fired.fetch_add(1, Ordering::SeqCst);
            inner_scheduler.arm(
                Instant::now() + Duration::from_secs(100),
                || async { Ok(()) },
            );
            Ok(())
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Armed);
        let remaining = scheduler.deadline().expect("re-armed") - Instant::now();
        assert!(remaining > Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_scheduler_aborts_timer() {
        let fired = counter();
        {
            let scheduler = RefreshScheduler::new();
            scheduler.arm(Instant::now() + Duration::from_secs(1), bump(&fired));
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
