//! Exponential backoff around reads whose result may be transiently absent.

use std::future::Future;
use std::time::Duration;

use feedline_types::BackoffConfig;
use rand::Rng;
use tokio::sync::watch;

/// Add up to `jitter_percent` of random jitter to a delay in milliseconds.
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, (base_ms.saturating_mul(u64::from(jitter_percent))) / 100)
    };
    let mut rng = rand::rng();
    base_ms.saturating_add(rng.random_range(0..jitter_range))
}

fn jittered(delay: Duration, jitter_percent: u8) -> Duration {
    if jitter_percent == 0 {
        return delay;
    }
    let base_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(jitter_wait(base_ms, u32::from(jitter_percent)))
}

/// Resolves to `true` once shutdown is requested; `false` if the sender is gone.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) -> bool {
    shutdown.wait_for(|stop| *stop).await.is_ok()
}

/// Call `op` until it yields a value, backing off exponentially between calls.
///
/// The first call happens immediately. After an absent result, retry `n`
/// (1-based, up to `cfg.max_attempts`) waits `cfg.delay_for(n)` plus jitter.
/// Returns `None` once every retry came back empty, or as soon as `shutdown`
/// flips to `true` while waiting.
///
/// Waits run on the caller's task: nothing else on that task progresses
/// until a value arrives, the retries run out or shutdown is requested.
pub async fn reliable<T, F, Fut>(
    cfg: &BackoffConfig,
    shutdown: &mut watch::Receiver<bool>,
    mut op: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    if let Some(value) = op().await {
        return Some(value);
    }
    for attempt in 1..=cfg.max_attempts {
        let delay = jittered(cfg.delay_for(attempt), cfg.jitter_percent);
        #[cfg(feature = "tracing")]
        tracing::debug!(attempt, delay_ms = delay.as_millis(), "value absent; backing off");

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        tokio::select! {
            biased;
            true = shutdown_requested(shutdown) => return None,
            () = &mut sleep => {}
        }

        if let Some(value) = op().await {
            return Some(value);
        }
    }
    #[cfg(feature = "tracing")]
    tracing::warn!(attempts = cfg.max_attempts, "retries exhausted");
    None
}
