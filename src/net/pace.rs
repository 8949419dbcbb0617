// src/net/pace.rs
//! Timing: retry backoff and the human-scale gap between targets.
use std::time::Duration;

use rand::{rngs::StdRng, Rng};

/// Sleeping seam. Real runs block the thread; tests record the durations.
pub trait Pause {
    fn pause(&mut self, d: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&mut self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Attempt cap per fetch, first try included.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    /// Upper bound (exclusive) of the uniform jitter added to each backoff.
    pub jitter: Duration,
    /// Send the last attempt with the UA-only profile.
    pub minimal_fallback: bool,
}

impl RetryPolicy {
    /// Wait before 1-based attempt `k`: nothing for the first,
    /// `backoff_base * 2^(k-1) + U[0, jitter)` after that.
    pub fn backoff<R: Rng>(&self, k: u32, rng: &mut R) -> Duration {
        if k <= 1 {
            return Duration::ZERO;
        }
        let exp = self.backoff_base.saturating_mul(1u32.checked_shl(k - 1).unwrap_or(u32::MAX));
        exp.saturating_add(uniform_below(self.jitter, rng))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DelayPolicy {
    pub base: Duration,
    pub spread: Duration,
    /// Never wait less than this between targets.
    pub floor: Duration,
}

impl DelayPolicy {
    /// `max(floor, base + U(-spread, +spread))`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let base = self.base.as_secs_f64();
        let spread = self.spread.as_secs_f64();
        let offset = if spread > 0.0 { rng.random_range(-spread..spread) } else { 0.0 };
        Duration::try_from_secs_f64((base + offset).max(0.0)).unwrap_or(Duration::MAX).max(self.floor)
    }
}

/// Enforces `DelayPolicy` between independently scheduled targets.
pub struct Pacer<P: Pause> {
    policy: DelayPolicy,
    pause: P,
    rng: StdRng,
}

impl<P: Pause> Pacer<P> {
    pub fn new(policy: DelayPolicy, pause: P, rng: StdRng) -> Self {
        Self { policy, pause, rng }
    }

    /// Sleep one sampled gap; returns what was slept.
    pub fn wait(&mut self) -> Duration {
        let d = self.policy.sample(&mut self.rng);
        logd!(secs = d.as_secs_f64(), "pacing before next target");
        self.pause.pause(d);
        d
    }
}

fn uniform_below<R: Rng>(max: Duration, rng: &mut R) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(rng.random_range(0.0..max.as_secs_f64()))
}
