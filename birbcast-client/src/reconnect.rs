use std::time::Duration;
use tokio::time::Instant;

/// How a channel re-establishes itself after its transport drops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub initial_delay: Duration,
    pub multiplier: f32,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            initial_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Same delay before every attempt, retried indefinitely.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            enabled: true,
            initial_delay: delay,
            multiplier: 1.0,
            max_delay: delay,
        }
    }

    pub fn exponential(initial_delay: Duration, multiplier: f32, max_delay: Duration) -> Self {
        Self {
            enabled: true,
            initial_delay,
            multiplier,
            max_delay,
        }
    }

    /// Presence: every 5 seconds, forever.
    pub fn presence_default() -> Self {
        Self::fixed(Duration::from_secs(5))
    }

    pub fn chat_default() -> Self {
        Self::exponential(Duration::from_secs(1), 2.0, Duration::from_secs(30))
    }

    pub fn delayer(&self) -> BackoffDelayer {
        BackoffDelayer::new(self.initial_delay, self.multiplier, self.max_delay)
    }
}

/// Hands out delays growing by `multiplier` per call, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct BackoffDelayer {
    starting_delay: Duration,
    current_delay: Duration,
    max_delay: Duration,
    multiplier: f32,
}

impl BackoffDelayer {
    pub fn new(starting_delay: Duration, multiplier: f32, max_delay: Duration) -> Self {
        Self {
            starting_delay,
            current_delay: starting_delay,
            max_delay,
            multiplier,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        if self.current_delay >= self.max_delay {
            return self.max_delay;
        }

        let delay = self.current_delay;
        self.current_delay = self.current_delay.mul_f32(self.multiplier.max(1.0));
        delay
    }

    /// Called once a connection is established again.
    pub fn reset(&mut self) {
        self.current_delay = self.starting_delay;
    }
}

/// Resolves at `deadline`, or never when there is none.
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
