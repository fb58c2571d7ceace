//! Minimum-interval pacing for outbound requests.
//!
//! AOTY has no published request budget and the Spotify Web API throttles
//! bursts, so every client enforces a small fixed gap between calls on
//! top of the pipeline's naturally sequential pacing.

use std::thread;
use std::time::{Duration, Instant};

/// Enforces a minimum interval between requests to one remote service.
pub struct RateLimiter {
    name: String,
    interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(name: &str, interval: Duration) -> Self {
        RateLimiter {
            name: name.to_string(),
            interval,
            last_request: None,
        }
    }

    /// Convenience: interval given in milliseconds.
    pub fn from_millis(name: &str, millis: u64) -> Self {
        Self::new(name, Duration::from_millis(millis))
    }

    /// Sleep out the remainder of the interval since the previous request.
    /// Call *before* issuing a request.
    pub fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                if wait > Duration::from_millis(500) {
                    println!("  [{}] pacing: waiting {:.1}s...", self.name, wait.as_secs_f64());
                }
                thread::sleep(wait);
            }
        }
        self.last_request = Some(Instant::now());
    }
}
