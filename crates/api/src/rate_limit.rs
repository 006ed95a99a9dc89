use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window request limiter keyed by client identity.
#[derive(Debug, Clone)]
pub struct ClientRateLimiter {
    inner: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_requests: usize,
}

impl ClientRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_requests,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut guard = self.inner.lock();
        let queue = guard.entry(key.to_string()).or_default();

        while let Some(front) = queue.front() {
            if now.duration_since(*front) >= self.window {
                queue.pop_front();
            } else {
                break;
            }
        }

        if queue.len() >= self.max_requests {
            return false;
        }

        queue.push_back(now);
        true
    }

    /// Drops clients with no requests inside the current window.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let before = guard.len();
        guard.retain(|_, queue| {
            queue
                .back()
                .is_some_and(|last| now.duration_since(*last) < self.window)
        });
        before - guard.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.inner.lock().len()
    }
}
