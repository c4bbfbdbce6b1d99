// src/scanner/debounce.rs
use std::{collections::HashMap, time::Duration};
use tokio::time::Instant;

/// Suppresses a payload seen again before its window has elapsed.
///
/// Each admitted payload gets an expiry of `admitted_at + window`; repeats
/// inside the window do not extend it.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    seen: HashMap<String, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            seen: HashMap::new(),
        }
    }

    /// True if `payload` should be forwarded.
    pub fn admit(&mut self, payload: &str, now: Instant) -> bool {
        self.seen.retain(|_, expires_at| *expires_at > now);
        if self.seen.contains_key(payload) {
            return false;
        }
        self.seen.insert(payload.to_string(), now + self.window);
        true
    }
}
