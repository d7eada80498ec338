//! Shared utility functions

use std::time::{Duration, Instant};

/// Coalesces rapid repeated events into a single handling call after a quiet
/// interval.
///
/// Pure state over injected instants so component loops can drive it from
/// `tokio::select!` and tests can drive it with synthetic clocks.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_event: None,
        }
    }

    /// Record an event at `now`. The pending work should fire once `ready()`
    /// reports true with no newer event in between.
    pub fn record(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    /// True when the quiet interval has elapsed since the last recorded event.
    pub fn ready(&self, now: Instant) -> bool {
        match self.last_event {
            Some(last) => now.duration_since(last) >= self.window,
            None => false,
        }
    }

    /// Clear pending state after the coalesced work has run.
    pub fn reset(&mut self) {
        self.last_event = None;
    }

    /// True when an event is waiting out its quiet interval.
    pub fn pending(&self) -> bool {
        self.last_event.is_some()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Axis-aligned rectangle in viewport coordinates.
#[allow(dead_code)] // Page-geometry helpers pending a real browser bridge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

/// Visible window onto the page.
#[allow(dead_code)] // Page-geometry helpers pending a real browser bridge
#[derive(Debug, Clone, Copy)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

/// Check whether a rectangle is fully inside the viewport.
///
/// Part of the page-geometry helper API a browser bridge would drive its
/// intersection reports from; the demo script emits ratios directly.
#[allow(dead_code)]
pub fn is_in_viewport(rect: Rect, viewport: ViewportSize) -> bool {
    rect.top >= 0.0
        && rect.left >= 0.0
        && rect.bottom <= viewport.height
        && rect.right <= viewport.width
}

/// Strip everything but digits from a phone number (WhatsApp link format).
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Generate a unique id for notices and submissions.
pub fn generate_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);

    COUNTER.fetch_add(1, Ordering::SeqCst)
}
