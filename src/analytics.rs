//! Analytics port - best-effort conversion tracking
//!
//! In the browser, `gtag`/`fbq` are called only when those globals exist.
//! Here the tracker is an injected port: components call it unconditionally
//! and the wiring decides whether anything listens. Tracking is fire-and-forget;
//! failure to track never affects UI state.

use std::sync::Mutex;

/// Event tracking port. Implementations must never block or fail loudly.
pub trait Analytics: Send + Sync {
    fn track(&self, event: &str, category: &str, label: &str);
}

/// Default implementation when no tracker is configured
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn track(&self, _event: &str, _category: &str, _label: &str) {}
}

/// Tracker that emits tracing events, used by the demo session
pub struct TraceAnalytics;

impl Analytics for TraceAnalytics {
    fn track(&self, event: &str, category: &str, label: &str) {
        tracing::info!(event, category, label, "analytics");
    }
}

/// Recording tracker for tests
#[derive(Default)]
pub struct RecordingAnalytics {
    pub events: Mutex<Vec<String>>,
}

impl Analytics for RecordingAnalytics {
    fn track(&self, event: &str, _category: &str, _label: &str) {
        self.events.lock().unwrap().push(event.to_string());
    }
}
