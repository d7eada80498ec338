// Events that flow from the page (or the demo script standing in for it) to
// the interaction components
//
// Each component consumes the subset of events it cares about from its own
// channel. Using an enum allows pattern matching and keeps the communication
// between tasks type-safe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Main event type that flows through the interaction layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")] // Creates JSON like {"type": "scroll", ...}
#[serde(rename_all = "snake_case")]
pub enum PageEvent {
    /// The page scrolled to a new vertical position
    Scroll {
        timestamp: DateTime<Utc>,
        position: f64,
    },

    /// An observed element crossed an intersection ratio with the viewport
    Intersection {
        timestamp: DateTime<Utc>,
        element_id: String,
        ratio: f64,
    },

    /// A form's submit button was activated
    Submit {
        timestamp: DateTime<Utc>,
        form_id: String,
    },

    /// The user edited a field (clears that field's validation errors)
    FieldInput {
        timestamp: DateTime<Utc>,
        form_id: String,
        field: String,
        value: String,
    },

    /// An interest-area selector changed value
    InterestSelected {
        timestamp: DateTime<Utc>,
        value: String,
    },

    /// The theme toggle was clicked
    ThemeToggled { timestamp: DateTime<Utc> },

    /// The floating WhatsApp button was clicked
    WhatsAppClicked { timestamp: DateTime<Utc> },
}

impl PageEvent {
    pub fn scroll(position: f64) -> Self {
        PageEvent::Scroll {
            timestamp: Utc::now(),
            position,
        }
    }

    pub fn intersection(element_id: impl Into<String>, ratio: f64) -> Self {
        PageEvent::Intersection {
            timestamp: Utc::now(),
            element_id: element_id.into(),
            ratio,
        }
    }

    pub fn submit(form_id: impl Into<String>) -> Self {
        PageEvent::Submit {
            timestamp: Utc::now(),
            form_id: form_id.into(),
        }
    }

    pub fn field_input(
        form_id: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        PageEvent::FieldInput {
            timestamp: Utc::now(),
            form_id: form_id.into(),
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Summary statistics for a session, logged at shutdown
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub scroll_ticks: usize,
    pub reveals_fired: usize,
    pub counters_completed: usize,
    pub submissions_attempted: usize,
    pub submissions_succeeded: usize,
    pub submissions_rejected: usize,
}

impl SessionStats {
    pub fn success_rate(&self) -> f64 {
        if self.submissions_attempted == 0 {
            0.0
        } else {
            (self.submissions_succeeded as f64 / self.submissions_attempted as f64) * 100.0
        }
    }
}
