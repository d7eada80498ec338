//! Error types for the interaction layer
//!
//! Validation problems are not errors here; they travel as [`FieldErrors`]
//! attached to the form. [`PageError`] covers the failures that cross a
//! component boundary: the network and the storage backend.

use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages, ordered by field name.
///
/// A `BTreeMap` keeps iteration deterministic so error rendering and log
/// output are stable across runs.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum PageError {
    /// The collaborator could not be reached or answered garbage
    #[error("network error: {0}")]
    Network(String),

    /// The storage backend refused a read or write
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl PageError {
    /// User-facing banner text for a failed submission. Deliberately vague;
    /// the precise cause goes to the logs, not the page.
    pub fn notice_message(&self) -> String {
        match self {
            PageError::Network(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            PageError::StorageUnavailable(_) => {
                "An error occurred. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_notice_suggests_retry() {
        let error = PageError::Network("connection refused".to_string());
        assert!(error.notice_message().contains("check your connection"));
        // The transport detail stays out of the banner
        assert!(!error.notice_message().contains("refused"));
    }

    #[test]
    fn test_display_carries_the_cause() {
        let error = PageError::StorageUnavailable("quota exceeded".to_string());
        assert_eq!(error.to_string(), "storage unavailable: quota exceeded");
    }
}
