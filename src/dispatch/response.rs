//! Last-write-wins response display

use crate::capture::observer::{DispatchOutcome, DispatchResult};
use crate::dispatch::DispatchError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex as ParkingMutex;
use serde::Serialize;

/// What the response label currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEntry {
    pub text: String,
    pub sequence: u64,
    pub destination: String,
    pub is_error: bool,
    pub received_at: DateTime<Utc>,
}

/// Holds the response text shown to the user.
///
/// Outcomes are recorded in arrival order and the latest arrival wins, even
/// if it belongs to an older gesture. The one exception is a cancellation:
/// it never replaces the response of a newer dispatch.
#[derive(Debug, Default)]
pub struct ResponseBoard {
    current: ParkingMutex<Option<ResponseEntry>>,
}

impl ResponseBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &DispatchOutcome) {
        let entry = ResponseEntry {
            text: outcome.result.display_text(),
            sequence: outcome.sequence,
            destination: outcome.destination.clone(),
            is_error: outcome.result.is_failure(),
            received_at: Utc::now(),
        };

        let cancelled = matches!(outcome.result, DispatchResult::Failed(DispatchError::Cancelled));

        let mut current = self.current.lock();
        if let Some(prev) = current.as_ref() {
            if cancelled && prev.sequence >= entry.sequence {
                tracing::debug!(
                    "Keeping response for dispatch #{} over cancelled dispatch #{}",
                    prev.sequence,
                    entry.sequence
                );
                return;
            }
            if prev.sequence > entry.sequence {
                tracing::debug!(
                    "Response for dispatch #{} replaces newer dispatch #{}",
                    entry.sequence,
                    prev.sequence
                );
            }
        }
        *current = Some(entry);
    }

    pub fn current(&self) -> Option<ResponseEntry> {
        self.current.lock().clone()
    }

    /// Current text, or an empty string before the first response.
    pub fn text(&self) -> String {
        self.current
            .lock()
            .as_ref()
            .map(|e| e.text.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        *self.current.lock() = None;
    }
}
