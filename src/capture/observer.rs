//! Observer interface for path feedback and dispatch results

use crate::capture::types::SampledPoint;
use crate::dispatch::DispatchError;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

/// Terminal result of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum DispatchResult {
    /// Gesture written to local storage
    Stored(PathBuf),
    /// Backend answered with this text
    Sent(String),
    /// Dispatch failed; the gesture is gone
    Failed(DispatchError),
}

impl DispatchResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, DispatchResult::Failed(_))
    }

    /// Text suitable for the response label on screen.
    pub fn display_text(&self) -> String {
        match self {
            DispatchResult::Stored(path) => format!("Saved to {}", path.display()),
            DispatchResult::Sent(text) => text.clone(),
            DispatchResult::Failed(e) => format!("Error: {}", e),
        }
    }
}

/// A dispatch result together with the bookkeeping needed to order it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub dispatch_id: Uuid,
    /// Increases by one for every dispatch issued by a capture component
    pub sequence: u64,
    pub destination: String,
    pub result: DispatchResult,
    pub elapsed_ms: f64,
}

/// Receives path snapshots while drawing and one outcome per dispatch.
///
/// `on_result` may be called from a runtime worker thread after the
/// originating gesture has been cleared.
pub trait PathObserver: Send + Sync + 'static {
    fn on_update(&self, points: &[SampledPoint]);

    fn on_result(&self, outcome: DispatchOutcome);
}
