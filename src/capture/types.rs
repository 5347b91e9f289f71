use serde::{Deserialize, Serialize};

/// One sampled position along a gesture path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledPoint {
    pub x: f64,
    pub y: f64,
    /// Monotonic capture time in milliseconds
    pub captured_at_ms: f64,
}

impl SampledPoint {
    pub fn new(x: f64, y: f64, captured_at_ms: f64) -> Self {
        Self { x, y, captured_at_ms }
    }
}

/// A single touch contact reported by the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

impl PointerPhase {
    /// Whether this phase terminates the gesture.
    pub fn is_terminal(self) -> bool {
        matches!(self, PointerPhase::Up | PointerPhase::Cancel)
    }
}

impl std::fmt::Display for PointerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointerPhase::Down => write!(f, "down"),
            PointerPhase::Move => write!(f, "move"),
            PointerPhase::Up => write!(f, "up"),
            PointerPhase::Cancel => write!(f, "cancel"),
        }
    }
}

/// A pointer event as delivered by the UI runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub contacts: Vec<Contact>,
    pub timestamp_ms: f64,
    /// Host-assigned delivery order. Events that arrive behind a higher
    /// sequence are stale and get dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, contacts: Vec<Contact>, timestamp_ms: f64) -> Self {
        Self {
            phase,
            contacts,
            timestamp_ms,
            sequence: None,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Convenience constructor for a one-finger event.
    pub fn single(phase: PointerPhase, x: f64, y: f64, timestamp_ms: f64) -> Self {
        Self::new(phase, vec![Contact { id: 0, x, y }], timestamp_ms)
    }

    /// Flatten every contact into sampled points stamped with the event time.
    ///
    /// Contacts are not tracked separately: points from several fingers end
    /// up interleaved in the order the host reported them.
    pub fn sample(&self) -> Vec<SampledPoint> {
        self.contacts
            .iter()
            .map(|c| SampledPoint::new(c.x, c.y, self.timestamp_ms))
            .collect()
    }
}
