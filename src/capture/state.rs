//! Capture state machine
//!
//! The transition is a pure function of the current state, the incoming
//! pointer phase, the caller's armed flag and the dispatch trigger. The
//! returned effects are applied in order by `GesturePathCapture`.

use crate::capture::types::PointerPhase;
use crate::dispatch::DispatchTrigger;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Append the event's points to the gesture buffer
    Append,
    /// Hand a snapshot of the visible path to the observer
    Notify,
    /// Dispatch the gesture buffer
    Dispatch,
    /// Empty the gesture buffer after dispatch
    Clear,
    /// Move the finished stroke into the sketch (manual trigger)
    Retain,
    /// Drop the in-progress stroke without dispatching
    Discard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: CaptureState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: CaptureState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }
}

pub fn transition(
    state: CaptureState,
    phase: PointerPhase,
    armed: bool,
    trigger: DispatchTrigger,
) -> Transition {
    use Effect::*;

    if !armed {
        return match state {
            CaptureState::Idle => Transition::stay(CaptureState::Idle),
            CaptureState::Capturing => Transition {
                next: CaptureState::Idle,
                effects: vec![Discard, Notify],
            },
        };
    }

    match (phase, trigger) {
        // No gesture to end
        (PointerPhase::Up | PointerPhase::Cancel, _) if state == CaptureState::Idle => {
            Transition::stay(CaptureState::Idle)
        }
        (PointerPhase::Down | PointerPhase::Move, _) => Transition {
            next: CaptureState::Capturing,
            effects: vec![Append, Notify],
        },
        (PointerPhase::Up | PointerPhase::Cancel, DispatchTrigger::GestureEnd) => Transition {
            next: CaptureState::Idle,
            effects: vec![Append, Notify, Dispatch, Clear],
        },
        (PointerPhase::Up | PointerPhase::Cancel, DispatchTrigger::Manual) => Transition {
            next: CaptureState::Idle,
            effects: vec![Append, Notify, Retain],
        },
    }
}
