//! Touch-path capture
//!
//! Turns a continuous pointer gesture into a discrete, ordered point
//! sequence and hands each finished gesture to the dispatcher.

pub mod gesture;
pub mod observer;
pub mod state;
pub mod types;

pub use gesture::GesturePathCapture;
pub use observer::{DispatchOutcome, DispatchResult, PathObserver};
pub use state::CaptureState;
pub use types::{Contact, PointerEvent, PointerPhase, SampledPoint};
