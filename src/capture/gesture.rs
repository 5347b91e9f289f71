//! Touch-path capture component
//!
//! Samples a pointer gesture into an ordered point buffer while the caller's
//! armed flag is set, reports the running path to an observer, and performs
//! exactly one dispatch per finished gesture (or per manual flush).

use crate::capture::observer::PathObserver;
use crate::capture::state::{transition, CaptureState, Effect};
use crate::capture::types::{PointerEvent, PointerPhase, SampledPoint};
use crate::config::{CaptureConfig, ConfigError};
use crate::dispatch::{DispatchHandle, DispatchTrigger, Dispatcher, Transport};
use std::sync::Arc;
use uuid::Uuid;

pub struct GesturePathCapture<O: PathObserver, T: Transport> {
    config: CaptureConfig,
    state: CaptureState,
    /// Points of the gesture in progress
    buffer: Vec<SampledPoint>,
    /// Finished strokes awaiting a manual flush
    sketch: Vec<SampledPoint>,
    observer: Arc<O>,
    dispatcher: Dispatcher<O, T>,
    /// Highest event sequence applied so far
    last_sequence: Option<u64>,
}

impl<O: PathObserver, T: Transport> GesturePathCapture<O, T> {
    pub fn new(config: CaptureConfig, observer: Arc<O>, transport: Arc<T>) -> Self {
        tracing::info!(
            "Capture initialized (label={}, mode={:?}, trigger={:?})",
            config.destination_label,
            config.mode,
            config.trigger
        );

        Self {
            dispatcher: Dispatcher::new(Arc::clone(&observer), transport),
            config,
            state: CaptureState::Idle,
            buffer: Vec::new(),
            sketch: Vec::new(),
            observer,
            last_sequence: None,
        }
    }

    /// Feed one pointer event. `armed` is the caller's flag at delivery time.
    ///
    /// Sequenced events that arrive after a higher sequence are dropped.
    pub fn handle(&mut self, event: &PointerEvent, armed: bool) -> CaptureState {
        if let Some(seq) = event.sequence {
            if self.last_sequence.is_some_and(|last| seq <= last) {
                tracing::debug!("Dropping stale {} event #{}", event.phase, seq);
                return self.state;
            }
            self.last_sequence = Some(seq);
        }

        let t = transition(self.state, event.phase, armed, self.config.trigger);
        for effect in t.effects {
            self.apply(effect, event);
        }
        if t.next != self.state {
            tracing::trace!("Capture {:?} -> {:?} on {}", self.state, t.next, event.phase);
        }
        self.state = t.next;
        self.state
    }

    /// Apply a deactivation immediately instead of waiting for the next event.
    pub fn disarm(&mut self) -> CaptureState {
        let event = PointerEvent::new(PointerPhase::Cancel, Vec::new(), 0.0);
        self.handle(&event, false)
    }

    fn apply(&mut self, effect: Effect, event: &PointerEvent) {
        match effect {
            Effect::Append => self.buffer.extend(event.sample()),
            Effect::Notify => self.notify(),
            Effect::Dispatch => {
                self.dispatcher
                    .dispatch(&self.buffer, &self.config, &self.config.destination_label);
            }
            Effect::Clear => self.buffer.clear(),
            Effect::Retain => self.sketch.append(&mut self.buffer),
            Effect::Discard => {
                if !self.buffer.is_empty() {
                    tracing::debug!("Discarding {} points of an unfinished gesture", self.buffer.len());
                }
                self.buffer.clear();
            }
        }
    }

    fn notify(&self) {
        match self.config.trigger {
            DispatchTrigger::GestureEnd => self.observer.on_update(&self.buffer),
            DispatchTrigger::Manual => self.observer.on_update(&self.visible_path()),
        }
    }

    /// Every point currently drawn: retained strokes, then the live stroke.
    pub fn visible_path(&self) -> Vec<SampledPoint> {
        let mut path = Vec::with_capacity(self.sketch.len() + self.buffer.len());
        path.extend_from_slice(&self.sketch);
        path.extend_from_slice(&self.buffer);
        path
    }

    /// Dispatch the retained strokes of a manual-trigger capture.
    ///
    /// `label` replaces the configured destination label for this dispatch
    /// (a sample file name, for instance). Nothing is sent when there is
    /// nothing drawn.
    pub fn flush(&mut self, label: Option<&str>) -> Result<Option<DispatchHandle>, ConfigError> {
        if self.config.trigger != DispatchTrigger::Manual {
            tracing::warn!("Ignoring flush on a gesture-end capture");
            return Ok(None);
        }

        let label = label.unwrap_or(&self.config.destination_label).to_string();
        if label.trim().is_empty() {
            return Err(ConfigError::EmptyLabel);
        }

        if self.sketch.is_empty() {
            tracing::debug!("Nothing drawn, skipping flush");
            return Ok(None);
        }

        let handle = self.dispatcher.dispatch(&self.sketch, &self.config, &label);
        self.sketch.clear();
        self.notify();
        Ok(handle)
    }

    /// Drop every retained stroke.
    pub fn clear_sketch(&mut self) {
        self.sketch.clear();
        self.notify();
    }

    pub fn set_destination(&mut self, label: impl Into<String>) -> Result<(), ConfigError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ConfigError::EmptyLabel);
        }
        self.config.destination_label = label;
        Ok(())
    }

    /// Abort every upload still in flight. Each one reports a cancelled outcome.
    pub fn cancel_in_flight(&mut self) {
        self.dispatcher.cancel_all();
    }

    /// Abort one upload. Returns false if it already settled.
    pub fn cancel_dispatch(&mut self, id: Uuid) -> bool {
        self.dispatcher.cancel(id)
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Number of dispatches performed so far.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatcher.sequence()
    }

    pub fn buffer(&self) -> &[SampledPoint] {
        &self.buffer
    }

    pub fn sketch(&self) -> &[SampledPoint] {
        &self.sketch
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}
