//! Dispatch of finished gestures
//!
//! A dispatch is the single terminal action taken for a gesture: write it to
//! local storage, or upload it (as JSON or as a rendered PNG) to the
//! recognition backend. Uploads run on the ambient tokio runtime and report
//! back through the observer; the capture buffer is never touched by them.

pub mod error;
pub mod payload;
pub mod response;
pub mod storage;
pub mod transport;

pub use error::DispatchError;
pub use response::{ResponseBoard, ResponseEntry};
pub use transport::{HttpTransport, OutboundRequest, Transport};

use crate::capture::observer::{DispatchOutcome, DispatchResult, PathObserver};
use crate::capture::types::SampledPoint;
use crate::config::CaptureConfig;
use crate::processing::raster;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Where a finished gesture goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchMode {
    Store,
    Transmit,
}

/// Body format for transmit mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadFormat {
    #[default]
    Json,
    Png,
}

/// Header that carries the destination label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelHeader {
    /// Sign the backend should recognise
    #[default]
    Sign,
    /// Name under which a training sample is saved
    Filename,
}

impl LabelHeader {
    pub fn header_name(self) -> &'static str {
        match self {
            LabelHeader::Sign => "Sign",
            LabelHeader::Filename => "Filename",
        }
    }
}

impl std::fmt::Display for LabelHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.header_name())
    }
}

/// When a dispatch happens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchTrigger {
    /// Every finished gesture is dispatched on its own
    #[default]
    GestureEnd,
    /// Strokes accumulate until the caller flushes them
    Manual,
}

/// What happens to uploads still in flight when a new one starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InFlightPolicy {
    /// Abort older uploads; each reports `DispatchError::Cancelled`
    #[default]
    CancelPrevious,
    /// Let every upload finish; the last response to arrive is shown
    LastWriteWins,
}

/// Handle to one in-flight upload.
///
/// Cancel it through `Dispatcher::cancel` (or the capture component) so the
/// cancellation is reported to the observer.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    pub id: Uuid,
    pub sequence: u64,
    abort: AbortHandle,
}

impl DispatchHandle {
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// An upload the dispatcher still owes an outcome for.
struct InFlight {
    handle: DispatchHandle,
    destination: String,
    started: Instant,
    /// Set by whichever side reports first: the upload task or a cancel
    settled: Arc<AtomicBool>,
}

/// Performs dispatches for one capture component.
///
/// Every dispatch produces exactly one outcome, including uploads that are
/// cancelled before they settle.
pub struct Dispatcher<O: PathObserver, T: Transport> {
    observer: Arc<O>,
    transport: Arc<T>,
    sequence: u64,
    in_flight: Vec<InFlight>,
}

impl<O: PathObserver, T: Transport> Dispatcher<O, T> {
    pub fn new(observer: Arc<O>, transport: Arc<T>) -> Self {
        Self {
            observer,
            transport,
            sequence: 0,
            in_flight: Vec::new(),
        }
    }

    /// Dispatch `points` according to `config`, labelled with `label`.
    ///
    /// Everything the upload needs is copied out before this returns, so the
    /// caller may clear its buffer immediately. Returns a handle only when an
    /// upload was actually started.
    pub fn dispatch(
        &mut self,
        points: &[SampledPoint],
        config: &CaptureConfig,
        label: &str,
    ) -> Option<DispatchHandle> {
        self.sequence += 1;
        let id = Uuid::new_v4();
        let sequence = self.sequence;
        let started = Instant::now();

        tracing::debug!(
            "Dispatch #{} ({:?}, {} points, label={})",
            sequence,
            config.mode,
            points.len(),
            label
        );

        match config.mode {
            DispatchMode::Store => {
                let result = match store(points, &config.storage_dir) {
                    Ok(path) => DispatchResult::Stored(path),
                    Err(e) => {
                        tracing::warn!("Failed to store gesture: {}", e);
                        DispatchResult::Failed(e)
                    }
                };
                self.report(id, sequence, label, result, started);
                None
            }
            DispatchMode::Transmit => {
                let request = match build_request(points, config, label) {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::warn!("Failed to encode gesture: {}", e);
                        self.report(id, sequence, label, DispatchResult::Failed(e), started);
                        return None;
                    }
                };
                self.spawn_upload(id, sequence, request, config.in_flight, started)
            }
        }
    }

    fn spawn_upload(
        &mut self,
        id: Uuid,
        sequence: u64,
        request: OutboundRequest,
        policy: InFlightPolicy,
        started: Instant,
    ) -> Option<DispatchHandle> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                let error = DispatchError::Transport(format!("no async runtime available: {}", e));
                self.report(id, sequence, &request.label, DispatchResult::Failed(error), started);
                return None;
            }
        };

        if policy == InFlightPolicy::CancelPrevious {
            self.cancel_all();
        }

        let observer = Arc::clone(&self.observer);
        let transport = Arc::clone(&self.transport);
        let destination = request.label.clone();
        let endpoint = request.endpoint.clone();
        let settled = Arc::new(AtomicBool::new(false));
        let task_settled = Arc::clone(&settled);
        let task_destination = destination.clone();

        let task = runtime.spawn(async move {
            let result = match transport.post(request).await {
                Ok(text) => DispatchResult::Sent(text),
                Err(e) => DispatchResult::Failed(e),
            };
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            match &result {
                DispatchResult::Failed(e) => {
                    tracing::warn!("Dispatch #{} to {} failed after {:.1}ms: {}", sequence, endpoint, elapsed_ms, e)
                }
                _ => tracing::info!("Dispatch #{} to {} answered in {:.1}ms", sequence, endpoint, elapsed_ms),
            }

            if task_settled.swap(true, Ordering::SeqCst) {
                // Already reported as cancelled
                return;
            }
            observer.on_result(DispatchOutcome {
                dispatch_id: id,
                sequence,
                destination: task_destination,
                result,
                elapsed_ms,
            });
        });

        let handle = DispatchHandle {
            id,
            sequence,
            abort: task.abort_handle(),
        };
        self.in_flight.retain(|f| !f.settled.load(Ordering::SeqCst));
        self.in_flight.push(InFlight {
            handle: handle.clone(),
            destination,
            started,
            settled,
        });
        Some(handle)
    }

    fn report(&self, id: Uuid, sequence: u64, label: &str, result: DispatchResult, started: Instant) {
        self.observer.on_result(DispatchOutcome {
            dispatch_id: id,
            sequence,
            destination: label.to_string(),
            result,
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        });
    }

    /// Abort every upload that has not settled yet.
    pub fn cancel_all(&mut self) {
        let pending: Vec<InFlight> = self.in_flight.drain(..).collect();
        for upload in pending {
            self.abort(upload);
        }
    }

    /// Abort one upload. Returns false if it had already settled or is unknown.
    pub fn cancel(&mut self, id: Uuid) -> bool {
        match self.in_flight.iter().position(|f| f.handle.id == id) {
            Some(i) => {
                let upload = self.in_flight.remove(i);
                self.abort(upload)
            }
            None => false,
        }
    }

    fn abort(&self, upload: InFlight) -> bool {
        if upload.settled.swap(true, Ordering::SeqCst) {
            return false;
        }
        upload.handle.abort.abort();
        tracing::debug!("Cancelled in-flight dispatch #{}", upload.handle.sequence);
        self.report(
            upload.handle.id,
            upload.handle.sequence,
            &upload.destination,
            DispatchResult::Failed(DispatchError::Cancelled),
            upload.started,
        );
        true
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
            .iter()
            .filter(|f| !f.settled.load(Ordering::SeqCst))
            .count()
    }

    /// Number of dispatches issued so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

fn store(points: &[SampledPoint], dir: &std::path::Path) -> error::Result<PathBuf> {
    let data = payload::encode_points(points)?;
    storage::write_touch_data(dir, &data)
}

fn build_request(points: &[SampledPoint], config: &CaptureConfig, label: &str) -> error::Result<OutboundRequest> {
    let (content_type, body) = match config.payload {
        PayloadFormat::Json => (transport::CONTENT_TYPE_JSON, payload::encode_points(points)?),
        PayloadFormat::Png => (transport::CONTENT_TYPE_PNG, raster::snapshot_png(points, config.canvas)?),
    };

    Ok(OutboundRequest {
        endpoint: config.endpoint.clone(),
        label_header: config.label_header,
        label: label.to_string(),
        content_type,
        body,
    })
}
