//! Capture-related Tauri commands

use crate::capture::{CaptureState, DispatchOutcome, GesturePathCapture, PathObserver, PointerEvent, SampledPoint};
use crate::config::{AppConfig, CaptureConfig, Screen};
use crate::dispatch::{HttpTransport, ResponseBoard, ResponseEntry};
use anyhow::Context;
use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};

pub const EVENT_PATH_UPDATED: &str = "path-updated";
pub const EVENT_DISPATCH_FINISHED: &str = "dispatch-finished";

/// Forwards capture feedback to the webview.
pub struct WebviewObserver {
    app: AppHandle,
    board: Arc<ResponseBoard>,
}

impl PathObserver for WebviewObserver {
    fn on_update(&self, points: &[SampledPoint]) {
        if let Err(e) = self.app.emit(EVENT_PATH_UPDATED, points) {
            tracing::warn!("Failed to emit path update: {}", e);
        }
    }

    fn on_result(&self, outcome: DispatchOutcome) {
        self.board.record(&outcome);
        if let Err(e) = self.app.emit(EVENT_DISPATCH_FINISHED, &outcome) {
            tracing::warn!("Failed to emit dispatch result: {}", e);
        }
    }
}

type ScreenCapture = GesturePathCapture<WebviewObserver, HttpTransport>;

/// Application state for the open screen
pub struct SessionState {
    pub config: AppConfig,
    pub transport: Arc<HttpTransport>,
    pub board: Arc<ResponseBoard>,
    capture: ParkingMutex<Option<ScreenCapture>>,
}

impl SessionState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(config.request_timeout()).context("Failed to build HTTP client")?;
        Ok(Self {
            config,
            transport: Arc::new(transport),
            board: Arc::new(ResponseBoard::new()),
            capture: ParkingMutex::new(None),
        })
    }

    fn with_capture<R>(&self, f: impl FnOnce(&mut ScreenCapture) -> R) -> Result<R, String> {
        let mut capture = self.capture.lock();
        let capture = capture.as_mut().ok_or_else(|| "No screen open".to_string())?;
        Ok(f(capture))
    }
}

/// Open a screen; replaces any capture left over from the previous one
#[tauri::command]
pub async fn open_screen(
    app: AppHandle,
    state: State<'_, SessionState>,
    screen: Screen,
    sign: String,
) -> Result<CaptureConfig, String> {
    let config = state
        .config
        .capture_config(screen, &sign)
        .map_err(|e| e.to_string())?;

    let observer = Arc::new(WebviewObserver {
        app,
        board: state.board.clone(),
    });
    let capture = GesturePathCapture::new(config.clone(), observer, state.transport.clone());

    let previous = state.capture.lock().replace(capture);
    if let Some(mut previous) = previous {
        // Reports a cancelled outcome per upload; the board is reset below
        previous.cancel_in_flight();
    }
    state.board.clear();

    tracing::info!("Opened {:?} screen for {}", screen, sign);
    Ok(config)
}

/// Feed one pointer event from the drawing surface
#[tauri::command]
pub async fn pointer_event(
    state: State<'_, SessionState>,
    event: PointerEvent,
    armed: bool,
) -> Result<CaptureState, String> {
    state.with_capture(|capture| capture.handle(&event, armed))
}

/// Stop capturing right away, discarding an unfinished stroke
#[tauri::command]
pub async fn disarm(state: State<'_, SessionState>) -> Result<CaptureState, String> {
    state.with_capture(|capture| capture.disarm())
}

/// Send everything drawn so far, optionally under a sample file name
#[tauri::command]
pub async fn flush_sketch(
    state: State<'_, SessionState>,
    filename: Option<String>,
) -> Result<bool, String> {
    state
        .with_capture(|capture| capture.flush(filename.as_deref()))?
        .map(|handle| handle.is_some())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn clear_sketch(state: State<'_, SessionState>) -> Result<(), String> {
    state.with_capture(|capture| capture.clear_sketch())
}

/// Abort uploads that have not answered yet
#[tauri::command]
pub async fn cancel_dispatches(state: State<'_, SessionState>) -> Result<(), String> {
    state.with_capture(|capture| capture.cancel_in_flight())
}

/// Get the response text currently shown
#[tauri::command]
pub async fn get_response(state: State<'_, SessionState>) -> Result<Option<ResponseEntry>, String> {
    Ok(state.board.current())
}

#[tauri::command]
pub async fn list_signs(state: State<'_, SessionState>) -> Result<Vec<String>, String> {
    Ok(state.config.signs.clone())
}
