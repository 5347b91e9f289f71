//! Tauri command handlers
//!
//! IPC entry points the webview calls while a screen is open: pointer
//! events, arming, sketch flushing and template lookup.

pub mod capture;
pub mod template;
