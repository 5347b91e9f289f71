//! DualSense - touch-path capture for sign gesture recognition.
//!
//! This is the main library crate for the DualSense application. It samples
//! finger-drag gestures into point sequences, stores them locally or sends
//! them (as JSON or as a rendered PNG) to a recognition backend, and exposes
//! all of it to the webview through Tauri commands.

pub mod capture;
#[cfg(feature = "app")]
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod processing;
pub mod template;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming an optional JSON config file
pub const ENV_CONFIG: &str = "DUALSENSE_CONFIG";

/// Install the global tracing subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dualsense=debug,dualsense_lib=debug,tauri=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Initialize the application
#[cfg(feature = "app")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::capture::SessionState;
    use config::AppConfig;
    use tauri::Manager;

    init_tracing();

    tracing::info!("Starting DualSense v{}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var_os(ENV_CONFIG).map(std::path::PathBuf::from);
    let mut config = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Falling back to default configuration: {:#}", e);
            AppConfig::default()
        }
    };

    tauri::Builder::default()
        .setup(move |app| {
            if std::env::var_os(config::ENV_STORAGE_DIR).is_none() {
                if let Ok(dir) = app.path().app_data_dir() {
                    config.storage_dir = dir;
                }
            }
            tracing::info!(
                "Backend {} (storage: {})",
                config.backend_url,
                config.storage_dir.display()
            );
            app.manage(SessionState::new(config.clone())?);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Capture commands
            commands::capture::open_screen,
            commands::capture::pointer_event,
            commands::capture::disarm,
            commands::capture::flush_sketch,
            commands::capture::clear_sketch,
            commands::capture::cancel_dispatches,
            commands::capture::get_response,
            commands::capture::list_signs,
            // Template commands
            commands::template::fetch_template,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
