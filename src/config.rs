//! Application and per-screen capture configuration
//!
//! `AppConfig` is loaded once (optional JSON file, then environment
//! overrides). Each screen turns it into a `CaptureConfig` through a
//! `Screen` preset, which is the only place the per-screen differences live.

use crate::dispatch::{DispatchMode, DispatchTrigger, InFlightPolicy, LabelHeader, PayloadFormat};
use crate::processing::raster::CanvasSize;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_BACKEND: &str = "DUALSENSE_BACKEND";
pub const ENV_STORAGE_DIR: &str = "DUALSENSE_STORAGE_DIR";
pub const ENV_TIMEOUT_SECS: &str = "DUALSENSE_TIMEOUT_SECS";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Destination label must not be empty")]
    EmptyLabel,

    #[error("Unknown sign: {0}")]
    UnknownSign(String),

    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
}

/// Screen presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    /// Record gestures to local storage
    Record,
    /// Send each gesture's points to the parametric recognizer
    Parametric,
    /// Send a drawing as an image to the image recognizer
    Image,
    /// Upload a drawing as a named training sample
    Sample,
}

/// Everything one capture component needs, fixed for the life of a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    pub destination_label: String,
    pub mode: DispatchMode,
    pub endpoint: String,
    pub payload: PayloadFormat,
    pub label_header: LabelHeader,
    pub trigger: DispatchTrigger,
    pub storage_dir: PathBuf,
    pub canvas: CanvasSize,
    pub in_flight: InFlightPolicy,
}

impl CaptureConfig {
    /// Gesture-end capture writing to `storage_dir`.
    pub fn store(label: impl Into<String>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_label: label.into(),
            mode: DispatchMode::Store,
            endpoint: String::new(),
            payload: PayloadFormat::Json,
            label_header: LabelHeader::Sign,
            trigger: DispatchTrigger::GestureEnd,
            storage_dir: storage_dir.into(),
            canvas: CanvasSize::default(),
            in_flight: InFlightPolicy::default(),
        }
    }

    /// Gesture-end capture uploading JSON points to `endpoint`.
    pub fn transmit(label: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            mode: DispatchMode::Transmit,
            endpoint: endpoint.into(),
            ..Self::store(label, std::env::temp_dir())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destination_label.trim().is_empty() {
            return Err(ConfigError::EmptyLabel);
        }

        if self.mode == DispatchMode::Transmit {
            validate_endpoint(&self.endpoint)?;
        }

        if self.payload == PayloadFormat::Png && !self.canvas.is_drawable() {
            return Err(ConfigError::InvalidCanvas {
                width: self.canvas.width,
                height: self.canvas.height,
            });
        }

        Ok(())
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Scheme, host and port of the recognition backend
    pub backend_url: String,
    pub recognition_path: String,
    pub image_path: String,
    pub sample_path: String,
    pub template_path: String,
    /// Application-private directory for stored gestures
    pub storage_dir: PathBuf,
    pub request_timeout_secs: Option<u64>,
    pub canvas: CanvasSize,
    pub in_flight: InFlightPolicy,
    pub signs: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            recognition_path: "/receive_json".to_string(),
            image_path: "/recognise-image".to_string(),
            sample_path: "/save-sample".to_string(),
            template_path: "/get-template".to_string(),
            storage_dir: std::env::temp_dir().join("dualsense"),
            request_timeout_secs: None,
            canvas: CanvasSize::default(),
            in_flight: InFlightPolicy::default(),
            signs: ["CH", "G", "H", "J", "LL", "Ñ", "RR", "V", "W", "Z", "Y", "General"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl AppConfig {
    /// Load from an optional JSON file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(url) = lookup(ENV_BACKEND) {
            self.backend_url = url;
        }
        if let Some(dir) = lookup(ENV_STORAGE_DIR) {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a whole number of seconds, got {:?}", ENV_TIMEOUT_SECS, secs))?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.backend_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn recognition_endpoint(&self) -> String {
        self.endpoint(&self.recognition_path)
    }

    pub fn image_endpoint(&self) -> String {
        self.endpoint(&self.image_path)
    }

    pub fn sample_endpoint(&self) -> String {
        self.endpoint(&self.sample_path)
    }

    pub fn template_endpoint(&self) -> String {
        self.endpoint(&self.template_path)
    }

    pub fn is_known_sign(&self, sign: &str) -> bool {
        self.signs.iter().any(|s| s == sign)
    }

    /// Build and validate the capture configuration for a screen.
    pub fn capture_config(&self, screen: Screen, sign: &str) -> Result<CaptureConfig, ConfigError> {
        if matches!(screen, Screen::Parametric | Screen::Image) && !self.is_known_sign(sign) {
            return Err(ConfigError::UnknownSign(sign.to_string()));
        }

        let base = CaptureConfig {
            canvas: self.canvas,
            in_flight: self.in_flight,
            ..CaptureConfig::store(sign, self.storage_dir.clone())
        };

        let config = match screen {
            Screen::Record => base,
            Screen::Parametric => CaptureConfig {
                mode: DispatchMode::Transmit,
                endpoint: self.recognition_endpoint(),
                ..base
            },
            Screen::Image => CaptureConfig {
                mode: DispatchMode::Transmit,
                endpoint: self.image_endpoint(),
                payload: PayloadFormat::Png,
                trigger: DispatchTrigger::Manual,
                ..base
            },
            Screen::Sample => CaptureConfig {
                mode: DispatchMode::Transmit,
                endpoint: self.sample_endpoint(),
                payload: PayloadFormat::Png,
                label_header: LabelHeader::Filename,
                trigger: DispatchTrigger::Manual,
                ..base
            },
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_endpoints() {
        let config = AppConfig::default();
        assert_eq!(config.recognition_endpoint(), "http://127.0.0.1:5000/receive_json");
        assert_eq!(config.template_endpoint(), "http://127.0.0.1:5000/get-template");
        assert!(config.is_known_sign("Ñ"));
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_overrides_rewrite_backend() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND, "http://192.168.1.76:5000/"),
            (ENV_STORAGE_DIR, "/data/documents"),
            (ENV_TIMEOUT_SECS, " 15 "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.sample_endpoint(), "http://192.168.1.76:5000/save-sample");
        assert_eq!(config.storage_dir, PathBuf::from("/data/documents"));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_bad_timeout_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|k| (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));
    }

    #[test]
    fn test_load_from_file_with_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"backendUrl":"http://10.0.0.2:8080","inFlight":"lastWriteWins","signs":["A"]}"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.recognition_endpoint(), "http://10.0.0.2:8080/receive_json");
        assert_eq!(config.in_flight, InFlightPolicy::LastWriteWins);
        assert_eq!(config.signs, vec!["A".to_string()]);
        assert_eq!(config.image_path, "/recognise-image");
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/dualsense.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_screen_presets() {
        let config = AppConfig::default();

        let record = config.capture_config(Screen::Record, "anything").unwrap();
        assert_eq!(record.mode, DispatchMode::Store);
        assert_eq!(record.trigger, DispatchTrigger::GestureEnd);

        let parametric = config.capture_config(Screen::Parametric, "CH").unwrap();
        assert_eq!(parametric.mode, DispatchMode::Transmit);
        assert_eq!(parametric.payload, PayloadFormat::Json);
        assert_eq!(parametric.endpoint, "http://127.0.0.1:5000/receive_json");

        let image = config.capture_config(Screen::Image, "General").unwrap();
        assert_eq!(image.payload, PayloadFormat::Png);
        assert_eq!(image.trigger, DispatchTrigger::Manual);

        let sample = config.capture_config(Screen::Sample, "sample").unwrap();
        assert_eq!(sample.label_header, LabelHeader::Filename);
    }

    #[test]
    fn test_unknown_sign_is_rejected() {
        let err = AppConfig::default()
            .capture_config(Screen::Parametric, "Q")
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownSign("Q".to_string()));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint_and_label() {
        assert!(matches!(
            CaptureConfig::transmit("CH", "not a url").validate(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            CaptureConfig::transmit("CH", "ftp://host/receive").validate(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert_eq!(
            CaptureConfig::store("  ", "/tmp").validate(),
            Err(ConfigError::EmptyLabel)
        );
        assert!(CaptureConfig::transmit("CH", "http://localhost:5000/receive_json")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_bounds_png_canvas() {
        let mut config = AppConfig::default().capture_config(Screen::Image, "CH").unwrap();
        config.canvas = CanvasSize {
            width: 10_000,
            height: 10_000,
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCanvas {
                width: 10_000,
                height: 10_000
            })
        );

        config.canvas = CanvasSize { width: 0, height: 844 };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidCanvas { .. })));

        config.canvas = CanvasSize {
            width: 8192,
            height: 8192,
        };
        assert!(config.validate().is_ok());
    }
}
