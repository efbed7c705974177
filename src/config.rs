//! Configuration types for a PDF OCR run.
//!
//! Every knob of a run lives in [`OcrConfig`], built through
//! [`OcrConfigBuilder`]. Defaults: 300 DPI rendering, `TEXT_DETECTION`,
//! the `ar` language hint and a 120 s timeout per Vision call.

use crate::error::OcrError;
use crate::pipeline::vision::TextRecognizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default Cloud Vision endpoint for synchronous image annotation.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Configuration for one OCR run.
///
/// # Example
/// ```rust
/// use arabic_pdf_ocr::{DetectionMode, OcrConfig};
///
/// let config = OcrConfig::builder()
///     .dpi(200)
///     .language_hints(["ar", "en"])
///     .detection_mode(DetectionMode::Document)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Rendering resolution in dots per inch. Range: 72–600. Default: 300.
    pub dpi: u32,

    /// BCP-47 language hints sent with every page. Default: `["ar"]`.
    pub language_hints: Vec<String>,

    /// Which Vision feature to request. Default: [`DetectionMode::Text`].
    pub detection_mode: DetectionMode,

    /// Vision `images:annotate` endpoint. Default: [`DEFAULT_VISION_ENDPOINT`].
    pub endpoint: String,

    /// Per-request timeout for Vision calls, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Pre-constructed recogniser. When set, no Vision client is built and
    /// the credential blob is only checked for presence and syntax.
    pub recognizer: Option<Arc<dyn TextRecognizer>>,

    /// Receives step and per-page status events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            language_hints: vec!["ar".to_string()],
            detection_mode: DetectionMode::default(),
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            api_timeout_secs: 120,
            password: None,
            recognizer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("dpi", &self.dpi)
            .field("language_hints", &self.language_hints)
            .field("detection_mode", &self.detection_mode)
            .field("endpoint", &self.endpoint)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "recognizer",
                &self.recognizer.as_ref().map(|_| "<dyn TextRecognizer>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn OcrProgressCallback>"),
            )
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn language_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.language_hints = hints.into_iter().map(Into::into).collect();
        self
    }

    pub fn detection_mode(mut self, mode: DetectionMode) -> Self {
        self.config.detection_mode = mode;
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.config.recognizer = Some(recognizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, OcrError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(OcrError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(OcrError::InvalidConfig(
                "API timeout must be at least 1 second".into(),
            ));
        }
        if !(c.endpoint.starts_with("https://") || c.endpoint.starts_with("http://")) {
            return Err(OcrError::InvalidConfig(format!(
                "Vision endpoint must be an HTTP(S) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.language_hints.iter().any(|h| h.trim().is_empty()) {
            return Err(OcrError::InvalidConfig(
                "Language hints must not be empty strings".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Vision feature used for recognition.
///
/// `TEXT_DETECTION` (the default) is tuned for sparse text in photos;
/// `DOCUMENT_TEXT_DETECTION` is tuned for dense pages and may read long
/// Arabic paragraphs better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectionMode {
    /// `TEXT_DETECTION` (default).
    #[default]
    Text,
    /// `DOCUMENT_TEXT_DETECTION`.
    Document,
}

impl DetectionMode {
    /// Feature type name as expected by the Vision REST API.
    pub fn feature_type(self) -> &'static str {
        match self {
            DetectionMode::Text => "TEXT_DETECTION",
            DetectionMode::Document => "DOCUMENT_TEXT_DETECTION",
        }
    }
}
