//! OCR client: one page image in, the recognised text out.
//!
//! [`TextRecognizer`] is the seam between the pipeline and the remote
//! service. [`VisionClient`] implements it against the Google Cloud Vision
//! REST API (`images:annotate`), authenticating with the service account
//! from the run's credential blob and biasing recognition with the
//! configured language hints (Arabic by default).
//!
//! Failures are never retried here: an authentication, quota or API error
//! aborts the whole run.

use crate::auth::AuthHeaders;
use crate::config::OcrConfig;
use crate::credentials::ServiceAccountKey;
use crate::error::OcrError;
use crate::pipeline::encode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Recognises the text on a single page image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Return the full recognised text of `png`, or an empty string when
    /// the page holds no detectable text.
    ///
    /// `page_num` is 1-indexed and only used for error context.
    async fn recognize(&self, page_num: usize, png: &[u8]) -> Result<String, OcrError>;
}

/// Google Cloud Vision client for one run.
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
    language_hints: Vec<String>,
    feature_type: &'static str,
    timeout_secs: u64,
    auth: AuthHeaders,
}

impl VisionClient {
    /// Build a client from a parsed credential blob.
    ///
    /// Request headers are fetched once here, so unusable or rejected
    /// credentials fail before any page is rendered.
    pub async fn connect(key: &ServiceAccountKey, config: &OcrConfig) -> Result<Self, OcrError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("arabic-pdf-ocr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OcrError::Internal(format!("HTTP client: {e}")))?;

        let auth = AuthHeaders::new(key)?;
        auth.headers().await?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            language_hints: config.language_hints.clone(),
            feature_type: config.detection_mode.feature_type(),
            timeout_secs: config.api_timeout_secs,
            auth,
        })
    }

    fn build_request<'a>(&'a self, png: &[u8]) -> BatchAnnotateRequest<'a> {
        build_request(png, self.feature_type, &self.language_hints)
    }
}

#[async_trait]
impl TextRecognizer for VisionClient {
    async fn recognize(&self, page_num: usize, png: &[u8]) -> Result<String, OcrError> {
        let headers = self.auth.headers().await?;
        let body = self.build_request(png);

        let response = self
            .http
            .post(&self.endpoint)
            .headers(headers)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OcrError::ApiTimeout {
                        page: page_num,
                        secs: self.timeout_secs,
                    }
                } else {
                    OcrError::Http {
                        url: self.endpoint.clone(),
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| OcrError::Http {
            url: self.endpoint.clone(),
            detail: e.to_string(),
        })?;
        debug!("Page {}: Vision answered HTTP {} ({} bytes)", page_num, status, text.len());

        if !status.is_success() {
            return Err(map_api_error(page_num, status.as_u16(), &text));
        }

        let parsed: BatchAnnotateResponse =
            serde_json::from_str(&text).map_err(|e| OcrError::VisionApi {
                page: page_num,
                status: status.as_u16(),
                message: format!("unexpected response body: {e}"),
            })?;

        extract_text(page_num, parsed)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct BatchAnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageRequest<'a> {
    image: ImagePayload,
    features: Vec<Feature>,
    image_context: ImageContext<'a>,
}

#[derive(Debug, Serialize)]
struct ImagePayload {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext<'a> {
    language_hints: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BatchAnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    full_text_annotation: Option<FullTextAnnotation>,
    #[serde(default)]
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// gRPC status codes that Vision reports inside a 200 response.
const RPC_PERMISSION_DENIED: i32 = 7;
const RPC_RESOURCE_EXHAUSTED: i32 = 8;
const RPC_UNAUTHENTICATED: i32 = 16;

pub(crate) fn build_request<'a>(
    png: &[u8],
    feature_type: &'static str,
    language_hints: &'a [String],
) -> BatchAnnotateRequest<'a> {
    BatchAnnotateRequest {
        requests: vec![AnnotateImageRequest {
            image: ImagePayload {
                content: encode::to_base64(png),
            },
            features: vec![Feature { kind: feature_type }],
            image_context: ImageContext { language_hints },
        }],
    }
}

/// Pull the full-page text out of a successful response.
///
/// The first text annotation spans the whole image; the remaining ones are
/// individual words. Dense-document mode also fills `fullTextAnnotation`,
/// which is used when the annotation list is absent.
pub(crate) fn extract_text(
    page_num: usize,
    response: BatchAnnotateResponse,
) -> Result<String, OcrError> {
    let Some(first) = response.responses.into_iter().next() else {
        warn!("Page {}: Vision returned no responses, treating as blank", page_num);
        return Ok(String::new());
    };

    if let Some(err) = first.error {
        return Err(match err.code {
            RPC_PERMISSION_DENIED | RPC_UNAUTHENTICATED => OcrError::AuthFailed {
                detail: err.message,
            },
            RPC_RESOURCE_EXHAUSTED => OcrError::QuotaExceeded {
                detail: err.message,
            },
            code => OcrError::VisionApi {
                page: page_num,
                status: 200,
                message: format!("code {code}: {}", err.message),
            },
        });
    }

    if let Some(annotation) = first.text_annotations.into_iter().next() {
        return Ok(annotation.description);
    }
    Ok(first
        .full_text_annotation
        .map(|full| full.text)
        .unwrap_or_default())
}

/// Turn a non-2xx Vision response into an error.
pub(crate) fn map_api_error(page_num: usize, status: u16, body: &str) -> OcrError {
    let (message, rpc_status) = match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(env) => (env.error.message, env.error.status),
        Err(_) => (body.trim().to_string(), None),
    };

    match (status, rpc_status.as_deref()) {
        (401 | 403, _) => OcrError::AuthFailed { detail: message },
        (429, _) | (_, Some("RESOURCE_EXHAUSTED")) => OcrError::QuotaExceeded { detail: message },
        _ => OcrError::VisionApi {
            page: page_num,
            status,
            message,
        },
    }
}
