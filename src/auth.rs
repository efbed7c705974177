//! Request authentication for a Google service account.
//!
//! Credentials are built from the pasted key with `google-cloud-auth`,
//! scoped to Cloud Vision. The library signs and caches tokens itself; this
//! module only turns its results into `Authorization` headers for our
//! reqwest calls and its failures into [`OcrError`]s.

use crate::credentials::ServiceAccountKey;
use crate::error::OcrError;
use google_cloud_auth::credentials::service_account::{AccessSpecifier, Builder};
use google_cloud_auth::credentials::{CacheableResource, Credentials};
use http::{Extensions, HeaderMap};
use std::sync::Mutex;
use tracing::debug;

/// OAuth scope granting access to the Cloud Vision API.
pub const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";

/// Produces auth headers for one service account.
pub struct AuthHeaders {
    credentials: Credentials,
    /// Last headers handed out, reused when the library reports no change.
    last: Mutex<Option<HeaderMap>>,
}

impl AuthHeaders {
    /// Build scoped credentials from a parsed key. No network traffic.
    pub fn new(key: &ServiceAccountKey) -> Result<Self, OcrError> {
        let credentials = Builder::new(key.as_json().clone())
            .with_access_specifier(AccessSpecifier::from_scopes([VISION_SCOPE]))
            .build()
            .map_err(|e| OcrError::InvalidCredentials {
                detail: e.to_string(),
            })?;

        debug!("Built service-account credentials for {}", key.client_email);
        Ok(Self {
            credentials,
            last: Mutex::new(None),
        })
    }

    /// Current request headers, minting a token when needed.
    pub async fn headers(&self) -> Result<HeaderMap, OcrError> {
        let resource = self
            .credentials
            .headers(Extensions::new())
            .await
            .map_err(|e| map_auth_error(&e.to_string()))?;

        let mut last = self
            .last
            .lock()
            .map_err(|_| OcrError::Internal("auth header cache poisoned".into()))?;
        match resource {
            CacheableResource::New { data, .. } => {
                *last = Some(data.clone());
                Ok(data)
            }
            CacheableResource::NotModified => last
                .clone()
                .ok_or_else(|| OcrError::Internal("auth headers unchanged but never issued".into())),
        }
    }
}

/// Classify a credential failure reported by the auth library.
///
/// Google's token endpoint answers `invalid_grant` for bad signatures,
/// unknown accounts and clock skew alike; only rate limiting is told apart.
pub(crate) fn map_auth_error(message: &str) -> OcrError {
    let detail = message.trim().to_string();
    if detail.contains("RESOURCE_EXHAUSTED")
        || detail.contains("Too Many Requests")
        || detail.contains("rate_limit_exceeded")
    {
        OcrError::QuotaExceeded { detail }
    } else {
        OcrError::AuthFailed { detail }
    }
}
