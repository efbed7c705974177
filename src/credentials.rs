//! Google service-account credential blob.
//!
//! The blob is the JSON key file a user downloads from the Cloud console and
//! pastes in at run time. It is parsed into [`ServiceAccountKey`], used to
//! mint access tokens for the duration of one run, and dropped afterwards.
//! Nothing here touches the file system.

use crate::error::OcrError;
use serde::Deserialize;
use std::fmt;

/// Token endpoint used when the key file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file that the OCR client needs.
///
/// Unknown fields (`auth_provider_x509_cert_url`, `universe_domain`, …) are
/// ignored.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Usually `"service_account"`.
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,

    /// Sent as the JWT `kid` header when present.
    #[serde(default)]
    pub private_key_id: Option<String>,

    /// PEM-encoded RSA private key (PKCS#8 or PKCS#1).
    pub private_key: String,

    /// Service account identity, the JWT issuer.
    pub client_email: String,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    /// The blob as pasted, handed to the Google auth library unchanged.
    #[serde(skip)]
    raw: serde_json::Value,
}

impl ServiceAccountKey {
    /// Parse a pasted credential blob.
    ///
    /// Empty or whitespace-only input is reported as
    /// [`OcrError::MissingCredentials`]; anything that does not deserialise
    /// (bad JSON, missing `client_email` / `private_key`) as
    /// [`OcrError::MalformedCredentials`] carrying the parser's message.
    pub fn from_json(blob: &str) -> Result<Self, OcrError> {
        if blob.trim().is_empty() {
            return Err(OcrError::MissingCredentials);
        }

        let raw: serde_json::Value = serde_json::from_str(blob)
            .map_err(|source| OcrError::MalformedCredentials { source })?;
        let mut key: ServiceAccountKey = serde_json::from_value(raw.clone())
            .map_err(|source| OcrError::MalformedCredentials { source })?;
        key.raw = raw;

        if let Some(ref t) = key.key_type {
            if t != "service_account" {
                return Err(OcrError::InvalidCredentials {
                    detail: format!("expected a \"service_account\" key, got \"{t}\""),
                });
            }
        }
        if key.client_email.trim().is_empty() {
            return Err(OcrError::InvalidCredentials {
                detail: "client_email is empty".into(),
            });
        }
        if key.private_key.trim().is_empty() {
            return Err(OcrError::InvalidCredentials {
                detail: "private_key is empty".into(),
            });
        }

        Ok(key)
    }

    /// The full key file as JSON, including fields this struct ignores.
    pub fn as_json(&self) -> &serde_json::Value {
        &self.raw
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
