//! Remote object-store backend.
//!
//! Objects live in a single bucket behind a storage REST API. Reads go
//! through short-lived signed URLs issued per request; nothing about a
//! signed URL is ever cached or persisted.

use actix_web::http::StatusCode;
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header;
use serde::Deserialize;

use super::{Delivery, DeliveryError, MediaReference, StorageBackend, content_type_for};

/// Default signed-URL lifetime for streaming reads, in seconds.
pub const STREAM_TTL_SECS: u64 = 3600;
/// Default signed-URL lifetime for downloads and client-facing issuance.
pub const SIGN_TTL_SECS: u64 = 60;

#[derive(Deserialize)]
struct SignResponse {
    /// Relative path of the signed object, including its token query.
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Backend reaching objects through per-request signed URLs.
pub struct RemoteObjectBackend {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: String,
    stream_ttl_secs: u64,
    sign_ttl_secs: u64,
}

impl RemoteObjectBackend {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        service_key: impl Into<String>,
        stream_ttl_secs: u64,
        sign_ttl_secs: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            service_key: service_key.into(),
            stream_ttl_secs,
            sign_ttl_secs,
        }
    }

    pub fn sign_ttl_secs(&self) -> u64 {
        self.sign_ttl_secs
    }

    /// Ask the store to sign `key` for `ttl_secs`. Returns an absolute URL.
    pub async fn create_signed_url(
        &self,
        key: &str,
        ttl_secs: u64,
    ) -> Result<String, DeliveryError> {
        let encoded = encode_key(key);
        let endpoint = format!("{}/object/sign/{}/{}", self.base_url, self.bucket, encoded);
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "expiresIn": ttl_secs }))
            .send()
            .await
            .map_err(|e| DeliveryError::Upstream(format!("sign request failed: {e}")))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DeliveryError::NotFound);
        }
        if !response.status().is_success() {
            return Err(DeliveryError::Upstream(format!(
                "sign request returned {}",
                response.status()
            )));
        }
        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Upstream(format!("bad sign response: {e}")))?;
        Ok(format!(
            "{}{}",
            self.base_url,
            ensure_leading_slash(&signed.signed_url)
        ))
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

impl RemoteObjectBackend {
    /// Sign the object for `ttl_secs` and proxy the read through the
    /// signed URL, forwarding the range header when present.
    async fn fetch_signed(
        &self,
        reference: &MediaReference,
        range: Option<&str>,
        ttl_secs: u64,
    ) -> Result<Delivery, DeliveryError> {
        // Fresh signature on every read.
        let signed_url = self
            .create_signed_url(&reference.logical_path, ttl_secs)
            .await?;

        let mut request = self.client.get(&signed_url);
        if let Some(header_value) = range {
            request = request.header(header::RANGE, header_value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Upstream(format!("upstream fetch failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DeliveryError::NotFound);
        }
        if status == reqwest::StatusCode::RANGE_NOT_SATISFIABLE {
            return Err(DeliveryError::RangeNotSatisfiable);
        }
        if !status.is_success() {
            return Err(DeliveryError::Upstream(format!(
                "upstream returned {status}"
            )));
        }

        // Pass upstream headers through; fall back to extension-based type.
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| content_type_for(reference).to_string());
        let content_length = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let content_range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let delivered_status = if status == reqwest::StatusCode::PARTIAL_CONTENT {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        };
        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        Ok(Delivery {
            status: delivered_status,
            content_type,
            content_length,
            content_range,
            body,
        })
    }
}

#[async_trait]
impl StorageBackend for RemoteObjectBackend {
    async fn fetch(
        &self,
        reference: &MediaReference,
        range: Option<&str>,
    ) -> Result<Delivery, DeliveryError> {
        self.fetch_signed(reference, range, self.stream_ttl_secs).await
    }

    // Downloads are one-shot; the signature only needs to outlive the
    // redirect, not a whole listening session.
    async fn fetch_full(&self, reference: &MediaReference) -> Result<Delivery, DeliveryError> {
        self.fetch_signed(reference, None, self.sign_ttl_secs).await
    }

    async fn delete(&self, reference: &MediaReference) -> Result<(), DeliveryError> {
        let encoded = encode_key(&reference.logical_path);
        let endpoint = format!("{}/object/{}/{}", self.base_url, self.bucket, encoded);
        let response = self
            .client
            .delete(&endpoint)
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| DeliveryError::Upstream(format!("delete request failed: {e}")))?;
        let status = response.status();
        // Missing objects are treated as already deleted.
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(DeliveryError::Upstream(format!(
                "delete returned {status}"
            )))
        }
    }
}
