//! Media delivery gateway.
//!
//! Resolves a public-facing media URL to bytes plus headers through one of
//! two storage backends: the local media root or a remote object store
//! reached through short-lived signed URLs. Callers only ever hand the
//! gateway a URL; backend branching never leaks past this module.

pub mod local;
pub mod remote;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::web::Bytes;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

pub use local::LocalBackend;
pub use remote::RemoteObjectBackend;

/// Storage backend a reference resolves to. A reference maps to exactly one
/// backend, decided by the shape of its public URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Local,
    RemoteObjectStore,
}

/// Kind of binary content behind a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentKind {
    Audio,
    Image,
}

/// Logical pointer to one binary asset, independent of storage backend.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaReference {
    /// Local path relative to the media root, or the remote object key.
    pub logical_path: String,
    pub backend: Backend,
    pub kind: ContentKind,
}

/// Errors surfaced by delivery operations.
#[derive(Debug)]
pub enum DeliveryError {
    /// Malformed or unparseable media reference; never retried.
    InvalidReference(String),
    /// Local file absent or remote object missing.
    NotFound,
    /// Syntactically present but unsatisfiable range request.
    RangeNotSatisfiable,
    /// Signed-URL issuance or upstream fetch failed.
    Upstream(String),
}

impl DeliveryError {
    /// Convert a delivery error into an HTTP response. Backend internals
    /// stay in the logs, not the body.
    pub fn into_response(self) -> HttpResponse {
        match self {
            DeliveryError::InvalidReference(msg) => {
                HttpResponse::BadRequest().body(format!("invalid media reference: {msg}"))
            }
            DeliveryError::NotFound => HttpResponse::NotFound().body("file not found"),
            DeliveryError::RangeNotSatisfiable => HttpResponse::RangeNotSatisfiable()
                .insert_header((header::ACCEPT_RANGES, "bytes"))
                .finish(),
            DeliveryError::Upstream(detail) => {
                tracing::warn!(detail = %detail, "upstream storage error");
                HttpResponse::BadGateway().body("upstream storage error")
            }
        }
    }
}

pub type DeliveryBody = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// A resolved delivery: status, headers, and the byte stream. Either
/// complete and correctly headered, or the resolution failed outright;
/// never a truncated success.
pub struct Delivery {
    /// `200 OK` or `206 Partial Content`.
    pub status: StatusCode,
    pub content_type: String,
    /// Body length when known (local reads always know it; remote
    /// passthrough relies on the upstream header).
    pub content_length: Option<u64>,
    /// `bytes <start>-<end>/<total>` when a range was honored.
    pub content_range: Option<String>,
    pub body: DeliveryBody,
}

/// Capability shared by both storage backends.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the referenced object, honoring a single-range header if given.
    async fn fetch(
        &self,
        reference: &MediaReference,
        range: Option<&str>,
    ) -> Result<Delivery, DeliveryError>;

    /// Full-body read for explicit downloads. Remote backends sign these
    /// with the short one-shot TTL rather than the streaming TTL.
    async fn fetch_full(&self, reference: &MediaReference) -> Result<Delivery, DeliveryError> {
        self.fetch(reference, None).await
    }

    /// Remove the referenced object (track/artwork replacement or deletion).
    async fn delete(&self, reference: &MediaReference) -> Result<(), DeliveryError>;
}

/// Facade over both backends keyed by reference classification.
pub struct MediaGateway {
    local: LocalBackend,
    remote: Option<RemoteObjectBackend>,
}

impl MediaGateway {
    pub fn new(local: LocalBackend, remote: Option<RemoteObjectBackend>) -> Self {
        Self { local, remote }
    }

    /// Resolve a media URL to bytes, honoring an optional range header.
    pub async fn resolve(
        &self,
        url: &str,
        range: Option<&str>,
    ) -> Result<Delivery, DeliveryError> {
        let reference = classify(url)?;
        self.backend_for(&reference)?.fetch(&reference, range).await
    }

    /// Full-body resolution for explicit downloads; returns the suggested
    /// attachment filename alongside the delivery.
    pub async fn download(&self, url: &str) -> Result<(Delivery, String), DeliveryError> {
        let reference = classify(url)?;
        let delivery = self.backend_for(&reference)?.fetch_full(&reference).await?;
        Ok((delivery, attachment_filename(url)))
    }

    /// Issue a short-lived signed URL for a remote object key.
    pub async fn issue_signed_url(&self, key: &str) -> Result<String, DeliveryError> {
        if key.trim().is_empty() {
            return Err(DeliveryError::InvalidReference("empty path".to_string()));
        }
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| DeliveryError::Upstream("remote store not configured".to_string()))?;
        remote.create_signed_url(key, remote.sign_ttl_secs()).await
    }

    /// Delete the object behind a media URL.
    pub async fn delete(&self, url: &str) -> Result<(), DeliveryError> {
        let reference = classify(url)?;
        self.backend_for(&reference)?.delete(&reference).await
    }

    fn backend_for(
        &self,
        reference: &MediaReference,
    ) -> Result<&dyn StorageBackend, DeliveryError> {
        match reference.backend {
            Backend::Local => Ok(&self.local),
            Backend::RemoteObjectStore => self
                .remote
                .as_ref()
                .map(|b| b as &dyn StorageBackend)
                .ok_or_else(|| {
                    DeliveryError::Upstream("remote store not configured".to_string())
                }),
        }
    }
}

const PUBLIC_OBJECT_MARKER: &str = "/object/public/";

/// Classify a public-facing media URL into a reference.
///
/// URLs carrying the remote store's public-object path map to the remote
/// backend with the object key extracted; anything else is a path beneath
/// the local media root.
pub fn classify(url: &str) -> Result<MediaReference, DeliveryError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(DeliveryError::InvalidReference("empty url".to_string()));
    }
    if url.contains(PUBLIC_OBJECT_MARKER) {
        let key = extract_object_key(url)?;
        let kind = kind_for_path(&key);
        return Ok(MediaReference {
            logical_path: key,
            backend: Backend::RemoteObjectStore,
            kind,
        });
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Err(DeliveryError::InvalidReference(
            "absolute url does not point at a known store".to_string(),
        ));
    }
    // Site-relative path: strip query/fragment and leading slashes.
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .trim_start_matches('/');
    if path.is_empty() {
        return Err(DeliveryError::InvalidReference("empty path".to_string()));
    }
    let decoded = urlencoding::decode(path)
        .map_err(|_| DeliveryError::InvalidReference("bad percent-encoding".to_string()))?
        .into_owned();
    if decoded
        .split('/')
        .any(|segment| segment == ".." || segment.is_empty())
    {
        return Err(DeliveryError::InvalidReference(
            "path traversal is not allowed".to_string(),
        ));
    }
    let kind = kind_for_path(&decoded);
    Ok(MediaReference {
        logical_path: decoded,
        backend: Backend::Local,
        kind,
    })
}

/// Extract the object key from a remote public URL: everything after
/// `/object/public/<bucket>/`.
pub fn extract_object_key(url: &str) -> Result<String, DeliveryError> {
    let after_marker = url
        .split_once(PUBLIC_OBJECT_MARKER)
        .map(|(_, rest)| rest)
        .ok_or_else(|| DeliveryError::InvalidReference("not a public object url".to_string()))?;
    let (_bucket, key) = after_marker
        .split_once('/')
        .ok_or_else(|| DeliveryError::InvalidReference("missing object key".to_string()))?;
    let key = key.split(['?', '#']).next().unwrap_or(key);
    if key.is_empty() {
        return Err(DeliveryError::InvalidReference(
            "missing object key".to_string(),
        ));
    }
    let decoded = urlencoding::decode(key)
        .map_err(|_| DeliveryError::InvalidReference("bad percent-encoding".to_string()))?;
    Ok(decoded.into_owned())
}

fn kind_for_path(path: &str) -> ContentKind {
    match extension_of(path) {
        "png" | "jpg" | "jpeg" | "webp" | "gif" => ContentKind::Image,
        _ => ContentKind::Audio,
    }
}

fn extension_of(path: &str) -> &str {
    path.rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
}

/// Infer a content type for a reference from its extension.
pub fn content_type_for(reference: &MediaReference) -> &'static str {
    let ext = extension_of(&reference.logical_path).to_ascii_lowercase();
    match reference.kind {
        ContentKind::Audio => match ext.as_str() {
            "wav" => "audio/wav",
            "ogg" => "audio/ogg",
            "m4a" => "audio/mp4",
            "flac" => "audio/flac",
            // mp3 and anything unrecognized.
            _ => "audio/mpeg",
        },
        ContentKind::Image => match ext.as_str() {
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "image/jpeg",
        },
    }
}

/// Parse a single `bytes=<start>-<end>` range against a total length.
/// Returns the inclusive byte bounds, clamped to the resource, or `None`
/// when the header is malformed or unsatisfiable.
pub fn parse_single_range(header: &str, total_len: u64) -> Option<(u64, u64)> {
    let header = header.trim();
    if !header.starts_with("bytes=") {
        return None;
    }
    let range = header.trim_start_matches("bytes=");
    let first = range.split(',').next()?;
    let (start_s, end_s) = first.split_once('-')?;
    if start_s.is_empty() {
        return None;
    }
    let start = start_s.parse::<u64>().ok()?;
    let end = if end_s.is_empty() {
        total_len.saturating_sub(1)
    } else {
        end_s.parse::<u64>().ok()?
    };
    if start >= total_len || end < start {
        return None;
    }
    Some((start, end.min(total_len.saturating_sub(1))))
}

/// Build the public stream URL for a stored media URL.
pub fn build_stream_url(public_base_url: &str, media_url: &str) -> String {
    format!(
        "{}/stream?url={}",
        public_base_url.trim_end_matches('/'),
        urlencoding::encode(media_url)
    )
}

fn attachment_filename(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or("");
    let decoded = urlencoding::decode(name)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| name.to_string());
    if decoded.is_empty() {
        "track.wav".to_string()
    } else {
        decoded
    }
}
