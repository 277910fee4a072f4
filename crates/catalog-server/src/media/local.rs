//! Local filesystem backend rooted at the configured media directory.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use actix_web::http::StatusCode;
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::{Delivery, DeliveryError, MediaReference, StorageBackend, content_type_for,
            parse_single_range};

/// Backend serving files beneath a single media root with true partial
/// reads.
pub struct LocalBackend {
    media_root: PathBuf,
}

impl LocalBackend {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Join a logical path onto the media root. Classification already
    /// rejected traversal segments; this keeps absolute paths out too.
    fn resolve_path(&self, reference: &MediaReference) -> Result<PathBuf, DeliveryError> {
        let relative = Path::new(&reference.logical_path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(DeliveryError::InvalidReference(
                "path escapes media root".to_string(),
            ));
        }
        Ok(self.media_root.join(relative))
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    async fn fetch(
        &self,
        reference: &MediaReference,
        range: Option<&str>,
    ) -> Result<Delivery, DeliveryError> {
        let path = self.resolve_path(reference)?;
        let mut file = tokio::fs::File::open(&path)
            .await
            .map_err(|_| DeliveryError::NotFound)?;
        let metadata = file
            .metadata()
            .await
            .map_err(|e| DeliveryError::Upstream(format!("stat failed: {e}")))?;
        let total_len = metadata.len();
        let content_type = content_type_for(reference).to_string();

        if let Some(header) = range {
            let (start, end) =
                parse_single_range(header, total_len).ok_or(DeliveryError::RangeNotSatisfiable)?;
            let len = end - start + 1;
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| DeliveryError::Upstream(format!("seek failed: {e}")))?;
            let stream = ReaderStream::new(file.take(len));
            return Ok(Delivery {
                status: StatusCode::PARTIAL_CONTENT,
                content_type,
                content_length: Some(len),
                content_range: Some(format!("bytes {start}-{end}/{total_len}")),
                body: stream.boxed(),
            });
        }

        let stream = ReaderStream::new(file);
        Ok(Delivery {
            status: StatusCode::OK,
            content_type,
            content_length: Some(total_len),
            content_range: None,
            body: stream.boxed(),
        })
    }

    async fn delete(&self, reference: &MediaReference) -> Result<(), DeliveryError> {
        let path = self.resolve_path(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone is fine; deletion is idempotent.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeliveryError::Upstream(format!("delete failed: {e}"))),
        }
    }
}
