//! Media delivery endpoints: streaming, downloads, signed URLs.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use actix_web::body::SizedStream;
use serde::Deserialize;

use crate::media::Delivery;
use crate::models::{ErrorResponse, SignedUrlResponse};
use crate::state::AppState;

const AUDIO_CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

fn delivery_response(delivery: Delivery, disposition: Option<String>) -> HttpResponse {
    let mut builder = HttpResponse::build(delivery.status);
    builder
        .insert_header((header::ACCEPT_RANGES, "bytes"))
        .insert_header((header::CONTENT_TYPE, delivery.content_type.clone()))
        .insert_header((header::CACHE_CONTROL, AUDIO_CACHE_CONTROL));
    if let Some(content_range) = &delivery.content_range {
        builder.insert_header((header::CONTENT_RANGE, content_range.clone()));
    }
    if let Some(disposition) = disposition {
        builder.insert_header((header::CONTENT_DISPOSITION, disposition));
    }
    match delivery.content_length {
        Some(len) => builder.body(SizedStream::new(len, delivery.body)),
        None => builder.streaming(delivery.body),
    }
}

#[utoipa::path(
    get,
    path = "/stream",
    params(
        ("url" = String, Query, description = "Stored media URL to resolve")
    ),
    responses(
        (status = 200, description = "Full media body"),
        (status = 206, description = "Requested byte range"),
        (status = 400, description = "Invalid media reference"),
        (status = 404, description = "Media not found"),
        (status = 416, description = "Unsatisfiable range"),
        (status = 502, description = "Upstream storage error")
    )
)]
#[get("/stream")]
/// Stream media bytes, honoring a single HTTP range.
pub async fn stream_media(
    state: web::Data<AppState>,
    query: web::Query<UrlQuery>,
    req: HttpRequest,
) -> impl Responder {
    let range = req
        .headers()
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match state.gateway.resolve(&query.url, range.as_deref()).await {
        Ok(delivery) => delivery_response(delivery, None),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/download",
    params(
        ("url" = String, Query, description = "Stored media URL to download")
    ),
    responses(
        (status = 200, description = "Full media body as attachment"),
        (status = 400, description = "Invalid media reference"),
        (status = 404, description = "Media not found"),
        (status = 502, description = "Upstream storage error")
    )
)]
#[get("/download")]
/// Download the full media body with an attachment disposition.
pub async fn download_media(
    state: web::Data<AppState>,
    query: web::Query<UrlQuery>,
) -> impl Responder {
    match state.gateway.download(&query.url).await {
        Ok((delivery, filename)) => {
            let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));
            delivery_response(delivery, Some(disposition))
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/signed-url",
    params(
        ("path" = String, Query, description = "Remote object key to sign")
    ),
    responses(
        (status = 200, description = "Short-lived signed URL", body = SignedUrlResponse),
        (status = 400, description = "Invalid object key", body = ErrorResponse),
        (status = 502, description = "Signing failed", body = ErrorResponse)
    )
)]
#[get("/signed-url")]
/// Issue a short-lived signed URL for a remote object.
pub async fn signed_url(
    state: web::Data<AppState>,
    query: web::Query<PathQuery>,
) -> impl Responder {
    match state.gateway.issue_signed_url(&query.path).await {
        Ok(url) => HttpResponse::Ok().json(SignedUrlResponse { url }),
        Err(crate::media::DeliveryError::InvalidReference(msg)) => {
            HttpResponse::BadRequest().json(ErrorResponse { error: msg })
        }
        Err(crate::media::DeliveryError::NotFound) => HttpResponse::NotFound().json(ErrorResponse {
            error: "object not found".to_string(),
        }),
        Err(err) => {
            tracing::warn!(error = ?err, "signed url issuance failed");
            HttpResponse::BadGateway().json(ErrorResponse {
                error: "failed to issue signed url".to_string(),
            })
        }
    }
}
