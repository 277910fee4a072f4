//! Catalog endpoints: artists, albums, and admin mutations.

use actix_web::{HttpRequest, HttpResponse, Responder, delete, get, patch, post, web};

use crate::catalog::{Album, AlbumPatch, NewAlbum, NewTrack, Track, TrackPatch};
use crate::media::build_stream_url;
use crate::models::{
    AlbumResponse, AlbumSummary, ArtistResponse, CreateAlbumRequest, ErrorResponse,
    TrackResponse, UpdateAlbumRequest,
};
use crate::state::AppState;

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorResponse {
        error: "admin authorization required".to_string(),
    })
}

fn album_summary(state: &AppState, album: &Album) -> AlbumSummary {
    AlbumSummary {
        id: album.id,
        artist_id: album.artist_id,
        artist_name: state
            .catalog
            .artist_name(album.artist_id)
            .unwrap_or_default(),
        name: album.name.clone(),
        release_date: album.release_date.clone(),
        artwork_url: album.artwork_url.clone(),
        admin_only: album.admin_only,
    }
}

fn track_response(state: &AppState, track: &Track) -> TrackResponse {
    TrackResponse {
        id: track.id,
        name: track.name.clone(),
        number: track.number,
        audio_url: track.audio_url.clone(),
        stream_url: track
            .audio_url
            .as_deref()
            .map(|url| build_stream_url(&state.public_base_url, url)),
        length_secs: track.length_secs,
        downloadable: track.downloadable,
    }
}

fn album_response(state: &AppState, album: &Album, tracks: &[Track]) -> AlbumResponse {
    AlbumResponse {
        id: album.id,
        artist_id: album.artist_id,
        artist_name: state
            .catalog
            .artist_name(album.artist_id)
            .unwrap_or_default(),
        name: album.name.clone(),
        release_date: album.release_date.clone(),
        artwork_url: album.artwork_url.clone(),
        admin_only: album.admin_only,
        tracks: tracks.iter().map(|t| track_response(state, t)).collect(),
    }
}

/// Delete superseded media objects, logging failures instead of failing
/// the request. The records are already updated.
async fn cleanup_media(state: &AppState, urls: Vec<String>) {
    for url in urls {
        if let Err(err) = state.gateway.delete(&url).await {
            tracing::warn!(url = %url, error = ?err, "failed to delete superseded media");
        }
    }
}

#[utoipa::path(
    get,
    path = "/artists",
    responses(
        (status = 200, description = "Artists with their visible albums", body = [ArtistResponse])
    )
)]
#[get("/artists")]
/// List artists with their album summaries; restricted albums appear only
/// for admin callers.
pub async fn list_artists(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let include_restricted = state.auth.authorize(&req).is_some();
    let albums = state.catalog.list_albums(include_restricted);
    let artists: Vec<ArtistResponse> = state
        .catalog
        .list_artists()
        .into_iter()
        .map(|a| ArtistResponse {
            albums: albums
                .iter()
                .filter(|album| album.artist_id == a.id)
                .map(|album| album_summary(&state, album))
                .collect(),
            id: a.id,
            name: a.name,
        })
        .collect();
    HttpResponse::Ok().json(artists)
}

#[utoipa::path(
    get,
    path = "/albums",
    responses(
        (status = 200, description = "Albums visible to the caller", body = [AlbumSummary])
    )
)]
#[get("/albums")]
/// List albums; restricted albums appear only for admin callers.
pub async fn list_albums(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let include_restricted = state.auth.authorize(&req).is_some();
    let albums: Vec<AlbumSummary> = state
        .catalog
        .list_albums(include_restricted)
        .iter()
        .map(|album| album_summary(&state, album))
        .collect();
    HttpResponse::Ok().json(albums)
}

#[utoipa::path(
    get,
    path = "/albums/{id}",
    params(
        ("id" = u64, Path, description = "Album id")
    ),
    responses(
        (status = 200, description = "Album with tracks", body = AlbumResponse),
        (status = 404, description = "Unknown or restricted album")
    )
)]
#[get("/albums/{id}")]
/// Fetch one album with its tracks.
pub async fn get_album(
    state: web::Data<AppState>,
    id: web::Path<u64>,
    req: HttpRequest,
) -> impl Responder {
    let Some((album, tracks)) = state.catalog.album(id.into_inner()) else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "album not found".to_string(),
        });
    };
    // Restricted albums are indistinguishable from missing ones.
    if album.admin_only && state.auth.authorize(&req).is_none() {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "album not found".to_string(),
        });
    }
    HttpResponse::Ok().json(album_response(&state, &album, &tracks))
}

#[utoipa::path(
    post,
    path = "/albums",
    request_body = CreateAlbumRequest,
    responses(
        (status = 201, description = "Album created", body = AlbumResponse),
        (status = 401, description = "Admin authorization required", body = ErrorResponse)
    )
)]
#[post("/albums")]
/// Create an album with its tracks. Admin only.
pub async fn create_album(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateAlbumRequest>,
) -> impl Responder {
    if state.auth.authorize(&req).is_none() {
        return unauthorized();
    }
    let body = body.into_inner();
    let album = state.catalog.create_album(NewAlbum {
        artist_name: body.artist_name,
        name: body.name,
        release_date: body.release_date,
        artwork_url: body.artwork_url,
        admin_only: body.admin_only,
        tracks: body
            .tracks
            .into_iter()
            .map(|t| NewTrack {
                name: t.name,
                number: t.number,
                audio_url: t.audio_url,
                length_secs: t.length_secs,
                downloadable: t.downloadable,
            })
            .collect(),
    });
    let (album, tracks) = state
        .catalog
        .album(album.id)
        .expect("album exists immediately after creation");
    HttpResponse::Created().json(album_response(&state, &album, &tracks))
}

#[utoipa::path(
    patch,
    path = "/albums/{id}",
    params(
        ("id" = u64, Path, description = "Album id")
    ),
    request_body = UpdateAlbumRequest,
    responses(
        (status = 200, description = "Album updated", body = AlbumResponse),
        (status = 401, description = "Admin authorization required", body = ErrorResponse),
        (status = 404, description = "Unknown album", body = ErrorResponse)
    )
)]
#[patch("/albums/{id}")]
/// Update an album; superseded media objects are deleted. Admin only.
pub async fn update_album(
    state: web::Data<AppState>,
    id: web::Path<u64>,
    req: HttpRequest,
    body: web::Json<UpdateAlbumRequest>,
) -> impl Responder {
    if state.auth.authorize(&req).is_none() {
        return unauthorized();
    }
    let body = body.into_inner();
    let patch = AlbumPatch {
        name: body.name,
        release_date: body.release_date,
        artwork_url: body.artwork_url,
        admin_only: body.admin_only,
        tracks: body.tracks.map(|tracks| {
            tracks
                .into_iter()
                .map(|t| TrackPatch {
                    id: t.id,
                    name: t.name,
                    number: t.number,
                    audio_url: t.audio_url,
                    length_secs: t.length_secs,
                    downloadable: t.downloadable,
                })
                .collect()
        }),
    };
    let album_id = id.into_inner();
    let Some((_, superseded)) = state.catalog.update_album(album_id, patch) else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "album not found".to_string(),
        });
    };
    cleanup_media(&state, superseded).await;
    let (album, tracks) = state
        .catalog
        .album(album_id)
        .expect("album exists immediately after update");
    HttpResponse::Ok().json(album_response(&state, &album, &tracks))
}

#[utoipa::path(
    delete,
    path = "/albums/{id}",
    params(
        ("id" = u64, Path, description = "Album id")
    ),
    responses(
        (status = 204, description = "Album deleted"),
        (status = 401, description = "Admin authorization required", body = ErrorResponse),
        (status = 404, description = "Unknown album", body = ErrorResponse)
    )
)]
#[delete("/albums/{id}")]
/// Delete an album, its tracks, and their media objects. Admin only.
pub async fn delete_album(
    state: web::Data<AppState>,
    id: web::Path<u64>,
    req: HttpRequest,
) -> impl Responder {
    if state.auth.authorize(&req).is_none() {
        return unauthorized();
    }
    let Some(media) = state.catalog.delete_album(id.into_inner()) else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "album not found".to_string(),
        });
    };
    cleanup_media(&state, media).await;
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{make_state, seed_album};
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};

    #[actix_web::test]
    async fn listings_hide_restricted_albums_from_anonymous_callers() {
        let (state, root) = make_state();
        seed_album(&state, "Public Album", false);
        seed_album(&state, "Hidden Album", true);

        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(list_albums)
                .service(get_album),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/albums").to_request())
            .await;
        let albums: Vec<serde_json::Value> = test::read_body_json(resp).await;
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0]["name"], "Public Album");

        let admin_req = test::TestRequest::get()
            .uri("/albums")
            .insert_header((header::AUTHORIZATION, "Bearer test-admin"))
            .to_request();
        let resp = test::call_service(&app, admin_req).await;
        let albums: Vec<serde_json::Value> = test::read_body_json(resp).await;
        assert_eq!(albums.len(), 2);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn artists_listing_nests_visible_albums() {
        let (state, root) = make_state();
        seed_album(&state, "Public Album", false);
        seed_album(&state, "Hidden Album", true);

        let app = test::init_service(App::new().app_data(state).service(list_artists)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/artists").to_request())
            .await;
        let artists: Vec<serde_json::Value> = test::read_body_json(resp).await;
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0]["name"], "Seeded Artist");
        let albums = artists[0]["albums"].as_array().unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0]["name"], "Public Album");

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn restricted_album_detail_is_404_without_auth() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Hidden Album", true);

        let app = test::init_service(App::new().app_data(state).service(get_album)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/albums/{album_id}"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/albums/{album_id}"))
                .insert_header((header::AUTHORIZATION, "Bearer test-admin"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn album_detail_carries_stream_urls() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Public Album", false);

        let app = test::init_service(App::new().app_data(state).service(get_album)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/albums/{album_id}"))
                .to_request(),
        )
        .await;
        let album: serde_json::Value = test::read_body_json(resp).await;
        let stream_url = album["tracks"][0]["stream_url"].as_str().unwrap();
        assert!(stream_url.starts_with("http://test.local/stream?url="));
        assert!(stream_url.contains("%2Fuploads%2F"));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn mutations_require_admin_token() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Public Album", false);

        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(create_album)
                .service(update_album)
                .service(delete_album),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/albums")
                .set_json(serde_json::json!({"artist_name": "A", "name": "B"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &app,
            test::TestRequest::patch()
                .uri(&format!("/albums/{album_id}"))
                .set_json(serde_json::json!({"name": "Renamed"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/albums/{album_id}"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn create_then_delete_album_removes_local_media() {
        let (state, root) = make_state();
        std::fs::create_dir_all(root.join("uploads")).unwrap();
        std::fs::write(root.join("uploads/new.wav"), b"audio").unwrap();

        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(create_album)
                .service(delete_album),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/albums")
                .insert_header((header::AUTHORIZATION, "Bearer test-admin"))
                .set_json(serde_json::json!({
                    "artist_name": "New Artist",
                    "name": "New Album",
                    "tracks": [
                        {"name": "Only Track", "number": 1, "audio_url": "/uploads/new.wav"}
                    ]
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let album: serde_json::Value = test::read_body_json(resp).await;
        let album_id = album["id"].as_u64().unwrap();

        let resp = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/albums/{album_id}"))
                .insert_header((header::AUTHORIZATION, "Bearer test-admin"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(!root.join("uploads/new.wav").exists());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn update_album_deletes_superseded_artwork() {
        let (state, root) = make_state();
        std::fs::create_dir_all(root.join("uploads")).unwrap();
        std::fs::write(root.join("uploads/art.png"), b"png").unwrap();
        let album_id = seed_album(&state, "Public Album", false);

        let app = test::init_service(App::new().app_data(state).service(update_album)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::patch()
                .uri(&format!("/albums/{album_id}"))
                .insert_header((header::AUTHORIZATION, "Bearer test-admin"))
                .set_json(serde_json::json!({"artwork_url": "/uploads/new-art.png"}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!root.join("uploads/art.png").exists());

        std::fs::remove_dir_all(&root).unwrap();
    }
}
