//! Shared player control endpoints.
//!
//! One playback session serves every client. Control requests mutate it,
//! signal reports feed it, and the event stream broadcasts the resulting
//! commands to whichever player element is connected.

use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use playback_session::{DecodeError, SessionState, TrackRef};

use crate::media::build_stream_url;
use crate::models::{ErrorResponse, PlayRequest, PlayerStatusResponse, SeekRequest, SignalRequest};
use crate::state::AppState;

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::Playing => "playing",
        SessionState::Paused => "paused",
    }
}

fn status_response(state: &AppState) -> PlayerStatusResponse {
    let snapshot = state.player.snapshot();
    PlayerStatusResponse {
        state: state_label(snapshot.state).to_string(),
        current_index: snapshot.current_index,
        track_title: snapshot.track_title,
        source_url: snapshot.source_url,
        position_secs: snapshot.position_secs,
        duration_secs: snapshot.duration_secs,
        playlist_len: snapshot.playlist_len,
    }
}

fn dispatch_failed(err: DecodeError) -> HttpResponse {
    tracing::warn!(error = ?err, "player command dispatch failed");
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "player unavailable".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/player/play",
    request_body = PlayRequest,
    responses(
        (status = 200, description = "Playback started or toggled", body = PlayerStatusResponse),
        (status = 400, description = "Track index out of bounds", body = ErrorResponse),
        (status = 404, description = "Unknown or restricted album", body = ErrorResponse)
    )
)]
#[post("/player/play")]
/// Play a track from an album. Selecting the already-active track toggles
/// pause/resume instead of restarting it.
pub async fn play(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<PlayRequest>,
) -> impl Responder {
    let Some((album, tracks)) = state.catalog.album(body.album_id) else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "album not found".to_string(),
        });
    };
    if album.admin_only && state.auth.authorize(&req).is_none() {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: "album not found".to_string(),
        });
    }

    if body.track_index >= tracks.len() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "track index out of bounds".to_string(),
        });
    }

    // The playlist mirrors the album listing position by position, so
    // `track_index` means the same thing here as in GET /albums/{id}.
    // Tracks without audio load an empty source and surface a load error.
    let playlist: Vec<TrackRef> = tracks
        .iter()
        .map(|t| TrackRef {
            title: t.name.clone(),
            source_url: t
                .audio_url
                .as_deref()
                .map(|url| build_stream_url(&state.public_base_url, url))
                .unwrap_or_default(),
        })
        .collect();

    // The active track twice is a transport toggle, not a restart.
    let result = if state.player.is_active_track(body.album_id, body.track_index) {
        state.player.with_session(|session| match session.state() {
            SessionState::Playing => session.pause(),
            SessionState::Paused => session.resume(),
            SessionState::Idle => session.set_playlist_and_play(playlist, body.track_index),
        })
    } else {
        state
            .player
            .start_album(body.album_id, playlist, body.track_index)
    };
    match result {
        Ok(()) => HttpResponse::Ok().json(status_response(&state)),
        Err(err) => dispatch_failed(err),
    }
}

#[utoipa::path(
    post,
    path = "/player/pause",
    responses(
        (status = 200, description = "Paused", body = PlayerStatusResponse)
    )
)]
#[post("/player/pause")]
/// Pause playback. No-op unless playing.
pub async fn pause(state: web::Data<AppState>) -> impl Responder {
    match state.player.with_session(|s| s.pause()) {
        Ok(()) => HttpResponse::Ok().json(status_response(&state)),
        Err(err) => dispatch_failed(err),
    }
}

#[utoipa::path(
    post,
    path = "/player/resume",
    responses(
        (status = 200, description = "Resumed", body = PlayerStatusResponse)
    )
)]
#[post("/player/resume")]
/// Resume playback. No-op unless paused.
pub async fn resume(state: web::Data<AppState>) -> impl Responder {
    match state.player.with_session(|s| s.resume()) {
        Ok(()) => HttpResponse::Ok().json(status_response(&state)),
        Err(err) => dispatch_failed(err),
    }
}

#[utoipa::path(
    post,
    path = "/player/next",
    responses(
        (status = 200, description = "Advanced to the next track", body = PlayerStatusResponse)
    )
)]
#[post("/player/next")]
/// Advance to the next track, wrapping at the end of the playlist.
pub async fn next(state: web::Data<AppState>) -> impl Responder {
    match state.player.with_session(|s| s.play_next()) {
        Ok(()) => HttpResponse::Ok().json(status_response(&state)),
        Err(err) => dispatch_failed(err),
    }
}

#[utoipa::path(
    post,
    path = "/player/previous",
    responses(
        (status = 200, description = "Stepped to the previous track", body = PlayerStatusResponse)
    )
)]
#[post("/player/previous")]
/// Step back to the previous track, wrapping at the start of the playlist.
pub async fn previous(state: web::Data<AppState>) -> impl Responder {
    match state.player.with_session(|s| s.play_previous()) {
        Ok(()) => HttpResponse::Ok().json(status_response(&state)),
        Err(err) => dispatch_failed(err),
    }
}

#[utoipa::path(
    post,
    path = "/player/seek",
    request_body = SeekRequest,
    responses(
        (status = 200, description = "Seek dispatched", body = PlayerStatusResponse)
    )
)]
#[post("/player/seek")]
/// Seek within the current track. No-op when idle.
pub async fn seek(state: web::Data<AppState>, body: web::Json<SeekRequest>) -> impl Responder {
    match state.player.with_session(|s| s.seek(body.seconds)) {
        Ok(()) => HttpResponse::Ok().json(status_response(&state)),
        Err(err) => dispatch_failed(err),
    }
}

#[utoipa::path(
    post,
    path = "/player/stop",
    responses(
        (status = 200, description = "Playback stopped and playlist cleared", body = PlayerStatusResponse)
    )
)]
#[post("/player/stop")]
/// Stop playback and clear the playlist.
pub async fn stop(state: web::Data<AppState>) -> impl Responder {
    state.player.stop();
    HttpResponse::Ok().json(status_response(&state))
}

#[utoipa::path(
    get,
    path = "/player/status",
    responses(
        (status = 200, description = "Current player status", body = PlayerStatusResponse)
    )
)]
#[get("/player/status")]
/// Current transport status of the shared player.
pub async fn status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(status_response(&state))
}

#[utoipa::path(
    post,
    path = "/player/signal",
    request_body = SignalRequest,
    responses(
        (status = 200, description = "Signal applied", body = PlayerStatusResponse)
    )
)]
#[post("/player/signal")]
/// Apply a decode signal reported by the connected player element.
/// Signals from abandoned loads are dropped by generation.
pub async fn signal(state: web::Data<AppState>, body: web::Json<SignalRequest>) -> impl Responder {
    state.player.apply_signal(body.into_inner().into_signal());
    HttpResponse::Ok().json(status_response(&state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{make_state, seed_album};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    macro_rules! play_track {
        ($app:expr, $album_id:expr, $track_index:expr) => {{
            let resp = test::call_service(
                $app,
                test::TestRequest::post()
                    .uri("/player/play")
                    .set_json(
                        serde_json::json!({"album_id": $album_id, "track_index": $track_index}),
                    )
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
            let status_json: serde_json::Value = test::read_body_json(resp).await;
            status_json
        }};
    }

    #[actix_web::test]
    async fn play_starts_playback_at_requested_index() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Public Album", false);

        let app = test::init_service(App::new().app_data(state).service(play)).await;
        let status_json = play_track!(&app, album_id, 1);

        assert_eq!(status_json["state"], "playing");
        assert_eq!(status_json["current_index"], 1);
        assert_eq!(status_json["playlist_len"], 2);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn play_same_track_toggles_pause_and_resume() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Public Album", false);

        let app = test::init_service(App::new().app_data(state).service(play)).await;
        let status_json = play_track!(&app, album_id, 0);
        assert_eq!(status_json["state"], "playing");

        let status_json = play_track!(&app, album_id, 0);
        assert_eq!(status_json["state"], "paused");

        let status_json = play_track!(&app, album_id, 0);
        assert_eq!(status_json["state"], "playing");

        std::fs::remove_dir_all(&root).unwrap();
    }

    fn album_with_tracks(
        state: &actix_web::web::Data<crate::state::AppState>,
        tracks: Vec<(&str, Option<&str>)>,
    ) -> u64 {
        use crate::catalog::{NewAlbum, NewTrack};
        let album = state.catalog.create_album(NewAlbum {
            artist_name: "Custom Artist".to_string(),
            name: "Custom Album".to_string(),
            release_date: None,
            artwork_url: None,
            admin_only: false,
            tracks: tracks
                .into_iter()
                .enumerate()
                .map(|(i, (name, audio_url))| NewTrack {
                    name: name.to_string(),
                    number: i as u32 + 1,
                    audio_url: audio_url.map(|u| u.to_string()),
                    length_secs: None,
                    downloadable: true,
                })
                .collect(),
        });
        album.id
    }

    #[actix_web::test]
    async fn play_indexes_into_the_full_track_list() {
        let (state, root) = make_state();
        let album_id = album_with_tracks(
            &state,
            vec![
                ("Listing Only", None),
                ("Closer", Some("/uploads/closer.wav")),
            ],
        );

        let app = test::init_service(App::new().app_data(state).service(play)).await;
        let status_json = play_track!(&app, album_id, 1);

        assert_eq!(status_json["state"], "playing");
        assert_eq!(status_json["current_index"], 1);
        assert_eq!(status_json["track_title"], "Closer");
        assert_eq!(status_json["playlist_len"], 2);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn play_switches_between_tracks_sharing_a_source() {
        let (state, root) = make_state();
        let album_id = album_with_tracks(
            &state,
            vec![
                ("Take One", Some("/uploads/take.wav")),
                ("Take Two", Some("/uploads/take.wav")),
            ],
        );

        let app = test::init_service(App::new().app_data(state).service(play)).await;
        let status_json = play_track!(&app, album_id, 0);
        assert_eq!(status_json["current_index"], 0);

        // Duplicate source URLs stay distinct tracks: this switches, it
        // does not toggle pause on the first take.
        let status_json = play_track!(&app, album_id, 1);
        assert_eq!(status_json["state"], "playing");
        assert_eq!(status_json["current_index"], 1);
        assert_eq!(status_json["track_title"], "Take Two");

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn play_rejects_out_of_bounds_index() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Public Album", false);

        let app = test::init_service(App::new().app_data(state).service(play)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/player/play")
                .set_json(serde_json::json!({"album_id": album_id, "track_index": 99}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn play_restricted_album_is_404_without_auth() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Hidden Album", true);

        let app = test::init_service(App::new().app_data(state).service(play)).await;
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/player/play")
                .set_json(serde_json::json!({"album_id": album_id, "track_index": 0}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn next_and_previous_wrap_around() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Public Album", false);

        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(play)
                .service(next)
                .service(previous),
        )
        .await;
        play_track!(&app, album_id, 1);

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/player/next").to_request(),
        )
        .await;
        let status_json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(status_json["current_index"], 0);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/player/previous")
                .to_request(),
        )
        .await;
        let status_json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(status_json["current_index"], 1);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn stop_returns_player_to_idle() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Public Album", false);

        let app = test::init_service(
            App::new().app_data(state).service(play).service(stop),
        )
        .await;
        play_track!(&app, album_id, 0);

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/player/stop").to_request(),
        )
        .await;
        let status_json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(status_json["state"], "idle");
        assert_eq!(status_json["current_index"], -1);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn signal_updates_position_and_drops_stale_generations() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Public Album", false);
        let player = state.player.clone();

        let app = test::init_service(
            App::new().app_data(state).service(play).service(signal),
        )
        .await;
        play_track!(&app, album_id, 0);
        let generation = player.with_session(|s| s.generation());

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/player/signal")
                .set_json(serde_json::json!({
                    "generation": generation,
                    "signal": {"kind": "time_update", "position_secs": 42.0}
                }))
                .to_request(),
        )
        .await;
        let status_json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(status_json["position_secs"], 42.0);

        // A signal from a previous load changes nothing.
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/player/signal")
                .set_json(serde_json::json!({
                    "generation": generation - 1,
                    "signal": {"kind": "time_update", "position_secs": 7.0}
                }))
                .to_request(),
        )
        .await;
        let status_json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(status_json["position_secs"], 42.0);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[actix_web::test]
    async fn ended_signal_auto_advances() {
        let (state, root) = make_state();
        let album_id = seed_album(&state, "Public Album", false);
        let player = state.player.clone();

        let app = test::init_service(
            App::new().app_data(state).service(play).service(signal),
        )
        .await;
        play_track!(&app, album_id, 0);
        let generation = player.with_session(|s| s.generation());

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/player/signal")
                .set_json(serde_json::json!({
                    "generation": generation,
                    "signal": {"kind": "ended"}
                }))
                .to_request(),
        )
        .await;
        let status_json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(status_json["state"], "playing");
        assert_eq!(status_json["current_index"], 1);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
