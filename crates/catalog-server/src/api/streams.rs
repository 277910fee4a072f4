//! Server-sent event stream for the connected player element.

use std::collections::VecDeque;
use std::time::Instant;

use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::{Error, HttpResponse, Responder, get, web};
use futures_util::{Stream, stream::unfold};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Duration, Interval, MissedTickBehavior};

use crate::events::PlayerBusEvent;
use crate::models::CommandPayload;
use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(15);

struct PlayerStreamState {
    state: web::Data<AppState>,
    receiver: broadcast::Receiver<PlayerBusEvent>,
    interval: Interval,
    pending: VecDeque<Bytes>,
    last_status: Option<String>,
    last_ping: Instant,
}

fn sse_event(event: &str, data: &str) -> Bytes {
    let mut payload = String::new();
    payload.push_str("event: ");
    payload.push_str(event);
    payload.push('\n');
    for line in data.lines() {
        payload.push_str("data: ");
        payload.push_str(line);
        payload.push('\n');
    }
    payload.push('\n');
    Bytes::from(payload)
}

fn push_ping_if_needed(pending: &mut VecDeque<Bytes>, last_ping: &mut Instant) {
    if pending.is_empty() && last_ping.elapsed() >= PING_INTERVAL {
        *last_ping = Instant::now();
        pending.push_back(Bytes::from(": ping\n\n"));
    }
}

fn sse_response<S>(stream: S) -> HttpResponse
where
    S: Stream<Item = Result<Bytes, Error>> + 'static,
{
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::CONNECTION, "keep-alive"))
        .streaming(stream)
}

fn status_json(state: &AppState) -> String {
    let snapshot = state.player.snapshot();
    serde_json::json!({
        "state": match snapshot.state {
            playback_session::SessionState::Idle => "idle",
            playback_session::SessionState::Playing => "playing",
            playback_session::SessionState::Paused => "paused",
        },
        "current_index": snapshot.current_index,
        "track_title": snapshot.track_title,
        "source_url": snapshot.source_url,
        "position_secs": snapshot.position_secs,
        "duration_secs": snapshot.duration_secs,
        "playlist_len": snapshot.playlist_len,
    })
    .to_string()
}

#[utoipa::path(
    get,
    path = "/player/stream",
    responses(
        (status = 200, description = "Player command and status event stream")
    )
)]
#[get("/player/stream")]
/// Stream decode commands and status updates via server-sent events.
///
/// The connected player element executes `command` events against its audio
/// pipeline and reports the outcome back through `POST /player/signal`.
pub async fn player_stream(state: web::Data<AppState>) -> impl Responder {
    let initial_json = status_json(&state);
    let mut pending = VecDeque::new();
    pending.push_back(sse_event("status", &initial_json));

    let mut interval = tokio::time::interval(Duration::from_secs(5));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let receiver = state.events.subscribe();

    let stream = unfold(
        PlayerStreamState {
            state: state.clone(),
            receiver,
            interval,
            pending,
            last_status: Some(initial_json),
            last_ping: Instant::now(),
        },
        |mut ctx| async move {
            loop {
                if let Some(bytes) = ctx.pending.pop_front() {
                    return Some((Ok::<Bytes, Error>(bytes), ctx));
                }

                let mut refresh = false;
                let event = tokio::select! {
                    _ = ctx.interval.tick() => None,
                    result = ctx.receiver.recv() => Some(result),
                };
                match event {
                    None => {}
                    Some(Ok(PlayerBusEvent::Command(cmd))) => {
                        let payload = CommandPayload::from(cmd);
                        let json = serde_json::to_string(&payload)
                            .unwrap_or_else(|_| "null".to_string());
                        ctx.pending.push_back(sse_event("command", &json));
                        refresh = true;
                    }
                    Some(Ok(PlayerBusEvent::StatusChanged)) => refresh = true,
                    Some(Ok(PlayerBusEvent::Error(message))) => {
                        let json = serde_json::json!({ "message": message }).to_string();
                        ctx.pending.push_back(sse_event("error", &json));
                        refresh = true;
                    }
                    Some(Err(RecvError::Lagged(_))) => refresh = true,
                    Some(Err(RecvError::Closed)) => return None,
                }

                if refresh {
                    let json = status_json(&ctx.state);
                    if ctx.last_status.as_deref() != Some(json.as_str()) {
                        ctx.last_status = Some(json.clone());
                        ctx.pending.push_back(sse_event("status", &json));
                    }
                }

                push_ping_if_needed(&mut ctx.pending, &mut ctx.last_ping);
            }
        },
    );

    sse_response(stream)
}
