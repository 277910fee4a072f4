//! API request and response types.

use playback_session::{DecodeCommand, DecodeSignal, SignalKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An artist with their visible albums.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArtistResponse {
    pub id: u64,
    pub name: String,
    pub albums: Vec<AlbumSummary>,
}

/// An album row in catalog listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlbumSummary {
    pub id: u64,
    pub artist_id: u64,
    pub artist_name: String,
    pub name: String,
    pub release_date: Option<String>,
    pub artwork_url: Option<String>,
    pub admin_only: bool,
}

/// One album with its tracks in playback order.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlbumResponse {
    pub id: u64,
    pub artist_id: u64,
    pub artist_name: String,
    pub name: String,
    pub release_date: Option<String>,
    pub artwork_url: Option<String>,
    pub admin_only: bool,
    pub tracks: Vec<TrackResponse>,
}

/// One track with a ready-to-play stream URL.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrackResponse {
    pub id: u64,
    pub name: String,
    pub number: u32,
    /// Stored media URL, local or remote.
    pub audio_url: Option<String>,
    /// URL of the streaming endpoint for this track, absent when the track
    /// has no audio yet.
    pub stream_url: Option<String>,
    pub length_secs: Option<f64>,
    pub downloadable: bool,
}

/// Album creation payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAlbumRequest {
    pub artist_name: String,
    pub name: String,
    pub release_date: Option<String>,
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub admin_only: bool,
    #[serde(default)]
    pub tracks: Vec<TrackUpdate>,
}

/// Partial album update. Omitted fields are left unchanged; `tracks`
/// replaces the full track list when present.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAlbumRequest {
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub artwork_url: Option<String>,
    pub admin_only: Option<bool>,
    pub tracks: Option<Vec<TrackUpdate>>,
}

/// One track row in an album create or update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackUpdate {
    /// Existing track id; omit to add a new track.
    pub id: Option<u64>,
    pub name: String,
    pub number: u32,
    pub audio_url: Option<String>,
    pub length_secs: Option<f64>,
    #[serde(default = "default_true")]
    pub downloadable: bool,
}

fn default_true() -> bool {
    true
}

/// Start playback of an album at a track index.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayRequest {
    pub album_id: u64,
    /// Zero-based index into the album's track list.
    #[serde(default)]
    pub track_index: usize,
}

/// Seek within the current track.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SeekRequest {
    pub seconds: f64,
}

/// A signal reported by the connected player element.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignalRequest {
    /// Load generation the signal belongs to, from the matching `load`
    /// command.
    pub generation: u64,
    pub signal: SignalBody,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalBody {
    TimeUpdate { position_secs: f64 },
    MetadataLoaded { duration_secs: f64 },
    Ended,
    LoadError { message: String },
}

impl SignalRequest {
    pub fn into_signal(self) -> DecodeSignal {
        let kind = match self.signal {
            SignalBody::TimeUpdate { position_secs } => SignalKind::TimeUpdate(position_secs),
            SignalBody::MetadataLoaded { duration_secs } => {
                SignalKind::MetadataLoaded(duration_secs)
            }
            SignalBody::Ended => SignalKind::Ended,
            SignalBody::LoadError { message } => SignalKind::LoadError(message),
        };
        DecodeSignal {
            generation: self.generation,
            kind,
        }
    }
}

/// Current transport status of the shared player.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStatusResponse {
    /// `idle`, `playing`, or `paused`.
    pub state: String,
    /// Active playlist index, `-1` when idle.
    pub current_index: i64,
    pub track_title: Option<String>,
    pub source_url: Option<String>,
    pub position_secs: f64,
    pub duration_secs: Option<f64>,
    pub playlist_len: usize,
}

/// A freshly issued signed URL.
#[derive(Debug, Serialize, ToSchema)]
pub struct SignedUrlResponse {
    pub url: String,
}

/// Error body for JSON endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Serializable mirror of a decode command for the event stream.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandPayload {
    Load { source_url: String, generation: u64 },
    Play,
    Pause,
    Seek { position_secs: f64 },
    Stop,
}

impl From<DecodeCommand> for CommandPayload {
    fn from(cmd: DecodeCommand) -> Self {
        match cmd {
            DecodeCommand::Load {
                source_url,
                generation,
            } => CommandPayload::Load {
                source_url,
                generation,
            },
            DecodeCommand::Play => CommandPayload::Play,
            DecodeCommand::Pause => CommandPayload::Pause,
            DecodeCommand::Seek { position_secs } => CommandPayload::Seek { position_secs },
            DecodeCommand::Stop => CommandPayload::Stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_request_deserializes_tagged_body() {
        let req: SignalRequest = serde_json::from_str(
            r#"{"generation": 4, "signal": {"kind": "time_update", "position_secs": 12.5}}"#,
        )
        .unwrap();
        let signal = req.into_signal();
        assert_eq!(signal.generation, 4);
        assert_eq!(signal.kind, SignalKind::TimeUpdate(12.5));
    }

    #[test]
    fn command_payload_serializes_load() {
        let payload = CommandPayload::from(DecodeCommand::Load {
            source_url: "/stream?url=a.wav".to_string(),
            generation: 7,
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "load");
        assert_eq!(json["generation"], 7);
    }
}
