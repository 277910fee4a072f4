//! Transport state machine for the shared player.
//!
//! All operations take `&mut self`, so transitions apply strictly in call
//! order and the last writer wins. The session issues commands to the decode
//! primitive and returns immediately; position and duration arrive later as
//! signals and are dropped when they belong to an abandoned load.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::decode::{DecodeError, DecodePrimitive, DecodeSignal, SignalKind};
use crate::playlist::{Playlist, TrackRef};

/// Transport status of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Playing,
    Paused,
}

/// Events published to session observers.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    TrackChanged {
        index: usize,
        title: String,
        source_url: String,
    },
    StateChanged {
        playing: bool,
    },
    Position {
        position_secs: f64,
        duration_secs: Option<f64>,
    },
    PlaybackError {
        message: String,
    },
    Cleared,
}

/// Point-in-time view of the session for status reporting.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Active playlist index, `-1` when idle.
    pub current_index: i64,
    pub track_title: Option<String>,
    pub source_url: Option<String>,
    pub position_secs: f64,
    pub duration_secs: Option<f64>,
    pub playlist_len: usize,
}

pub struct PlaybackSession {
    playlist: Playlist,
    state: SessionState,
    position_secs: f64,
    duration_secs: Option<f64>,
    generation: u64,
    decode: Box<dyn DecodePrimitive>,
    observers: Vec<Sender<SessionEvent>>,
}

impl PlaybackSession {
    pub fn new(decode: Box<dyn DecodePrimitive>) -> Self {
        Self {
            playlist: Playlist::default(),
            state: SessionState::Idle,
            position_secs: 0.0,
            duration_secs: None,
            generation: 0,
            decode,
            observers: Vec::new(),
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = unbounded();
        self.observers.push(tx);
        rx
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn current_index(&self) -> Option<usize> {
        self.playlist.current_index()
    }

    /// Generation of the most recent load; signals tagged with an older
    /// generation are ignored.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let track = self.playlist.current_track();
        SessionSnapshot {
            state: self.state,
            current_index: self
                .playlist
                .current_index()
                .map(|i| i as i64)
                .unwrap_or(-1),
            track_title: track.map(|t| t.title.clone()),
            source_url: track.map(|t| t.source_url.clone()),
            position_secs: self.position_secs,
            duration_secs: self.duration_secs,
            playlist_len: self.playlist.len(),
        }
    }

    /// Replace the playlist and start playing at `start_index`.
    ///
    /// The only operation that changes track identity arbitrarily. Bumps the
    /// load generation, so pending signals from the previous source are
    /// discarded.
    pub fn set_playlist_and_play(
        &mut self,
        tracks: Vec<TrackRef>,
        start_index: usize,
    ) -> Result<(), DecodeError> {
        if self.playlist.replace(tracks, start_index).is_none() {
            self.clear_track();
            return Ok(());
        }
        self.start_current()
    }

    /// Pause playback. No-op unless playing.
    pub fn pause(&mut self) -> Result<(), DecodeError> {
        if self.state != SessionState::Playing {
            return Ok(());
        }
        self.decode.pause()?;
        self.state = SessionState::Paused;
        self.emit(SessionEvent::StateChanged { playing: false });
        Ok(())
    }

    /// Resume playback. No-op unless paused.
    pub fn resume(&mut self) -> Result<(), DecodeError> {
        if self.state != SessionState::Paused {
            return Ok(());
        }
        self.decode.play()?;
        self.state = SessionState::Playing;
        self.emit(SessionEvent::StateChanged { playing: true });
        Ok(())
    }

    /// Advance to the next track with wraparound; an empty playlist goes
    /// idle instead.
    pub fn play_next(&mut self) -> Result<(), DecodeError> {
        if self.playlist.advance().is_none() {
            self.clear_track();
            return Ok(());
        }
        self.start_current()
    }

    /// Step back to the previous track with wraparound; an empty playlist
    /// goes idle instead.
    pub fn play_previous(&mut self) -> Result<(), DecodeError> {
        if self.playlist.retreat().is_none() {
            self.clear_track();
            return Ok(());
        }
        self.start_current()
    }

    /// Seek within the current track. No-op when idle.
    pub fn seek(&mut self, position_secs: f64) -> Result<(), DecodeError> {
        if self.state == SessionState::Idle {
            return Ok(());
        }
        let target = match self.duration_secs {
            Some(duration) => position_secs.clamp(0.0, duration),
            None => position_secs.max(0.0),
        };
        self.decode.seek(target)?;
        self.position_secs = target;
        self.emit(SessionEvent::Position {
            position_secs: target,
            duration_secs: self.duration_secs,
        });
        Ok(())
    }

    /// Stop playback and discard the playlist.
    pub fn clear_track(&mut self) {
        let _ = self.decode.stop();
        self.playlist.clear();
        self.state = SessionState::Idle;
        self.position_secs = 0.0;
        self.duration_secs = None;
        // Invalidate any in-flight load.
        self.generation = self.generation.wrapping_add(1);
        self.emit(SessionEvent::Cleared);
    }

    /// Apply a signal from the decode primitive.
    ///
    /// Signals whose generation does not match the current load are stale
    /// and dropped; a track switch always wins over an in-flight tick.
    pub fn apply_signal(&mut self, signal: DecodeSignal) {
        if signal.generation != self.generation {
            tracing::debug!(
                signal_generation = signal.generation,
                current_generation = self.generation,
                "dropping stale decode signal"
            );
            return;
        }
        match signal.kind {
            SignalKind::TimeUpdate(position_secs) => {
                if self.state == SessionState::Idle {
                    return;
                }
                self.position_secs = match self.duration_secs {
                    Some(duration) => position_secs.clamp(0.0, duration),
                    None => position_secs.max(0.0),
                };
                self.emit(SessionEvent::Position {
                    position_secs: self.position_secs,
                    duration_secs: self.duration_secs,
                });
            }
            SignalKind::MetadataLoaded(duration_secs) => {
                self.duration_secs = Some(duration_secs);
                if self.position_secs > duration_secs {
                    self.position_secs = duration_secs;
                }
                self.emit(SessionEvent::Position {
                    position_secs: self.position_secs,
                    duration_secs: self.duration_secs,
                });
            }
            SignalKind::Ended => {
                // Same wraparound as play_next: a one-track playlist loops.
                if let Err(e) = self.play_next() {
                    tracing::warn!(error = ?e, "auto-advance dispatch failed");
                    self.force_paused();
                }
            }
            SignalKind::LoadError(message) => {
                tracing::warn!(message = %message, "decode primitive failed to load source");
                self.force_paused();
                self.emit(SessionEvent::PlaybackError { message });
            }
        }
    }

    fn start_current(&mut self) -> Result<(), DecodeError> {
        let (index, title, source_url) = match self.playlist.current_track() {
            Some(track) => (
                self.playlist.current_index().unwrap_or(0),
                track.title.clone(),
                track.source_url.clone(),
            ),
            None => return Ok(()),
        };
        self.generation = self.generation.wrapping_add(1);
        self.position_secs = 0.0;
        self.duration_secs = None;
        if let Err(e) = self
            .decode
            .load(&source_url, self.generation)
            .and_then(|()| self.decode.play())
        {
            self.force_paused();
            return Err(e);
        }
        self.state = SessionState::Playing;
        self.emit(SessionEvent::TrackChanged {
            index,
            title,
            source_url,
        });
        self.emit(SessionEvent::StateChanged { playing: true });
        Ok(())
    }

    /// A failed load must never leave `is_playing` true while nothing
    /// advances.
    fn force_paused(&mut self) {
        if self.state == SessionState::Playing {
            self.state = SessionState::Paused;
            self.emit(SessionEvent::StateChanged { playing: false });
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
