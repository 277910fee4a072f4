//! Hosts the single shared playback session.
//!
//! The session lives behind a mutex; handlers mutate it through
//! [`PlayerHost::with_session`]. Two pump threads bridge its crossbeam
//! channels onto the broadcast bus: decode commands flow out to the
//! connected player element, session events become status notifications.

use std::sync::{Arc, Mutex};

use playback_session::{ChannelPrimitive, DecodeError, DecodeSignal, PlaybackSession,
                       SessionEvent, SessionSnapshot, TrackRef};

use crate::events::EventBus;

#[derive(Clone)]
pub struct PlayerHost {
    session: Arc<Mutex<PlaybackSession>>,
    /// Album the current playlist was built from; track identity for the
    /// play-toggle check is (album, index), not source URL.
    active_album: Arc<Mutex<Option<u64>>>,
}

impl PlayerHost {
    pub fn new(events: EventBus) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let mut session = PlaybackSession::new(Box::new(ChannelPrimitive::new(cmd_tx)));
        let session_rx = session.subscribe();

        let command_bus = events.clone();
        std::thread::spawn(move || {
            for cmd in cmd_rx.iter() {
                command_bus.command(cmd);
            }
        });

        let status_bus = events;
        std::thread::spawn(move || {
            for event in session_rx.iter() {
                match event {
                    SessionEvent::PlaybackError { message } => {
                        tracing::warn!(message = %message, "playback error");
                        status_bus.error(message);
                    }
                    _ => status_bus.status_changed(),
                }
            }
        });

        Self {
            session: Arc::new(Mutex::new(session)),
            active_album: Arc::new(Mutex::new(None)),
        }
    }

    /// Run a closure against the locked session.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut PlaybackSession) -> T) -> T {
        let mut session = self.session.lock().unwrap();
        f(&mut session)
    }

    /// Replace the playlist with an album's tracks and start playing.
    pub fn start_album(
        &self,
        album_id: u64,
        tracks: Vec<TrackRef>,
        start_index: usize,
    ) -> Result<(), DecodeError> {
        let mut session = self.session.lock().unwrap();
        let result = session.set_playlist_and_play(tracks, start_index);
        *self.active_album.lock().unwrap() = if session.current_index().is_some() {
            Some(album_id)
        } else {
            None
        };
        result
    }

    /// True when `(album_id, track_index)` names the track the session is
    /// currently on. Duplicate source URLs within an album stay distinct.
    pub fn is_active_track(&self, album_id: u64, track_index: usize) -> bool {
        let session = self.session.lock().unwrap();
        *self.active_album.lock().unwrap() == Some(album_id)
            && session.current_index() == Some(track_index)
    }

    /// Stop playback and forget the active album.
    pub fn stop(&self) {
        self.session.lock().unwrap().clear_track();
        *self.active_album.lock().unwrap() = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().unwrap().snapshot()
    }

    pub fn apply_signal(&self, signal: DecodeSignal) {
        self.session.lock().unwrap().apply_signal(signal);
    }
}
