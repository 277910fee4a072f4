//! Playback session state machine.
//!
//! Owns the playlist and transport status ("what is playing"), drives an
//! external decode primitive, and applies generation-tagged signals coming
//! back from it. The session never decodes audio itself.

pub mod decode;
pub mod playlist;
pub mod session;

pub use decode::{
    ChannelPrimitive, DecodeCommand, DecodeError, DecodePrimitive, DecodeSignal, SignalKind,
};
pub use playlist::{Playlist, TrackRef};
pub use session::{PlaybackSession, SessionEvent, SessionSnapshot, SessionState};
