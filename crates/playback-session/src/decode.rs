//! Decode-primitive abstraction.
//!
//! Implementations translate transport commands into whatever actually
//! decodes audio (a browser audio element, a codec pipeline). The session
//! observes the primitive through [`DecodeSignal`]s tagged with the load
//! generation they belong to.

use crossbeam_channel::Sender;

/// Commands dispatched to the decode primitive.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeCommand {
    Load { source_url: String, generation: u64 },
    Play,
    Pause,
    Seek { position_secs: f64 },
    Stop,
}

/// Errors returned when a command cannot reach the primitive.
#[derive(Debug)]
pub enum DecodeError {
    Offline,
}

/// Transport interface the session drives.
pub trait DecodePrimitive: Send {
    fn load(&self, source_url: &str, generation: u64) -> Result<(), DecodeError>;
    fn play(&self) -> Result<(), DecodeError>;
    fn pause(&self) -> Result<(), DecodeError>;
    fn seek(&self, position_secs: f64) -> Result<(), DecodeError>;
    fn stop(&self) -> Result<(), DecodeError>;
}

/// Signals reported back by the decode primitive.
///
/// `generation` identifies which load the signal belongs to; the session
/// drops signals from abandoned loads.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeSignal {
    pub generation: u64,
    pub kind: SignalKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SignalKind {
    /// Playback position moved (seconds into the current track).
    TimeUpdate(f64),
    /// Track metadata became available (duration in seconds).
    MetadataLoaded(f64),
    /// The current track finished.
    Ended,
    /// The source could not be loaded or decoded.
    LoadError(String),
}

/// Decode primitive backed by a command channel.
pub struct ChannelPrimitive {
    cmd_tx: Sender<DecodeCommand>,
}

impl ChannelPrimitive {
    pub fn new(cmd_tx: Sender<DecodeCommand>) -> Self {
        Self { cmd_tx }
    }

    fn send(&self, cmd: DecodeCommand) -> Result<(), DecodeError> {
        self.cmd_tx.send(cmd).map_err(|_| DecodeError::Offline)
    }
}

impl DecodePrimitive for ChannelPrimitive {
    fn load(&self, source_url: &str, generation: u64) -> Result<(), DecodeError> {
        self.send(DecodeCommand::Load {
            source_url: source_url.to_string(),
            generation,
        })
    }

    fn play(&self) -> Result<(), DecodeError> {
        self.send(DecodeCommand::Play)
    }

    fn pause(&self) -> Result<(), DecodeError> {
        self.send(DecodeCommand::Pause)
    }

    fn seek(&self, position_secs: f64) -> Result<(), DecodeError> {
        self.send(DecodeCommand::Seek { position_secs })
    }

    fn stop(&self) -> Result<(), DecodeError> {
        self.send(DecodeCommand::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn channel_primitive_forwards_commands() {
        let (tx, rx) = unbounded();
        let primitive = ChannelPrimitive::new(tx);

        primitive.load("/stream?url=a.wav", 3).unwrap();
        primitive.play().unwrap();
        primitive.seek(12.5).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            DecodeCommand::Load {
                source_url: "/stream?url=a.wav".to_string(),
                generation: 3,
            }
        );
        assert_eq!(rx.try_recv().unwrap(), DecodeCommand::Play);
        assert_eq!(
            rx.try_recv().unwrap(),
            DecodeCommand::Seek { position_secs: 12.5 }
        );
    }

    #[test]
    fn channel_primitive_reports_offline_when_receiver_dropped() {
        let (tx, rx) = unbounded();
        drop(rx);
        let primitive = ChannelPrimitive::new(tx);
        assert!(matches!(primitive.play(), Err(DecodeError::Offline)));
    }
}
