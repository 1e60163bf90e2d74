//! Best-effort synchronization of an external player with textual timestamps.

use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::error::Result;
use crate::timecode;

/// Seek capability exposed by the embedded playback widget.
pub trait Player: Send + Sync {
    fn seek(&self, seconds: u32);
}

/// Translates `"mm:ss"` timestamps into seek commands.
///
/// The player slot may be empty (widget not mounted yet, or torn down);
/// seeking without a player is a silent no-op rather than an error.
#[derive(Default)]
pub struct PlaybackSync {
    player: RwLock<Option<Arc<dyn Player>>>,
}

impl PlaybackSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, player: Arc<dyn Player>) {
        *self.player.write().expect("player slot poisoned") = Some(player);
    }

    pub fn detach(&self) {
        *self.player.write().expect("player slot poisoned") = None;
    }

    /// Seek the attached player to the position named by `timestamp`.
    ///
    /// A malformed timestamp is an error; an unready player is not.
    pub fn seek(&self, timestamp: &str) -> Result<()> {
        let seconds = timecode::parse_timestamp(timestamp)?;
        match &*self.player.read().expect("player slot poisoned") {
            Some(player) => player.seek(seconds),
            None => debug!("No player attached, ignoring seek to {}", timestamp),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPlayer {
        seeks: Mutex<Vec<u32>>,
    }

    impl Player for RecordingPlayer {
        fn seek(&self, seconds: u32) {
            self.seeks.lock().unwrap().push(seconds);
        }
    }

    #[test]
    fn seeks_attached_player() {
        let sync = PlaybackSync::new();
        let player = Arc::new(RecordingPlayer::default());
        sync.attach(player.clone());

        sync.seek("01:30").unwrap();
        sync.seek("00:07").unwrap();

        assert_eq!(*player.seeks.lock().unwrap(), vec![90, 7]);
    }

    #[test]
    fn seek_without_player_is_a_no_op() {
        let sync = PlaybackSync::new();
        assert!(sync.seek("01:30").is_ok());
    }

    #[test]
    fn detached_player_receives_nothing() {
        let sync = PlaybackSync::new();
        let player = Arc::new(RecordingPlayer::default());
        sync.attach(player.clone());
        sync.detach();

        sync.seek("00:10").unwrap();
        assert!(player.seeks.lock().unwrap().is_empty());
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let sync = PlaybackSync::new();
        assert!(sync.seek("nonsense").is_err());
    }
}
