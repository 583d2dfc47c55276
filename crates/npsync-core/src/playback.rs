use async_trait::async_trait;

use crate::Result;

/// What the streaming service reports for the current user, read once per cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub track_name: String,
    pub artist_name: String,
    /// The service's own share link for the track.
    pub canonical_url: String,
    pub duration_ms: u64,
    pub progress_ms: u64,
}

/// Port for the streaming service ("what is playing right now").
///
/// `Ok(None)` means nothing is playing at all; a paused track is
/// `Some` with `is_playing == false`.
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>>;
}
