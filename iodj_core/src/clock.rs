//! Player state between the sdk's sparse state notifications.
//!
//! The sdk reports position only when something happens, so while playing
//! the position is advanced locally once per second from the last
//! authoritative value. Every resync starts a new epoch; ticks are tagged
//! with the epoch their timer was started in and stale ticks are dropped, so
//! an extrapolated value never overwrites a fresher reported one.

use std::time::Duration;

use tracing::trace;

use crate::emotion::{EmotionCoordinate, Palette};
use crate::types::{sdk::PlaybackSnapshot, PlayerState};

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Epoch(u64);

/// The playlist the player page is currently showing.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivePlaylist {
    pub id: String,
    pub name: String,
    pub emotion: Option<EmotionCoordinate>,
}

#[derive(Debug, Default)]
pub struct PositionClock {
    state: PlayerState,
    /// position reported by the last resync
    anchor: Duration,
    ticks: u32,
    epoch: Epoch,
    playlist: Option<ActivePlaylist>,
}

impl PositionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn active_playlist(&self) -> Option<&ActivePlaylist> {
        self.playlist.as_ref()
    }

    pub fn palette(&self) -> Palette {
        self.playlist
            .as_ref()
            .and_then(|p| p.emotion)
            .map(|e| e.palette())
            .unwrap_or_default()
    }

    /// Whether a one second ticker should be running.
    pub fn is_ticking(&self) -> bool {
        self.state.is_playing && self.state.current_track.is_some()
    }

    /// Applies an sdk notification. `None` leaves the state as it was.
    /// Returns the new epoch when the state was replaced.
    pub fn resync(&mut self, snapshot: Option<&PlaybackSnapshot>) -> Option<Epoch> {
        let snapshot = snapshot?;
        self.state = PlayerState::from(snapshot);
        Some(self.restart())
    }

    /// Advances the local position by one tick, unless the tick belongs to
    /// an older epoch or playback is stopped.
    pub fn tick(&mut self, epoch: Epoch) -> bool {
        if epoch != self.epoch {
            trace!(?epoch, current = ?self.epoch, "dropping stale tick");
            return false;
        }
        if !self.is_ticking() {
            return false;
        }
        self.ticks = self.ticks.saturating_add(1);
        self.state.position = (self.anchor + TICK * self.ticks).min(self.state.duration);
        true
    }

    /// Optimistic update after a seek was issued.
    pub fn seek(&mut self, position: Duration) -> Epoch {
        self.state.position = position.min(self.state.duration);
        self.restart()
    }

    /// Optimistic update after play/pause was toggled.
    pub fn set_playing(&mut self, playing: bool) -> Epoch {
        self.state.is_playing = playing;
        self.restart()
    }

    /// Switching to a different playlist starts its position from zero.
    pub fn set_active_playlist(&mut self, playlist: ActivePlaylist) -> Epoch {
        let changed = self.playlist.as_ref().map(|p| &p.name) != Some(&playlist.name);
        self.playlist = Some(playlist);
        if changed {
            self.state.position = Duration::ZERO;
        }
        self.restart()
    }

    /// Clears all state, e.g. on logout.
    pub fn reset(&mut self) -> Epoch {
        self.state = PlayerState::default();
        self.playlist = None;
        self.restart()
    }

    fn restart(&mut self) -> Epoch {
        self.anchor = self.state.position;
        self.ticks = 0;
        self.epoch = Epoch(self.epoch.0.wrapping_add(1));
        self.epoch
    }
}
