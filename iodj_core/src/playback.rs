//! Playback bridge over the vendor's in-browser player.
//!
//! The sdk is reached only through [`PlaybackSession`]; starting a context
//! and moving playback between devices goes through the REST api behind
//! [`RemotePlayback`]. Every transport control needs a connected session and
//! a device id announced by the sdk's `ready` event. Without them the call
//! is a logged no-op that returns a precondition error.

use std::{cell::RefCell, rc::Rc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Epoch, PositionClock};
use crate::error::{PlaybackError, ServiceResult};
use crate::types::sdk::{DevicePayload, PlaybackSnapshot};

#[repr(transparent)]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Notifications the sdk pushes at the bridge.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Ready(DeviceId),
    NotReady(DeviceId),
    /// `None` means the sdk has no active playback.
    StateChanged(Option<PlaybackSnapshot>),
}

impl From<DevicePayload> for DeviceId {
    fn from(payload: DevicePayload) -> Self {
        DeviceId(payload.device_id)
    }
}

/// One vendor player instance. Futures are not `Send`: the sdk lives on the
/// browser's event loop.
#[async_trait(?Send)]
pub trait PlaybackSession {
    /// Returns whether the sdk accepted the connection.
    async fn connect(&self) -> Result<bool, PlaybackError>;
    async fn pause(&self) -> Result<(), PlaybackError>;
    async fn resume(&self) -> Result<(), PlaybackError>;
    async fn next_track(&self) -> Result<(), PlaybackError>;
    async fn previous_track(&self) -> Result<(), PlaybackError>;
    async fn seek(&self, position: Duration) -> Result<(), PlaybackError>;
    async fn set_volume(&self, volume: f32) -> Result<(), PlaybackError>;
    async fn current_state(&self) -> Result<Option<PlaybackSnapshot>, PlaybackError>;
    fn disconnect(&self);
}

/// The REST half of playback control.
#[async_trait(?Send)]
pub trait RemotePlayback {
    async fn transfer_playback(&self, device: &DeviceId, play: bool) -> ServiceResult<()>;
    async fn start_playback(&self, device: &DeviceId, context_uri: &str) -> ServiceResult<()>;
}

pub fn playlist_context_uri(playlist_id: &str) -> String {
    if playlist_id.starts_with("spotify:") {
        playlist_id.to_owned()
    } else {
        format!("spotify:playlist:{playlist_id}")
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

struct Inner<S, R> {
    session: RefCell<Option<Rc<S>>>,
    device: RefCell<Option<DeviceId>>,
    remote: R,
}

/// Cheap to clone; clones share the same session and device.
pub struct PlaybackBridge<S, R> {
    inner: Rc<Inner<S, R>>,
}

impl<S, R> Clone for PlaybackBridge<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: PlaybackSession, R: RemotePlayback> PlaybackBridge<S, R> {
    pub fn new(remote: R) -> Self {
        Self {
            inner: Rc::new(Inner {
                session: RefCell::new(None),
                device: RefCell::new(None),
                remote,
            }),
        }
    }

    /// Connects `session` and keeps it. Only one session is held per bridge.
    pub async fn connect(&self, session: S) -> Result<(), PlaybackError> {
        if self.inner.session.borrow().is_some() {
            warn!("refusing to connect a second player session");
            return Err(PlaybackError::SessionExists);
        }
        if !session.connect().await? {
            warn!("player session refused to connect");
            return Err(PlaybackError::ConnectFailed);
        }
        info!("player session connected");
        *self.inner.session.borrow_mut() = Some(Rc::new(session));
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.inner.session.borrow().is_some()
    }

    pub fn device(&self) -> Option<DeviceId> {
        self.inner.device.borrow().clone()
    }

    /// Records the device and moves playback onto it without starting it.
    pub async fn device_ready(&self, device: DeviceId) -> Result<(), PlaybackError> {
        info!(device = %device.as_str(), "playback device ready");
        *self.inner.device.borrow_mut() = Some(device.clone());
        self.inner.remote.transfer_playback(&device, false).await?;
        debug!(device = %device.as_str(), "playback transferred");
        Ok(())
    }

    pub fn device_lost(&self, device: &DeviceId) {
        let mut current = self.inner.device.borrow_mut();
        if current.as_ref() == Some(device) {
            warn!(device = %device.as_str(), "playback device went offline");
            *current = None;
        }
    }

    /// Drops the session and forgets the device.
    pub fn disconnect(&self) {
        *self.inner.device.borrow_mut() = None;
        // the sdk may call back into the bridge while disconnecting
        let session = self.inner.session.borrow_mut().take();
        if let Some(session) = session {
            session.disconnect();
        }
    }

    pub async fn play(&self, context_uri: &str) -> Result<(), PlaybackError> {
        let device = self.ready_device("play")?;
        info!(context = %context_uri, "starting playback");
        self.inner.remote.start_playback(&device, context_uri).await?;
        Ok(())
    }

    pub async fn play_playlist(&self, playlist_id: &str) -> Result<(), PlaybackError> {
        self.play(&playlist_context_uri(playlist_id)).await
    }

    pub async fn pause(&self) -> Result<(), PlaybackError> {
        self.ready_session("pause")?.pause().await
    }

    pub async fn resume(&self) -> Result<(), PlaybackError> {
        self.ready_session("resume")?.resume().await
    }

    /// Returns whether playback is running afterwards.
    pub async fn toggle_play_pause(&self) -> Result<bool, PlaybackError> {
        let session = self.ready_session("toggle playback")?;
        let Some(state) = session.current_state().await? else {
            warn!("cannot toggle playback, the player has no current state");
            return Err(PlaybackError::NoActiveState);
        };
        if state.paused {
            session.resume().await?;
            debug!("playback resumed");
            Ok(true)
        } else {
            session.pause().await?;
            debug!("playback paused");
            Ok(false)
        }
    }

    pub async fn skip_next(&self) -> Result<(), PlaybackError> {
        self.ready_session("skip to next track")?.next_track().await
    }

    pub async fn skip_previous(&self) -> Result<(), PlaybackError> {
        self.ready_session("skip to previous track")?
            .previous_track()
            .await
    }

    pub async fn seek(&self, position: Duration) -> Result<(), PlaybackError> {
        let session = self.ready_session("seek")?;
        debug!(seconds = position.as_secs(), "seeking");
        session.seek(position).await
    }

    /// `volume` is clamped to `0..=1`.
    pub async fn set_volume(&self, volume: f32) -> Result<(), PlaybackError> {
        let session = self.ready_session("set volume")?;
        let volume = clamp_volume(volume);
        debug!(volume, "setting volume");
        session.set_volume(volume).await
    }

    /// Fails with the precondition error a control would hit right now.
    pub fn ensure_ready(&self, action: &str) -> Result<(), PlaybackError> {
        self.ready_session(action).map(drop)
    }

    /// Moves `clock` to `position` ahead of the sdk's confirmation, but only
    /// when a seek can actually be issued.
    pub fn prepare_seek(
        &self,
        clock: &mut PositionClock,
        position: Duration,
    ) -> Result<Epoch, PlaybackError> {
        self.ensure_ready("seek")?;
        Ok(clock.seek(position))
    }

    /// The volume a following [`set_volume`](Self::set_volume) will apply,
    /// or the precondition error it would fail with.
    pub fn prepare_volume(&self, volume: f32) -> Result<f32, PlaybackError> {
        self.ensure_ready("set volume")?;
        Ok(clamp_volume(volume))
    }

    fn ready_device(&self, action: &str) -> Result<DeviceId, PlaybackError> {
        self.device().ok_or_else(|| {
            warn!(action, "ignoring playback control, no device is ready yet");
            PlaybackError::DeviceNotReady
        })
    }

    fn ready_session(&self, action: &str) -> Result<Rc<S>, PlaybackError> {
        let session = self.inner.session.borrow().clone().ok_or_else(|| {
            warn!(action, "ignoring playback control, no player session");
            PlaybackError::NoSession
        })?;
        self.ready_device(action)?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::error::ServiceError;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Pause,
        Resume,
        Next,
        Previous,
        Seek(Duration),
        Volume(f32),
        Disconnect,
    }

    #[derive(Default)]
    struct FakeSession {
        refuse: bool,
        paused: Option<bool>,
        calls: Rc<RefCell<Vec<Call>>>,
        on_disconnect: Option<Box<dyn Fn()>>,
    }

    fn snapshot(paused: bool) -> PlaybackSnapshot {
        serde_json::from_value(serde_json::json!({
            "paused": paused,
            "position": 0,
            "duration": 1000,
            "track_window": {"current_track": null}
        }))
        .unwrap()
    }

    #[async_trait(?Send)]
    impl PlaybackSession for FakeSession {
        async fn connect(&self) -> Result<bool, PlaybackError> {
            Ok(!self.refuse)
        }
        async fn pause(&self) -> Result<(), PlaybackError> {
            self.calls.borrow_mut().push(Call::Pause);
            Ok(())
        }
        async fn resume(&self) -> Result<(), PlaybackError> {
            self.calls.borrow_mut().push(Call::Resume);
            Ok(())
        }
        async fn next_track(&self) -> Result<(), PlaybackError> {
            self.calls.borrow_mut().push(Call::Next);
            Ok(())
        }
        async fn previous_track(&self) -> Result<(), PlaybackError> {
            self.calls.borrow_mut().push(Call::Previous);
            Ok(())
        }
        async fn seek(&self, position: Duration) -> Result<(), PlaybackError> {
            self.calls.borrow_mut().push(Call::Seek(position));
            Ok(())
        }
        async fn set_volume(&self, volume: f32) -> Result<(), PlaybackError> {
            self.calls.borrow_mut().push(Call::Volume(volume));
            Ok(())
        }
        async fn current_state(&self) -> Result<Option<PlaybackSnapshot>, PlaybackError> {
            Ok(self.paused.map(snapshot))
        }
        fn disconnect(&self) {
            self.calls.borrow_mut().push(Call::Disconnect);
            if let Some(callback) = &self.on_disconnect {
                callback();
            }
        }
    }

    #[derive(Default)]
    struct FakeRemote {
        fail: bool,
        transfers: RefCell<Vec<(String, bool)>>,
        starts: RefCell<Vec<(String, String)>>,
        calls: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl RemotePlayback for FakeRemote {
        async fn transfer_playback(&self, device: &DeviceId, play: bool) -> ServiceResult<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ServiceError::Unauthorized);
            }
            self.transfers.borrow_mut().push((device.0.clone(), play));
            Ok(())
        }
        async fn start_playback(&self, device: &DeviceId, context_uri: &str) -> ServiceResult<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(ServiceError::Unauthorized);
            }
            self.starts
                .borrow_mut()
                .push((device.0.clone(), context_uri.to_owned()));
            Ok(())
        }
    }

    async fn ready_bridge(session: FakeSession) -> PlaybackBridge<FakeSession, FakeRemote> {
        let bridge = PlaybackBridge::new(FakeRemote::default());
        bridge.connect(session).await.unwrap();
        bridge.device_ready(DeviceId("dev-1".to_owned())).await.unwrap();
        bridge
    }

    #[tokio::test]
    async fn controls_before_ready_are_noops() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let bridge: PlaybackBridge<FakeSession, FakeRemote> =
            PlaybackBridge::new(FakeRemote::default());

        let err = bridge.pause().await.unwrap_err();
        assert!(matches!(err, PlaybackError::NoSession));

        bridge
            .connect(FakeSession {
                calls: Rc::clone(&calls),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = bridge.skip_next().await.unwrap_err();
        assert!(matches!(err, PlaybackError::DeviceNotReady));
        assert!(err.is_precondition());

        let err = bridge.play_playlist("abc").await.unwrap_err();
        assert!(matches!(err, PlaybackError::DeviceNotReady));

        assert!(calls.borrow().is_empty());
        assert_eq!(bridge.inner.remote.calls.get(), 0);
    }

    #[tokio::test]
    async fn ready_transfers_playback_without_starting() {
        let bridge = ready_bridge(FakeSession::default()).await;
        assert_eq!(bridge.device(), Some(DeviceId("dev-1".to_owned())));
        assert_eq!(
            *bridge.inner.remote.transfers.borrow(),
            vec![("dev-1".to_owned(), false)]
        );
    }

    #[tokio::test]
    async fn play_uses_playlist_context_on_ready_device() {
        let bridge = ready_bridge(FakeSession::default()).await;
        bridge.play_playlist("37i9dQZF1DX").await.unwrap();
        assert_eq!(
            *bridge.inner.remote.starts.borrow(),
            vec![("dev-1".to_owned(), "spotify:playlist:37i9dQZF1DX".to_owned())]
        );
    }

    #[tokio::test]
    async fn transport_controls_reach_the_session() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let bridge = ready_bridge(FakeSession {
            calls: Rc::clone(&calls),
            ..Default::default()
        })
        .await;

        bridge.pause().await.unwrap();
        bridge.resume().await.unwrap();
        bridge.skip_next().await.unwrap();
        bridge.skip_previous().await.unwrap();
        bridge.seek(Duration::from_secs(42)).await.unwrap();
        bridge.set_volume(1.7).await.unwrap();
        bridge.set_volume(0.3).await.unwrap();

        assert_eq!(
            *calls.borrow(),
            vec![
                Call::Pause,
                Call::Resume,
                Call::Next,
                Call::Previous,
                Call::Seek(Duration::from_secs(42)),
                Call::Volume(1.0),
                Call::Volume(0.3),
            ]
        );
    }

    #[tokio::test]
    async fn toggle_follows_current_state() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let bridge = ready_bridge(FakeSession {
            paused: Some(true),
            calls: Rc::clone(&calls),
            ..Default::default()
        })
        .await;
        assert!(bridge.toggle_play_pause().await.unwrap());
        assert_eq!(*calls.borrow(), vec![Call::Resume]);

        let bridge = ready_bridge(FakeSession {
            paused: Some(false),
            ..Default::default()
        })
        .await;
        assert!(!bridge.toggle_play_pause().await.unwrap());

        let bridge = ready_bridge(FakeSession::default()).await;
        let err = bridge.toggle_play_pause().await.unwrap_err();
        assert!(matches!(err, PlaybackError::NoActiveState));
    }

    #[tokio::test]
    async fn only_one_session_is_kept() {
        let bridge = ready_bridge(FakeSession::default()).await;
        let err = bridge.connect(FakeSession::default()).await.unwrap_err();
        assert!(matches!(err, PlaybackError::SessionExists));
    }

    #[tokio::test]
    async fn refused_connection_leaves_bridge_empty() {
        let bridge: PlaybackBridge<FakeSession, FakeRemote> =
            PlaybackBridge::new(FakeRemote::default());
        let err = bridge
            .connect(FakeSession {
                refuse: true,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PlaybackError::ConnectFailed));
        assert!(!bridge.is_connected());
    }

    #[tokio::test]
    async fn lost_device_disables_controls() {
        let bridge = ready_bridge(FakeSession::default()).await;

        bridge.device_lost(&DeviceId("someone-else".to_owned()));
        assert!(bridge.device().is_some());

        bridge.device_lost(&DeviceId("dev-1".to_owned()));
        assert!(bridge.device().is_none());
        assert!(matches!(
            bridge.pause().await.unwrap_err(),
            PlaybackError::DeviceNotReady
        ));
    }

    #[tokio::test]
    async fn disconnect_releases_session() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let bridge = ready_bridge(FakeSession {
            calls: Rc::clone(&calls),
            ..Default::default()
        })
        .await;
        let clone = bridge.clone();

        clone.disconnect();
        assert!(!bridge.is_connected());
        assert!(bridge.device().is_none());
        assert_eq!(*calls.borrow(), vec![Call::Disconnect]);
    }

    #[tokio::test]
    async fn disconnect_tolerates_callbacks_into_the_bridge() {
        let bridge: PlaybackBridge<FakeSession, FakeRemote> =
            PlaybackBridge::new(FakeRemote::default());
        let seen = Rc::new(Cell::new(None));

        let observer = bridge.clone();
        let observed = Rc::clone(&seen);
        bridge
            .connect(FakeSession {
                on_disconnect: Some(Box::new(move || {
                    observed.set(Some((observer.is_connected(), observer.device().is_some())));
                })),
                ..Default::default()
            })
            .await
            .unwrap();
        bridge.device_ready(DeviceId("dev-1".to_owned())).await.unwrap();

        bridge.disconnect();
        assert_eq!(seen.get(), Some((false, false)));
        assert!(!bridge.is_connected());
    }

    #[tokio::test]
    async fn seek_before_ready_leaves_clock_alone() {
        let mut clock = PositionClock::new();
        clock.resync(Some(&snapshot(false)));
        let before = clock.state().clone();
        let epoch = clock.epoch();

        let bridge: PlaybackBridge<FakeSession, FakeRemote> =
            PlaybackBridge::new(FakeRemote::default());
        let err = bridge
            .prepare_seek(&mut clock, Duration::from_millis(700))
            .unwrap_err();
        assert!(matches!(err, PlaybackError::NoSession));

        bridge.connect(FakeSession::default()).await.unwrap();
        let err = bridge
            .prepare_seek(&mut clock, Duration::from_millis(700))
            .unwrap_err();
        assert!(matches!(err, PlaybackError::DeviceNotReady));
        assert_eq!(*clock.state(), before);
        assert_eq!(clock.epoch(), epoch);

        bridge.device_ready(DeviceId("dev-1".to_owned())).await.unwrap();
        let moved = bridge
            .prepare_seek(&mut clock, Duration::from_millis(700))
            .unwrap();
        assert_ne!(moved, epoch);
        assert_eq!(clock.state().position, Duration::from_millis(700));
    }

    #[tokio::test]
    async fn volume_is_only_prepared_for_a_ready_device() {
        let bridge: PlaybackBridge<FakeSession, FakeRemote> =
            PlaybackBridge::new(FakeRemote::default());
        bridge.connect(FakeSession::default()).await.unwrap();
        assert!(matches!(
            bridge.prepare_volume(0.4).unwrap_err(),
            PlaybackError::DeviceNotReady
        ));

        bridge.device_ready(DeviceId("dev-1".to_owned())).await.unwrap();
        assert_eq!(bridge.prepare_volume(0.4).unwrap(), 0.4);
        assert_eq!(bridge.prepare_volume(3.0).unwrap(), 1.0);
        assert_eq!(bridge.prepare_volume(f32::NAN).unwrap(), 0.0);
    }

    #[tokio::test]
    async fn remote_failures_are_not_preconditions() {
        let bridge: PlaybackBridge<FakeSession, FakeRemote> = PlaybackBridge::new(FakeRemote {
            fail: true,
            ..Default::default()
        });
        bridge.connect(FakeSession::default()).await.unwrap();

        let err = bridge
            .device_ready(DeviceId("dev-1".to_owned()))
            .await
            .unwrap_err();
        assert!(!err.is_precondition());
        // the device is still usable for sdk-side controls
        assert!(bridge.device().is_some());
    }

    #[test]
    fn context_uris() {
        assert_eq!(playlist_context_uri("abc"), "spotify:playlist:abc");
        assert_eq!(playlist_context_uri("spotify:playlist:abc"), "spotify:playlist:abc");
    }
}
