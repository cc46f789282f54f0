#![allow(clippy::wildcard_imports)]

use std::time::Duration;

use iodj_core::api::models::{BackendUser, GeneratedPlaylist, PlaylistRecord, UserProfile};
use iodj_core::api::{BackendClient, SpotifyApi};
use iodj_core::auth;
use iodj_core::clock::{ActivePlaylist, Epoch, PositionClock};
use iodj_core::error::FlowError;
use iodj_core::flow::{Navigator, Page};
use iodj_core::playback::{PlaybackBridge, SessionEvent};
use iodj_core::{AppConfig, PlaybackError, ServiceError, ServiceResult, SessionToken, TokenStore};
use seed::{prelude::*, *};

use browser::{BrowserLocation, LocalStore};
use sdk::WebPlaybackSession;

pub mod browser;
mod sdk;
mod view;

type Bridge = PlaybackBridge<WebPlaybackSession, SpotifyApi>;

// ------ ------
//     Init
// ------ ------

fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    let config = AppConfig::default();
    let mut tokens = TokenStore::new(LocalStore);
    let token = auth::complete_login(&mut tokens, &mut BrowserLocation);

    let backend = BackendClient::from_config(&config)
        .map_err(|e| error!("backend client unavailable", e.to_string()))
        .ok();

    let mut model = Model {
        volume: config.initial_volume,
        config,
        tokens,
        token: None,
        nav: Navigator::new(),
        bridge: None,
        clock: PositionClock::new(),
        ticker: None,
        backend,
        profile: None,
        user: None,
        playlists: Vec::new(),
        diary: DiaryForm::default(),
        menu_open: false,
        pending_play: None,
    };
    if let Some(token) = token {
        start_session(&mut model, token, orders);
    }
    model
}

/// Builds the vendor client and player for `token` and loads the profile.
fn start_session(model: &mut Model, token: SessionToken, orders: &mut impl Orders<Msg>) {
    let api = match SpotifyApi::from_config(&model.config, token.clone()) {
        Ok(api) => api,
        Err(e) => {
            notify("Could not reach Spotify", &e);
            return;
        }
    };
    model.token = Some(token);

    let profile_api = api.clone();
    orders.perform_cmd(async move { Msg::ProfileLoaded(profile_api.current_user().await) });

    let bridge = Bridge::new(api);
    model.bridge = Some(bridge.clone());

    let config = model.config.clone();
    let sender = orders.msg_sender();
    orders.perform_cmd(async move {
        let on_event = move |event: SessionEvent| sender(Some(Msg::Session(event)));
        let result = match WebPlaybackSession::create(&config, on_event).await {
            Ok(session) => bridge.connect(session).await,
            Err(e) => Err(e),
        };
        Msg::PlayerConnected(result)
    });
}

// ------ ------
//     Model
// ------ ------

#[derive(Default)]
pub struct DiaryForm {
    pub title: String,
    pub text: String,
}

pub struct Model {
    config: AppConfig,
    tokens: TokenStore<LocalStore>,
    token: Option<SessionToken>,
    nav: Navigator,
    bridge: Option<Bridge>,
    clock: PositionClock,
    /// Dropping the handle stops the one second position ticker.
    ticker: Option<StreamHandle>,
    backend: Option<BackendClient>,
    profile: Option<UserProfile>,
    user: Option<BackendUser>,
    playlists: Vec<PlaylistRecord>,
    diary: DiaryForm,
    volume: f32,
    menu_open: bool,
    /// Playlist to start once the device is ready.
    pending_play: Option<String>,
}

// ------ ------
//    Update
// ------ ------

pub enum Msg {
    // session
    Login,
    Logout,
    ProfileLoaded(ServiceResult<UserProfile>),
    UserRegistered(ServiceResult<BackendUser>),
    PlaylistsLoaded(ServiceResult<Vec<PlaylistRecord>>),

    // player session
    PlayerConnected(Result<(), PlaybackError>),
    Session(SessionEvent),
    DeviceTransferred(Result<(), PlaybackError>),
    PlaybackStarted(Result<(), PlaybackError>),
    ControlDone(Result<(), PlaybackError>),
    Toggled(Result<bool, PlaybackError>),

    // diary
    StartDiary,
    DiaryTitleChanged(String),
    DiaryTextChanged(String),
    SubmitDiary,
    Generated(ServiceResult<GeneratedPlaylist>),
    LoadingFloorElapsed,

    // player controls
    TogglePlayPause,
    SkipNext,
    SkipPrevious,
    Seek(u64),
    SetVolume(f32),
    Tick(Epoch),

    // playlists
    OpenPlaylists,
    SelectPlaylist(usize),
    ToggleMenu,
}

fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::Login => match auth::authorize_url(&model.config) {
            Ok(url) => {
                if let Some(window) = web_sys::window() {
                    if let Err(e) = window.location().set_href(url.as_str()) {
                        error!("redirect to authorization failed", e);
                    }
                }
            }
            Err(e) => notify("Login is misconfigured", &e),
        },
        Msg::Logout => logout(model),
        Msg::ProfileLoaded(result) => match result {
            Ok(profile) => {
                log!("logged in as", profile.id);
                if let Some(backend) = model.backend.clone() {
                    let registering = profile.clone();
                    orders.perform_cmd(async move {
                        Msg::UserRegistered(backend.register_user_if_absent(&registering).await)
                    });
                }
                model.profile = Some(profile);
            }
            Err(ServiceError::Unauthorized) => {
                log!("stored token was rejected, logging out");
                logout(model);
            }
            Err(e) => notify("Could not load your Spotify profile", &e),
        },
        Msg::UserRegistered(result) => match result {
            Ok(user) => {
                model.user = Some(user);
                load_playlists(model, orders);
            }
            Err(e) => notify("Could not register with InsideOutDJ", &e),
        },
        Msg::PlaylistsLoaded(result) => match result {
            Ok(playlists) => model.playlists = playlists,
            Err(e) => notify("Could not load saved playlists", &e),
        },

        Msg::PlayerConnected(result) => match result {
            Ok(()) => log!("player connected"),
            Err(e) => playback_failed(e),
        },
        Msg::Session(event) => on_session_event(event, model, orders),
        Msg::DeviceTransferred(result) => match result {
            Ok(()) => {
                if let Some(playlist_id) = model.pending_play.take() {
                    play_playlist(model, playlist_id, orders);
                }
            }
            Err(e) => playback_failed(e),
        },
        Msg::PlaybackStarted(result) | Msg::ControlDone(result) => {
            if let Err(e) = result {
                playback_failed(e);
            }
        }
        Msg::Toggled(result) => match result {
            Ok(playing) => {
                model.clock.set_playing(playing);
                restart_ticker(model, orders);
            }
            Err(e) => playback_failed(e),
        },

        Msg::StartDiary => {
            let logged_in = model.token.is_some();
            if navigate(model.nav.start_diary(logged_in)) {
                after_navigation(model, orders);
            }
        }
        Msg::DiaryTitleChanged(title) => model.diary.title = title,
        Msg::DiaryTextChanged(text) => model.diary.text = text,
        Msg::SubmitDiary => submit_diary(model, orders),
        Msg::Generated(result) => {
            let succeeded = result.is_ok();
            match result {
                Ok(generated) if model.nav.page() != Page::Loading => {
                    log!("ignoring playlist generated after leaving the loading page", generated.playlist_name);
                }
                Ok(generated) => {
                    log!("playlist generated", generated.playlist_name);
                    activate(
                        model,
                        ActivePlaylist {
                            id: generated.playlist_id.clone(),
                            name: generated.playlist_name.clone(),
                            emotion: Some(generated.emotion_analysis.normalized_emotion),
                        },
                        orders,
                    );
                    load_playlists(model, orders);
                }
                Err(e) => notify("Could not create a playlist from your diary", &e),
            }
            model.nav.generation_finished(succeeded);
            after_navigation(model, orders);
        }
        Msg::LoadingFloorElapsed => {
            model.nav.loading_floor_elapsed();
            after_navigation(model, orders);
        }

        Msg::TogglePlayPause => {
            if let Some(bridge) = model.bridge.clone() {
                orders.perform_cmd(async move { Msg::Toggled(bridge.toggle_play_pause().await) });
            } else {
                playback_failed(PlaybackError::NoSession);
            }
        }
        Msg::SkipNext => control(model, orders, |bridge| async move { bridge.skip_next().await }),
        Msg::SkipPrevious => {
            control(model, orders, |bridge| async move { bridge.skip_previous().await })
        }
        Msg::Seek(seconds) => {
            let position = Duration::from_secs(seconds);
            let Some(bridge) = model.bridge.clone() else {
                playback_failed(PlaybackError::NoSession);
                return;
            };
            match bridge.prepare_seek(&mut model.clock, position) {
                Ok(_) => {
                    restart_ticker(model, orders);
                    control(model, orders, move |bridge| async move { bridge.seek(position).await });
                }
                Err(e) => playback_failed(e),
            }
        }
        Msg::SetVolume(volume) => {
            let Some(bridge) = model.bridge.clone() else {
                playback_failed(PlaybackError::NoSession);
                return;
            };
            match bridge.prepare_volume(volume) {
                Ok(volume) => {
                    model.volume = volume;
                    control(model, orders, move |bridge| async move {
                        bridge.set_volume(volume).await
                    });
                }
                Err(e) => playback_failed(e),
            }
        }
        Msg::Tick(epoch) => {
            if !model.clock.tick(epoch) {
                orders.skip();
            }
        }

        Msg::OpenPlaylists => {
            model.menu_open = false;
            if navigate(model.nav.open_playlists()) {
                load_playlists(model, orders);
                after_navigation(model, orders);
            }
        }
        Msg::SelectPlaylist(index) => {
            let Some(record) = model.playlists.get(index).cloned() else {
                return;
            };
            model.menu_open = false;
            if navigate(model.nav.select_playlist()) {
                activate(
                    model,
                    ActivePlaylist {
                        id: record.id.clone(),
                        name: record.name.clone(),
                        emotion: Some(record.coordinate()),
                    },
                    orders,
                );
                after_navigation(model, orders);
            }
        }
        Msg::ToggleMenu => model.menu_open = !model.menu_open,
    }
}

fn on_session_event(event: SessionEvent, model: &mut Model, orders: &mut impl Orders<Msg>) {
    let Some(bridge) = model.bridge.clone() else {
        return;
    };
    match event {
        SessionEvent::Ready(device) => {
            log!("player ready on device", device.as_str());
            orders.perform_cmd(async move { Msg::DeviceTransferred(bridge.device_ready(device).await) });
        }
        SessionEvent::NotReady(device) => bridge.device_lost(&device),
        SessionEvent::StateChanged(snapshot) => {
            if model.clock.resync(snapshot.as_ref()).is_some() {
                restart_ticker(model, orders);
            } else {
                orders.skip();
            }
        }
    }
}

fn submit_diary(model: &mut Model, orders: &mut impl Orders<Msg>) {
    let (Some(token), Some(backend)) = (model.token.clone(), model.backend.clone()) else {
        alert("Please log in before writing a diary.");
        return;
    };
    if model.diary.title.trim().is_empty() || model.diary.text.trim().is_empty() {
        alert("Please fill in both the title and the diary.");
        return;
    }
    if !navigate(model.nav.submit_diary()) {
        return;
    }
    let diary = model.diary.text.clone();
    let title = model.diary.title.clone();
    orders.perform_cmd(async move {
        Msg::Generated(backend.generate_playlist(&diary, &title, &token).await)
    });
    let floor = u32::try_from(model.config.loading_floor.as_millis()).unwrap_or(u32::MAX);
    orders.perform_cmd(cmds::timeout(floor, || Msg::LoadingFloorElapsed));
    after_navigation(model, orders);
}

/// Shows `playlist` on the player and starts it.
fn activate(model: &mut Model, playlist: ActivePlaylist, orders: &mut impl Orders<Msg>) {
    let id = playlist.id.clone();
    model.clock.set_active_playlist(playlist);
    restart_ticker(model, orders);
    play_playlist(model, id, orders);
}

fn play_playlist(model: &mut Model, playlist_id: String, orders: &mut impl Orders<Msg>) {
    let Some(bridge) = model.bridge.clone() else {
        playback_failed(PlaybackError::NoSession);
        return;
    };
    if bridge.device().is_none() {
        log!("device not ready yet, playlist will start once it is");
        model.pending_play = Some(playlist_id);
        return;
    }
    orders.perform_cmd(async move { Msg::PlaybackStarted(bridge.play_playlist(&playlist_id).await) });
}

fn control<F, Fut>(model: &Model, orders: &mut impl Orders<Msg>, action: F)
where
    F: FnOnce(Bridge) -> Fut,
    Fut: std::future::Future<Output = Result<(), PlaybackError>> + 'static,
{
    match model.bridge.clone() {
        Some(bridge) => {
            let pending = action(bridge);
            orders.perform_cmd(async move { Msg::ControlDone(pending.await) });
        }
        None => playback_failed(PlaybackError::NoSession),
    }
}

fn load_playlists(model: &Model, orders: &mut impl Orders<Msg>) {
    if let (Some(backend), Some(user)) = (model.backend.clone(), model.user.as_ref()) {
        let user_id = user.id.clone();
        orders.perform_cmd(async move { Msg::PlaylistsLoaded(backend.user_playlists(&user_id).await) });
    }
}

fn logout(model: &mut Model) {
    if let Err(e) = auth::logout(&mut model.tokens) {
        error!("could not clear the stored token", e.to_string());
    }
    if let Some(bridge) = model.bridge.take() {
        bridge.disconnect();
    }
    model.token = None;
    model.profile = None;
    model.user = None;
    model.playlists.clear();
    model.pending_play = None;
    model.menu_open = false;
    model.clock.reset();
    model.ticker = None;
    model.nav.logout();
}

/// The ticker only runs while the player page is shown and playback is on.
fn restart_ticker(model: &mut Model, orders: &mut impl Orders<Msg>) {
    model.ticker = None;
    if model.nav.page() == Page::Player && model.clock.is_ticking() {
        let epoch = model.clock.epoch();
        model.ticker = Some(orders.stream_with_handle(streams::interval(1000, move || Msg::Tick(epoch))));
    }
}

fn after_navigation(model: &mut Model, orders: &mut impl Orders<Msg>) {
    if model.nav.page() == Page::Player {
        if model.ticker.is_none() {
            restart_ticker(model, orders);
        }
    } else {
        model.ticker = None;
        model.menu_open = false;
    }
}

fn navigate(result: Result<Page, FlowError>) -> bool {
    match result {
        Ok(page) => {
            log!("showing", page.name());
            true
        }
        Err(e) => {
            log!(e.to_string());
            false
        }
    }
}

fn notify(context: &str, err: &dyn std::fmt::Display) {
    error!(context, err.to_string());
    alert(&format!("{context}. Please try again."));
}

fn playback_failed(err: PlaybackError) {
    if err.is_precondition() {
        log!("playback control ignored:", err.to_string());
    } else {
        notify("Playback failed", &err);
    }
}

fn alert(message: &str) {
    browser::alert(message);
}

// ------ ------
//     View
// ------ ------

fn view(model: &Model) -> Node<Msg> {
    view::view(model)
}

// ------ ------
//     Start
// ------ ------

#[wasm_bindgen(start)]
pub fn start() {
    App::start("app", init, update, view);
}
