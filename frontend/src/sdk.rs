//! Bindings to the vendor's Web Playback SDK and the [`PlaybackSession`]
//! adapter over them.
//!
//! The SDK script announces itself through a single global hook. That hook
//! is installed exactly once, by [`wait_for_sdk`], which wraps it in a shared
//! promise; everything else awaits the promise.

use std::{cell::RefCell, rc::Rc, time::Duration};

use async_trait::async_trait;
use iodj_core::playback::{DeviceId, PlaybackSession, SessionEvent};
use iodj_core::types::sdk::{DevicePayload, PlaybackSnapshot};
use iodj_core::{AppConfig, PlaybackError, TokenStore};
use js_sys::{Function, Promise, Reflect};
use seed::{error, log};
use serde::Serialize;
use wasm_bindgen::{prelude::*, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlScriptElement;

use crate::browser::LocalStore;

const SDK_URL: &str = "https://sdk.scdn.co/spotify-player.js";
const SCRIPT_ID: &str = "spotify-player-script";
const READY_HOOK: &str = "onSpotifyWebPlaybackSDKReady";

const ERROR_EVENTS: [&str; 4] = [
    "initialization_error",
    "authentication_error",
    "account_error",
    "playback_error",
];

#[wasm_bindgen(js_namespace = Spotify)]
extern "C" {
    type Player;

    #[wasm_bindgen(constructor, catch)]
    fn new(options: &JsValue) -> Result<Player, JsValue>;

    #[wasm_bindgen(method, js_name = addListener)]
    fn add_listener(this: &Player, event: &str, callback: &Function) -> bool;

    #[wasm_bindgen(method)]
    fn connect(this: &Player) -> Promise;

    #[wasm_bindgen(method)]
    fn disconnect(this: &Player);

    #[wasm_bindgen(method)]
    fn pause(this: &Player) -> Promise;

    #[wasm_bindgen(method)]
    fn resume(this: &Player) -> Promise;

    #[wasm_bindgen(method, js_name = nextTrack)]
    fn next_track(this: &Player) -> Promise;

    #[wasm_bindgen(method, js_name = previousTrack)]
    fn previous_track(this: &Player) -> Promise;

    #[wasm_bindgen(method)]
    fn seek(this: &Player, position_ms: f64) -> Promise;

    #[wasm_bindgen(method, js_name = setVolume)]
    fn set_volume(this: &Player, volume: f64) -> Promise;

    #[wasm_bindgen(method, js_name = getCurrentState)]
    fn get_current_state(this: &Player) -> Promise;
}

#[derive(Serialize)]
struct PlayerOptions<'a> {
    name: &'a str,
    volume: f32,
}

fn sdk_error(value: JsValue) -> PlaybackError {
    PlaybackError::Sdk(
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    )
}

thread_local! {
    static SDK_READY: RefCell<Option<Promise>> = RefCell::new(None);
}

/// Resolves once `window.Spotify` is usable, inserting the script tag on
/// first use.
pub async fn wait_for_sdk() -> Result<(), PlaybackError> {
    let ready = SDK_READY.with(|cell| -> Result<Promise, PlaybackError> {
        if let Some(promise) = cell.borrow().as_ref() {
            return Ok(promise.clone());
        }
        let promise = load_sdk()?;
        *cell.borrow_mut() = Some(promise.clone());
        Ok(promise)
    })?;
    JsFuture::from(ready).await.map_err(sdk_error)?;
    Ok(())
}

fn load_sdk() -> Result<Promise, PlaybackError> {
    let window = web_sys::window().ok_or_else(|| PlaybackError::Sdk("no window".to_owned()))?;
    if Reflect::has(&window, &JsValue::from_str("Spotify")).unwrap_or(false) {
        return Ok(Promise::resolve(&JsValue::UNDEFINED));
    }

    let hook_target = window.clone();
    let promise = Promise::new(&mut |resolve, _reject| {
        let on_ready = Closure::once_into_js(move || {
            log!("Spotify playback sdk is ready");
            let _ = resolve.call0(&JsValue::UNDEFINED);
        });
        let _ = Reflect::set(&hook_target, &JsValue::from_str(READY_HOOK), &on_ready);
    });

    let document = window
        .document()
        .ok_or_else(|| PlaybackError::Sdk("no document".to_owned()))?;
    if document.get_element_by_id(SCRIPT_ID).is_none() {
        let script: HtmlScriptElement = document
            .create_element("script")
            .map_err(sdk_error)?
            .dyn_into()
            .map_err(|_| PlaybackError::Sdk("created element is not a script".to_owned()))?;
        script.set_id(SCRIPT_ID);
        script.set_src(SDK_URL);
        script.set_async(true);
        document
            .body()
            .ok_or_else(|| PlaybackError::Sdk("no document body".to_owned()))?
            .append_child(&script)
            .map_err(sdk_error)?;
    }
    Ok(promise)
}

type Listener = Closure<dyn FnMut(JsValue)>;

/// One `Spotify.Player`. The listener closures live as long as the session.
pub struct WebPlaybackSession {
    player: Player,
    _listeners: Vec<Listener>,
    _token_callback: Closure<dyn FnMut(Function)>,
}

impl WebPlaybackSession {
    /// Waits for the SDK and builds a player that forwards its events to
    /// `on_event`.
    pub async fn create(
        config: &AppConfig,
        on_event: impl Fn(SessionEvent) + 'static,
    ) -> Result<Self, PlaybackError> {
        wait_for_sdk().await?;

        // Read on every call so the player always gets the current token.
        let token_callback = Closure::<dyn FnMut(Function)>::new(|deliver: Function| {
            match TokenStore::new(LocalStore).get_token() {
                Some(token) => {
                    let _ = deliver.call1(&JsValue::NULL, &JsValue::from_str(token.as_str()));
                }
                None => error!("player asked for a token, but none is stored"),
            }
        });

        let options = serde_wasm_bindgen::to_value(&PlayerOptions {
            name: &config.player_name,
            volume: config.initial_volume,
        })
        .map_err(|e| PlaybackError::Sdk(e.to_string()))?;
        Reflect::set(
            &options,
            &JsValue::from_str("getOAuthToken"),
            token_callback.as_ref(),
        )
        .map_err(sdk_error)?;
        let player = Player::new(&options).map_err(sdk_error)?;

        let on_event: Rc<dyn Fn(SessionEvent)> = Rc::new(on_event);
        let mut listeners = Vec::new();

        let emit = Rc::clone(&on_event);
        listeners.push(listen(&player, "ready", move |payload| {
            match serde_wasm_bindgen::from_value::<DevicePayload>(payload) {
                Ok(device) => emit(SessionEvent::Ready(DeviceId::from(device))),
                Err(e) => error!("unreadable ready payload", e.to_string()),
            }
        }));

        let emit = Rc::clone(&on_event);
        listeners.push(listen(&player, "not_ready", move |payload| {
            match serde_wasm_bindgen::from_value::<DevicePayload>(payload) {
                Ok(device) => emit(SessionEvent::NotReady(DeviceId::from(device))),
                Err(e) => error!("unreadable not_ready payload", e.to_string()),
            }
        }));

        let emit = Rc::clone(&on_event);
        listeners.push(listen(&player, "player_state_changed", move |payload| {
            match snapshot_from(payload) {
                Ok(snapshot) => emit(SessionEvent::StateChanged(snapshot)),
                Err(e) => error!("unreadable player state", e.to_string()),
            }
        }));

        for event in ERROR_EVENTS {
            listeners.push(listen(&player, event, move |payload| {
                let message = Reflect::get(&payload, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
                    .unwrap_or_default();
                error!(event, message);
            }));
        }

        Ok(Self {
            player,
            _listeners: listeners,
            _token_callback: token_callback,
        })
    }
}

fn listen(player: &Player, event: &str, handler: impl FnMut(JsValue) + 'static) -> Listener {
    let closure = Listener::new(handler);
    if !player.add_listener(event, closure.as_ref().unchecked_ref()) {
        error!("player rejected listener for", event);
    }
    closure
}

fn snapshot_from(value: JsValue) -> Result<Option<PlaybackSnapshot>, serde_wasm_bindgen::Error> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value).map(Some)
}

async fn settle(promise: Promise) -> Result<JsValue, PlaybackError> {
    JsFuture::from(promise).await.map_err(sdk_error)
}

#[async_trait(?Send)]
impl PlaybackSession for WebPlaybackSession {
    async fn connect(&self) -> Result<bool, PlaybackError> {
        Ok(settle(self.player.connect()).await?.as_bool().unwrap_or(false))
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        settle(self.player.pause()).await.map(drop)
    }

    async fn resume(&self) -> Result<(), PlaybackError> {
        settle(self.player.resume()).await.map(drop)
    }

    async fn next_track(&self) -> Result<(), PlaybackError> {
        settle(self.player.next_track()).await.map(drop)
    }

    async fn previous_track(&self) -> Result<(), PlaybackError> {
        settle(self.player.previous_track()).await.map(drop)
    }

    async fn seek(&self, position: Duration) -> Result<(), PlaybackError> {
        settle(self.player.seek(position.as_millis() as f64))
            .await
            .map(drop)
    }

    async fn set_volume(&self, volume: f32) -> Result<(), PlaybackError> {
        settle(self.player.set_volume(f64::from(volume)))
            .await
            .map(drop)
    }

    async fn current_state(&self) -> Result<Option<PlaybackSnapshot>, PlaybackError> {
        let value = settle(self.player.get_current_state()).await?;
        snapshot_from(value).map_err(|e| PlaybackError::Sdk(e.to_string()))
    }

    fn disconnect(&self) {
        self.player.disconnect();
    }
}
