//! Browser-backed implementations of the core storage and location seams.

use iodj_core::auth::Location;
use iodj_core::token::KeyValueStore;
use iodj_core::StorageError;
use wasm_bindgen::JsValue;
use web_sys::Storage;

fn js_reason(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

/// `window.localStorage`, holding plain strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStore;

impl LocalStore {
    fn storage() -> Result<Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_owned()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_reason(e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".to_owned()))
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(js_reason(e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_owned(),
                reason: js_reason(e),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Write {
                key: key.to_owned(),
                reason: js_reason(e),
            })
    }
}

/// `window.location`. Clearing the fragment rewrites the history entry so a
/// reload does not parse it again.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserLocation;

impl Location for BrowserLocation {
    fn fragment(&self) -> Option<String> {
        let hash = web_sys::window()?.location().hash().ok()?;
        let fragment = hash.strip_prefix('#').unwrap_or(&hash);
        (!fragment.is_empty()).then(|| fragment.to_owned())
    }

    fn clear_fragment(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let location = window.location();
        let path = format!(
            "{}{}",
            location.pathname().unwrap_or_default(),
            location.search().unwrap_or_default()
        );
        let replaced = window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(&path)));
        if replaced.is_err() {
            let _ = location.set_hash("");
        }
    }
}

/// Blocking notice for failures the user has to know about.
pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}
