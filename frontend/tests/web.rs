//! Run with `wasm-pack test --headless --firefox frontend`.

use frontend::browser::LocalStore;
use iodj_core::token::{KeyValueStore, TOKEN_KEY};
use iodj_core::{SessionToken, TokenStore};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn token_survives_a_new_store() {
    let mut store = TokenStore::new(LocalStore);
    store.clear_token().unwrap();
    assert!(store.get_token().is_none());

    store.set_token(&SessionToken("abc".to_owned())).unwrap();
    let reopened = TokenStore::new(LocalStore);
    assert_eq!(reopened.get_token(), Some(SessionToken("abc".to_owned())));

    store.clear_token().unwrap();
    assert_eq!(LocalStore.get(TOKEN_KEY).unwrap(), None);
}

#[wasm_bindgen_test]
fn empty_token_counts_as_logged_out() {
    let mut raw = LocalStore;
    raw.set(TOKEN_KEY, "").unwrap();
    assert!(TokenStore::new(LocalStore).get_token().is_none());
    raw.remove(TOKEN_KEY).unwrap();
}
