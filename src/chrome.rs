//! JavaScript interop for the `chrome.*` extension APIs.
//!
//! Raw promise-returning bindings plus async wrappers that convert across the
//! JS boundary with `serde-wasm-bindgen`. Settings live in the synced store;
//! the evaluation cache snapshot lives in the local (non-synced) store.

use std::collections::HashMap;

use js_sys::{Array, Function, Object, Promise, Reflect};
use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::config::{CACHE_STORAGE_KEY, SETTINGS_KEYS};
use crate::{FilterError, FilterSettings};

// The promise-returning bindings catch: outside an extension context (plain
// pages, test harnesses) `chrome` is undefined and the call itself throws.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = get)]
    fn storage_sync_get(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = set)]
    fn storage_sync_set(items: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    fn storage_local_get(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    fn storage_local_set(items: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = remove)]
    fn storage_local_remove(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "onChanged"], js_name = addListener)]
    fn storage_on_changed_add_listener(listener: &Function);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    fn runtime_on_message_add_listener(listener: &Function);

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    fn tabs_query(query_info: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    fn tabs_send_message(tab_id: f64, message: &JsValue) -> Result<Promise, JsValue>;
}

async fn promised(call: Result<Promise, JsValue>) -> Result<JsValue, JsValue> {
    JsFuture::from(call?).await
}

/// Read the filter settings from the synced store. Read or parse failures
/// degrade to defaults (filtering effectively off) with a warning; the core
/// has no user-facing error surface.
pub async fn load_settings() -> FilterSettings {
    let keys: Array = SETTINGS_KEYS.iter().copied().map(JsValue::from).collect();
    match promised(storage_sync_get(&keys.into())).await {
        Ok(raw) => serde_wasm_bindgen::from_value(raw).unwrap_or_else(|err| {
            warn!("malformed settings in storage, using defaults: {}", err);
            FilterSettings::default()
        }),
        Err(err) => {
            warn!("could not read settings: {:?}", err);
            FilterSettings::default()
        }
    }
}

/// Write the full settings record to the synced store.
pub async fn save_settings(settings: &FilterSettings) -> Result<(), FilterError> {
    let items = serde_wasm_bindgen::to_value(settings)
        .map_err(|err| FilterError::Storage(err.to_string()))?;
    promised(storage_sync_set(&items))
        .await
        .map_err(storage_err)?;
    Ok(())
}

/// Read the persisted evaluation-cache snapshot. A missing snapshot is an
/// empty map, not an error.
pub async fn read_cache_snapshot() -> Result<HashMap<String, bool>, FilterError> {
    let keys: JsValue = Array::of1(&JsValue::from(CACHE_STORAGE_KEY)).into();
    let raw = promised(storage_local_get(&keys))
        .await
        .map_err(storage_err)?;
    let entry = Reflect::get(&raw, &JsValue::from(CACHE_STORAGE_KEY)).map_err(storage_err)?;
    if entry.is_undefined() || entry.is_null() {
        return Ok(HashMap::new());
    }
    serde_wasm_bindgen::from_value(entry).map_err(|err| FilterError::Storage(err.to_string()))
}

/// Persist the full cache snapshot under the `evaluatedPosts` key.
pub async fn write_cache_snapshot(entries: &HashMap<String, bool>) -> Result<(), FilterError> {
    let snapshot = serde_wasm_bindgen::to_value(entries)
        .map_err(|err| FilterError::Storage(err.to_string()))?;
    let items = Object::new();
    Reflect::set(&items, &JsValue::from(CACHE_STORAGE_KEY), &snapshot).map_err(storage_err)?;
    promised(storage_local_set(&items))
        .await
        .map_err(storage_err)?;
    Ok(())
}

pub async fn remove_cache_snapshot() -> Result<(), FilterError> {
    let keys: JsValue = Array::of1(&JsValue::from(CACHE_STORAGE_KEY)).into();
    promised(storage_local_remove(&keys))
        .await
        .map_err(storage_err)?;
    Ok(())
}

/// Subscribe to storage change events. The handler receives the names of the
/// changed keys; the listener stays registered for the page lifetime.
pub fn on_settings_changed(mut handler: impl FnMut(Vec<String>) + 'static) {
    let closure = Closure::<dyn FnMut(JsValue, JsValue)>::new(
        move |changes: JsValue, _area: JsValue| {
            let keys: Vec<String> = Object::keys(changes.unchecked_ref::<Object>())
                .iter()
                .filter_map(|key| key.as_string())
                .collect();
            handler(keys);
        },
    );
    storage_on_changed_add_listener(closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Subscribe to runtime messages; the handler receives the message's `action`
/// string. Messages without one are ignored.
pub fn on_runtime_message(mut handler: impl FnMut(String) + 'static) {
    let closure = Closure::<dyn FnMut(JsValue, JsValue, JsValue)>::new(
        move |message: JsValue, _sender: JsValue, _respond: JsValue| {
            if let Some(action) = Reflect::get(&message, &JsValue::from("action"))
                .ok()
                .and_then(|value| value.as_string())
            {
                handler(action);
            }
        },
    );
    runtime_on_message_add_listener(closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Ask the content script in the active tab to perform an action (settings
/// surface side of the clear-cache entry point).
pub async fn send_action_to_active_tab(action: &str) -> Result<(), FilterError> {
    let query_info = Object::new();
    Reflect::set(&query_info, &JsValue::from("active"), &JsValue::TRUE).map_err(storage_err)?;
    Reflect::set(&query_info, &JsValue::from("currentWindow"), &JsValue::TRUE)
        .map_err(storage_err)?;

    let tabs: Array = promised(tabs_query(&query_info))
        .await
        .map_err(storage_err)?
        .unchecked_into();
    let tab = tabs.get(0);
    let tab_id = Reflect::get(&tab, &JsValue::from("id"))
        .ok()
        .and_then(|id| id.as_f64())
        .ok_or_else(|| FilterError::Storage("no active tab".to_string()))?;

    let message = Object::new();
    Reflect::set(&message, &JsValue::from("action"), &JsValue::from(action))
        .map_err(storage_err)?;
    promised(tabs_send_message(tab_id, &message))
        .await
        .map_err(storage_err)?;
    Ok(())
}

fn storage_err(err: JsValue) -> FilterError {
    FilterError::Storage(format!("{:?}", err))
}
