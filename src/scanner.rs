//! Feed scanning driven by DOM mutations.
//!
//! The watcher has two states: Idle (no scan in flight) and Scanning. A
//! mutation signal while Idle starts a pass; signals while Scanning are
//! dropped rather than queued. Within a pass every post is dispatched as its
//! own fire-and-forget task, so evaluations from an earlier pass may still be
//! in flight when a later pass starts; the cache's write-through `put` makes
//! last-writer-wins the conflict rule. In-flight evaluations are never
//! cancelled, not even on settings changes or navigation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, MutationObserver, MutationObserverInit};

use crate::cache::EvalCache;
use crate::config::{
    CLEAR_CACHE_ACTION, OVERRIDE_FRAGMENT, POST_SELECTOR, SCAN_DEBOUNCE_MS, WATCHED_SETTINGS_KEYS,
};
use crate::{chrome, identity, policy, visibility, FilterSettings};

/// Owns the evaluation cache for the page lifetime and turns mutation events
/// into scan passes.
pub struct FeedScanner {
    cache: Rc<EvalCache>,
    scanning: Cell<bool>,
    pending: RefCell<Option<Timeout>>,
    observer: RefCell<Option<MutationObserver>>,
}

impl FeedScanner {
    /// Wire up the whole content-script side: load the persisted cache,
    /// subscribe to settings changes and clear-cache messages, observe the
    /// document for feed mutations and kick off the initial pass.
    pub fn install() -> Rc<Self> {
        let scanner = Rc::new(Self {
            cache: Rc::new(EvalCache::new()),
            scanning: Cell::new(false),
            pending: RefCell::new(None),
            observer: RefCell::new(None),
        });

        {
            let cache = scanner.cache.clone();
            spawn_local(async move { cache.load().await });
        }

        scanner.watch_settings();
        scanner.listen_for_actions();
        scanner.observe_feed();
        scanner.signal();

        info!("feed filter content script loaded");
        scanner
    }

    /// Wholesale cache invalidation: any watched key change empties the cache
    /// so no verdict computed under the old configuration survives.
    fn watch_settings(self: &Rc<Self>) {
        let cache = self.cache.clone();
        chrome::on_settings_changed(move |changed| {
            if is_watched_change(&changed) {
                info!("settings changed, clearing post evaluation cache");
                cache.clear_all();
            }
        });
    }

    /// The settings surface exposes a clear-cache action; honoring it clears
    /// the cache and re-runs one pass so verdicts are recomputed immediately.
    fn listen_for_actions(self: &Rc<Self>) {
        let scanner = self.clone();
        chrome::on_runtime_message(move |action| {
            if action == CLEAR_CACHE_ACTION {
                scanner.cache.clear_all();
                scanner.signal();
            }
        });
    }

    fn observe_feed(self: &Rc<Self>) {
        let scanner = self.clone();
        let callback = Closure::<dyn FnMut()>::new(move || scanner.signal());

        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                warn!("could not create mutation observer: {:?}", err);
                return;
            }
        };
        callback.forget();

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if let Err(err) = observer.observe_with_options(&gloo_utils::body(), &init) {
            warn!("could not observe document body: {:?}", err);
            return;
        }
        *self.observer.borrow_mut() = Some(observer);
    }

    /// Coalesce bursts of mutation events into one scheduled pass; each new
    /// signal cancels the previous pending timer.
    pub fn signal(self: &Rc<Self>) {
        let scanner = self.clone();
        let timer = Timeout::new(SCAN_DEBOUNCE_MS, move || {
            spawn_local(async move { scanner.scan_pass().await });
        });
        *self.pending.borrow_mut() = Some(timer);
    }

    /// One pass over the current feed. Per-post evaluations are dispatched
    /// without awaiting each other; the pass is over once all are dispatched.
    async fn scan_pass(self: &Rc<Self>) {
        if self.scanning.replace(true) {
            return;
        }
        self.run_pass().await;
        self.scanning.set(false);
    }

    async fn run_pass(self: &Rc<Self>) {
        // Escape hatch: a designated fragment suspends filtering so a hidden
        // post can be inspected without being re-hidden.
        let window = gloo_utils::window();
        if let Ok(hash) = window.location().hash() {
            if hash == OVERRIDE_FRAGMENT {
                info!("override fragment active, filtering suspended");
                return;
            }
        }

        // One immutable settings snapshot per pass.
        let settings = Rc::new(chrome::load_settings().await);
        filter_pass(&gloo_utils::document(), settings, &self.cache);
    }
}

/// True when any changed settings key is one whose value feeds cached
/// verdicts. `debugMode` and `filteringEnabled` only change presentation, so
/// they leave the cache intact.
pub fn is_watched_change(changed: &[String]) -> bool {
    changed
        .iter()
        .any(|key| WATCHED_SETTINGS_KEYS.contains(&key.as_str()))
}

/// One pass over `document` under one immutable settings snapshot. With
/// filtering disabled every post is revealed and nothing is evaluated;
/// otherwise each post is dispatched as its own task.
pub fn filter_pass(document: &Document, settings: Rc<FilterSettings>, cache: &Rc<EvalCache>) {
    if !settings.filtering_enabled {
        visibility::reveal_all(document);
        return;
    }

    let posts = match document.query_selector_all(POST_SELECTOR) {
        Ok(posts) => posts,
        Err(err) => {
            warn!("post selector query failed: {:?}", err);
            return;
        }
    };

    for index in 0..posts.length() {
        let Some(element) = posts
            .item(index)
            .and_then(|node| node.dyn_into::<Element>().ok())
        else {
            continue;
        };
        spawn_local(evaluate_post(element, settings.clone(), cache.clone()));
    }
}

/// Evaluate a single post: serve a cached verdict when one exists, otherwise
/// decide, cache and apply. A failed evaluation leaves the post visible and
/// uncached so a transient failure is re-checked on the next pass.
pub async fn evaluate_post(post: Element, settings: Rc<FilterSettings>, cache: Rc<EvalCache>) {
    let id = identity::resolve(&post);

    if let Some(verdict) = cache.get(&id) {
        if settings.debug_mode {
            debug!("skipping already evaluated post: {}", id);
        }
        visibility::apply(&post, verdict);
        return;
    }

    let text = post.text_content().unwrap_or_default();
    let now_ms = js_sys::Date::now() as i64;

    match policy::decide(&text, &settings, now_ms).await {
        Ok(decision) => {
            cache.put(id.clone(), decision.hide);
            if settings.debug_mode {
                debug!(
                    "caching evaluation for post {}: {} (cache size: {})",
                    id,
                    decision.hide,
                    cache.len()
                );
            }
            visibility::apply(&post, decision.hide);
            if decision.hide {
                visibility::log_hidden(&id, decision.matched.as_deref(), &text);
            }
        }
        Err(err) => {
            warn!("evaluation failed for post {}: {}", id, err);
            visibility::apply(&post, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn each_watched_key_triggers_invalidation() {
        for key in ["topics", "filterMode", "apiKey", "llmModel"] {
            assert!(is_watched_change(&keys(&[key])), "{} should invalidate", key);
        }
    }

    #[test]
    fn presentation_keys_leave_the_cache_alone() {
        assert!(!is_watched_change(&keys(&["debugMode"])));
        assert!(!is_watched_change(&keys(&["filteringEnabled"])));
        assert!(!is_watched_change(&keys(&["debugMode", "filteringEnabled"])));
        assert!(!is_watched_change(&[]));
    }

    #[test]
    fn mixed_change_set_still_invalidates() {
        assert!(is_watched_change(&keys(&["debugMode", "llmModel"])));
    }
}
