//! Per-post evaluation cache.
//!
//! Maps a post identity to its hide verdict so a post is never re-evaluated
//! (and no redundant LLM call is made) while the configuration is unchanged.
//! One instance is constructed at content-script startup and shared across
//! all scan passes for the page's lifetime.
//!
//! Consistency rule: the whole cache is cleared when any watched settings key
//! changes. Entries carry no version tag, so a verdict in the map is always
//! one computed under the current configuration.
//!
//! Every insertion writes the full snapshot through to `chrome.storage.local`
//! (key `evaluatedPosts`). That is simple but unbatched; the write volume is
//! bounded by the number of posts seen per page load. Storage failures are
//! non-fatal: the in-memory map stays authoritative for the session.

use std::cell::RefCell;
use std::collections::HashMap;

use log::info;

use crate::PostIdentity;

/// In-memory verdict map with write-through persistence.
///
/// Single-threaded wasm runs every map mutation to completion before another
/// task can observe it, so a `RefCell` is all the synchronization needed even
/// with many evaluations in flight.
pub struct EvalCache {
    entries: RefCell<HashMap<PostIdentity, bool>>,
}

impl EvalCache {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Load the persisted snapshot into memory. No-op when none exists or the
    /// read fails; the cache simply starts empty.
    pub async fn load(&self) {
        #[cfg(target_arch = "wasm32")]
        {
            match crate::chrome::read_cache_snapshot().await {
                Ok(entries) => {
                    if !entries.is_empty() {
                        info!("loaded post cache from storage, size: {}", entries.len());
                    }
                    self.absorb(entries);
                }
                Err(err) => {
                    log::warn!("could not load post cache from storage: {}", err);
                }
            }
        }
    }

    /// Merge a persisted snapshot under the in-memory map. The snapshot read
    /// races the first scan pass, so verdicts already computed this session
    /// win over their persisted counterparts.
    pub fn absorb(&self, entries: HashMap<PostIdentity, bool>) {
        let mut map = self.entries.borrow_mut();
        for (id, verdict) in entries {
            map.entry(id).or_insert(verdict);
        }
    }

    pub fn get(&self, id: &str) -> Option<bool> {
        self.entries.borrow().get(id).copied()
    }

    /// Insert-or-overwrite a verdict, then persist the full snapshot.
    pub fn put(&self, id: PostIdentity, verdict: bool) {
        self.entries.borrow_mut().insert(id, verdict);
        self.persist();
    }

    /// Drop every entry and remove the persisted snapshot. Invoked on watched
    /// settings changes and on the explicit user-initiated clear action.
    pub fn clear_all(&self) {
        self.entries.borrow_mut().clear();
        info!("post evaluation cache cleared");
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async {
            if let Err(err) = crate::chrome::remove_cache_snapshot().await {
                log::warn!("could not remove persisted post cache: {}", err);
            }
        });
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn persist(&self) {
        #[cfg(target_arch = "wasm32")]
        {
            let snapshot = self.entries.borrow().clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = crate::chrome::write_cache_snapshot(&snapshot).await {
                    log::warn!("could not persist post cache: {}", err);
                }
            });
        }
    }
}

impl Default for EvalCache {
    fn default() -> Self {
        Self::new()
    }
}
