//! Extension-level configuration constants.

// DOM boundary
pub const POST_SELECTOR: &str = ".feed-shared-update-v2";
pub const IDENTITY_ANCESTOR_SELECTOR: &str = "[data-id]";
pub const IDENTITY_ATTR: &str = "data-id";

// Escape hatch: while this fragment is present, scanning is suspended so a
// hidden post can be viewed without being re-hidden.
pub const OVERRIDE_FRAGMENT: &str = "#override-deletion";

// Storage keys
pub const CACHE_STORAGE_KEY: &str = "evaluatedPosts";
pub const SETTINGS_KEYS: [&str; 6] = [
    "topics",
    "filterMode",
    "apiKey",
    "llmModel",
    "debugMode",
    "filteringEnabled",
];
// A change to any of these keys invalidates every cached verdict.
pub const WATCHED_SETTINGS_KEYS: [&str; 4] = ["topics", "filterMode", "apiKey", "llmModel"];

// Messages from the settings surface
pub const CLEAR_CACHE_ACTION: &str = "clear-cache";

// Scan behavior
pub const SCAN_DEBOUNCE_MS: u32 = 300;

// Identity and diagnostics
pub const FALLBACK_ID_CHARS: usize = 100;
pub const PREVIEW_CHARS: usize = 200;
pub const ACTIVITY_URN_PREFIX: &str = "urn:li:activity:";
pub const FEED_UPDATE_URL: &str = "https://www.linkedin.com/feed/update/";

// Remote evaluation
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const MS_PER_DAY: i64 = 86_400_000;
