//! Core library for the feed-filter extension.
//!
//! The content script scans the host page's feed for post elements, decides
//! per post whether it matches the user's topics (keyword match or a remote
//! LLM call), hides matching posts and caches every verdict per post identity
//! so a post is never evaluated twice under the same settings.

use std::fmt;

pub mod cache;
pub mod chrome;
pub mod config;
pub mod identity;
pub mod llm;
pub mod policy;
pub mod scanner;
pub mod visibility;

/// Stable key derived for a post, used for caching verdicts across scans.
pub type PostIdentity = String;

/// A user-defined filter rule. Wire format matches the settings store
/// (`keyword`, `type`, `duration`, `startDate`, `enabled`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Topic {
    pub keyword: String,
    #[serde(rename = "type")]
    pub kind: TopicKind,
    /// Activation window in days; `0` means the topic never expires.
    pub duration: u32,
    /// RFC 3339 timestamp marking when the topic became active.
    pub start_date: Option<String>,
    pub enabled: bool,
}

impl Default for Topic {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            kind: TopicKind::Keyword,
            duration: 0,
            start_date: None,
            enabled: true,
        }
    }
}

/// Both kinds currently share substring-match semantics; the distinction is
/// reserved for a future semantic matching mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicKind {
    #[default]
    Keyword,
    Topic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Keyword,
    Llm,
}

/// Snapshot of the user's configuration, read from the synced settings store.
/// Treated as immutable for the duration of one scan pass.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSettings {
    pub topics: Vec<Topic>,
    pub filter_mode: FilterMode,
    pub api_key: String,
    pub llm_model: String,
    pub debug_mode: bool,
    pub filtering_enabled: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            filter_mode: FilterMode::Keyword,
            api_key: String::new(),
            llm_model: config::DEFAULT_MODEL.to_string(),
            debug_mode: false,
            filtering_enabled: true,
        }
    }
}

// Error type for evaluation and interop failures
#[derive(Debug)]
pub enum FilterError {
    /// The configured model id has no known provider mapping.
    UnsupportedModel(String),
    /// The outbound request could not be built or sent.
    Request(String),
    /// The provider answered with a non-2xx status.
    Status(u16),
    /// The provider response did not contain the expected answer path.
    MalformedResponse(String),
    /// A settings or cache storage operation failed.
    Storage(String),
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::UnsupportedModel(model) => {
                write!(f, "Unsupported model identifier: {}", model)
            }
            FilterError::Request(detail) => write!(f, "Request failed: {}", detail),
            FilterError::Status(code) => write!(f, "Provider returned HTTP {}", code),
            FilterError::MalformedResponse(detail) => {
                write!(f, "Malformed provider response: {}", detail)
            }
            FilterError::Storage(detail) => write!(f, "Storage operation failed: {}", detail),
        }
    }
}

impl std::error::Error for FilterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_from_partial_storage_object() {
        // The settings store returns only the keys that were ever written.
        let raw = r#"{"filterMode":"llm","apiKey":"sk-test"}"#;
        let settings: FilterSettings = serde_json::from_str(raw).unwrap();

        assert_eq!(settings.filter_mode, FilterMode::Llm);
        assert_eq!(settings.api_key, "sk-test");
        assert!(settings.topics.is_empty());
        assert_eq!(settings.llm_model, config::DEFAULT_MODEL);
        assert!(!settings.debug_mode);
        assert!(settings.filtering_enabled);
    }

    #[test]
    fn topic_parses_wire_format() {
        let raw = r#"{
            "keyword": "hiking",
            "type": "topic",
            "duration": 7,
            "startDate": "2026-08-01T00:00:00Z"
        }"#;
        let topic: Topic = serde_json::from_str(raw).unwrap();

        assert_eq!(topic.keyword, "hiking");
        assert_eq!(topic.kind, TopicKind::Topic);
        assert_eq!(topic.duration, 7);
        assert_eq!(topic.start_date.as_deref(), Some("2026-08-01T00:00:00Z"));
        assert!(topic.enabled);
    }

    #[test]
    fn settings_serialize_with_wire_keys() {
        let settings = FilterSettings {
            filter_mode: FilterMode::Llm,
            ..FilterSettings::default()
        };
        let value = serde_json::to_value(&settings).unwrap();

        assert_eq!(value["filterMode"], "llm");
        assert_eq!(value["llmModel"], config::DEFAULT_MODEL);
        assert_eq!(value["filteringEnabled"], true);
    }
}
