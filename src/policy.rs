//! Hide/show decision policy.
//!
//! Keyword mode is a synchronous OR over the active topics; remote mode
//! suspends on one LLM call per post. Topic expiry is computed here at
//! decision time from `startDate` and `duration`, never cached.

use chrono::DateTime;
use log::debug;

use crate::config::MS_PER_DAY;
use crate::llm::{self, Provider};
use crate::{FilterError, FilterMode, FilterSettings, Topic};

/// Outcome of evaluating one post. `matched` carries the first satisfying
/// keyword for diagnostic attribution; remote-mode verdicts have no single
/// matching topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub hide: bool,
    pub matched: Option<String>,
}

impl Decision {
    pub fn show() -> Self {
        Self {
            hide: false,
            matched: None,
        }
    }
}

/// Evaluate one post's text against the current settings.
///
/// Synchronous in keyword mode; suspends on the provider call in remote mode.
/// `now_ms` is the caller's clock (epoch milliseconds) so expiry is testable.
pub async fn decide(
    text: &str,
    settings: &FilterSettings,
    now_ms: i64,
) -> Result<Decision, FilterError> {
    match settings.filter_mode {
        FilterMode::Keyword => Ok(keyword_decision(text, &settings.topics, now_ms)),
        FilterMode::Llm => remote_decision(text, settings, now_ms).await,
    }
}

/// First enabled, non-expired topic whose keyword occurs in the text
/// (case-insensitive substring) wins; topic list order is the tie-break.
pub fn keyword_decision(text: &str, topics: &[Topic], now_ms: i64) -> Decision {
    let haystack = text.to_lowercase();
    for topic in topics {
        if !topic_is_active(topic, now_ms) {
            continue;
        }
        // An empty keyword would match every post.
        if topic.keyword.is_empty() {
            continue;
        }
        if haystack.contains(&topic.keyword.to_lowercase()) {
            return Decision {
                hide: true,
                matched: Some(topic.keyword.clone()),
            };
        }
    }
    Decision::show()
}

/// A topic is active while it is enabled and inside its activation window.
/// `duration == 0` never expires; an unparseable `startDate` cannot expire
/// the topic either.
pub fn topic_is_active(topic: &Topic, now_ms: i64) -> bool {
    if !topic.enabled {
        return false;
    }
    if topic.duration == 0 {
        return true;
    }
    let Some(start) = topic.start_date.as_deref() else {
        return true;
    };
    match DateTime::parse_from_rfc3339(start) {
        Ok(start) => now_ms - start.timestamp_millis() <= i64::from(topic.duration) * MS_PER_DAY,
        Err(_) => true,
    }
}

/// Interpret a provider answer: hide iff it contains the literal token
/// `true`, case-insensitive. Anything else (including "false", empty or
/// malformed text) shows the post.
pub fn verdict_from_answer(answer: &str) -> bool {
    answer.to_lowercase().contains("true")
}

async fn remote_decision(
    text: &str,
    settings: &FilterSettings,
    now_ms: i64,
) -> Result<Decision, FilterError> {
    // Without an API key remote mode degrades to showing everything.
    if settings.api_key.is_empty() {
        return Ok(Decision::show());
    }

    let keywords: Vec<&str> = settings
        .topics
        .iter()
        .filter(|t| topic_is_active(t, now_ms))
        .map(|t| t.keyword.as_str())
        .collect();
    let prompt = llm::build_prompt(text, &keywords);
    let provider = Provider::from_model_id(&settings.llm_model)?;

    if settings.debug_mode {
        log_would_be_request(&provider, &settings.llm_model, text, &keywords, &prompt);
        // Debug mode contract: no network call, post stays visible.
        return Ok(Decision::show());
    }

    let answer = provider.query(&prompt, &settings.api_key).await?;
    Ok(Decision {
        hide: verdict_from_answer(&answer),
        matched: None,
    })
}

fn log_would_be_request(
    provider: &Provider,
    model: &str,
    text: &str,
    keywords: &[&str],
    prompt: &str,
) {
    debug!("LLM query debug info:");
    debug!("model: {}", model);
    debug!("content: {}", text);
    debug!("topics: {}", keywords.join(", "));
    debug!("endpoint: {}", provider.endpoint("<api-key>"));
    debug!("request body: {}", provider.request_body(prompt));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MODEL;

    const NOW: i64 = 1_787_961_600_000; // 2026-08-29T00:00:00Z

    fn topic(keyword: &str) -> Topic {
        Topic {
            keyword: keyword.to_string(),
            ..Topic::default()
        }
    }

    #[test]
    fn enabled_permanent_topic_hides_matching_post() {
        let decision = keyword_decision("I love hiking", &[topic("hiking")], NOW);
        assert!(decision.hide);
        assert_eq!(decision.matched.as_deref(), Some("hiking"));
    }

    #[test]
    fn disabled_topic_is_skipped_entirely() {
        let mut t = topic("hiking");
        t.enabled = false;
        let decision = keyword_decision("I love hiking", &[t], NOW);
        assert!(!decision.hide);
        assert_eq!(decision.matched, None);
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        assert!(keyword_decision("Loved the HIKING trip", &[topic("Hiking")], NOW).hide);
        assert!(!keyword_decision("gone fishing", &[topic("hiking")], NOW).hide);
    }

    #[test]
    fn first_satisfying_topic_is_attributed() {
        let topics = [topic("love"), topic("hiking")];
        let decision = keyword_decision("I love hiking", &topics, NOW);
        assert_eq!(decision.matched.as_deref(), Some("love"));
    }

    #[test]
    fn empty_topic_list_shows_everything() {
        assert!(!keyword_decision("anything at all", &[], NOW).hide);
    }

    #[test]
    fn empty_keyword_never_matches() {
        assert!(!keyword_decision("anything at all", &[topic("")], NOW).hide);
    }

    #[test]
    fn duration_zero_never_expires() {
        let mut t = topic("hiking");
        t.start_date = Some("2001-01-01T00:00:00Z".to_string());
        assert!(topic_is_active(&t, NOW));
    }

    #[test]
    fn topic_active_until_exactly_duration_days() {
        let mut t = topic("hiking");
        t.duration = 7;
        t.start_date = Some("2026-08-22T00:00:00Z".to_string());

        // Probe at exactly start + 7 days: still active.
        assert!(topic_is_active(&t, NOW));
        // One second past the window: expired.
        assert!(!topic_is_active(&t, NOW + 1_000));
    }

    #[test]
    fn expired_topic_does_not_hide() {
        let mut t = topic("hiking");
        t.duration = 1;
        t.start_date = Some("2026-08-01T00:00:00Z".to_string());
        assert!(!keyword_decision("I love hiking", &[t], NOW).hide);
    }

    #[test]
    fn unparseable_start_date_stays_active() {
        let mut t = topic("hiking");
        t.duration = 1;
        t.start_date = Some("not a date".to_string());
        assert!(topic_is_active(&t, NOW));
    }

    #[test]
    fn answer_token_match_is_case_insensitive() {
        assert!(verdict_from_answer("True"));
        assert!(verdict_from_answer("the answer is TRUE."));
        assert!(!verdict_from_answer("false"));
        assert!(!verdict_from_answer(""));
        assert!(!verdict_from_answer("yes"));
    }

    #[test]
    fn remote_mode_without_api_key_shows_post() {
        let settings = FilterSettings {
            filter_mode: FilterMode::Llm,
            topics: vec![topic("hiking")],
            ..FilterSettings::default()
        };
        let decision = block_on(decide("I love hiking", &settings, NOW)).unwrap();
        assert!(!decision.hide);
    }

    #[test]
    fn debug_mode_short_circuits_without_network() {
        let settings = FilterSettings {
            filter_mode: FilterMode::Llm,
            api_key: "sk-test".to_string(),
            llm_model: DEFAULT_MODEL.to_string(),
            debug_mode: true,
            topics: vec![topic("hiking")],
            ..FilterSettings::default()
        };
        // Any attempted fetch would abort here on a native target; reaching a
        // verdict proves the call was skipped.
        let decision = block_on(decide("I love hiking", &settings, NOW)).unwrap();
        assert!(!decision.hide);
        assert_eq!(decision.matched, None);
    }

    #[test]
    fn unknown_model_surfaces_as_error() {
        let settings = FilterSettings {
            filter_mode: FilterMode::Llm,
            api_key: "sk-test".to_string(),
            llm_model: "mystery-model".to_string(),
            ..FilterSettings::default()
        };
        let err = block_on(decide("text", &settings, NOW)).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedModel(_)));
    }

    /// Minimal single-future executor; every policy future here resolves
    /// without ever returning `Pending`.
    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        use std::pin::pin;
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn noop_raw_waker() -> RawWaker {
            const VTABLE: RawWakerVTable =
                RawWakerVTable::new(|_| noop_raw_waker(), |_| {}, |_| {}, |_| {});
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut fut = pin!(fut);
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(out) => out,
            Poll::Pending => panic!("policy future suspended unexpectedly"),
        }
    }
}
