//! Identity resolution for post DOM nodes.
//!
//! A post's identity is taken from the platform-assigned activity URN found
//! in the nearest `[data-id]` ancestor. Posts without such an ancestor fall
//! back to a content-prefix identity, which is best-effort: it may collide or
//! churn when the platform re-renders the post.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use web_sys::Element;

use crate::config::{FALLBACK_ID_CHARS, IDENTITY_ANCESTOR_SELECTOR, IDENTITY_ATTR};
use crate::PostIdentity;

static ACTIVITY_URN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"urn:li:activity:\d+").unwrap());
static WHITESPACE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Derive a stable identity for a post element.
///
/// Two nodes rendering the same feed item must resolve to the same identity;
/// the cache depends on it.
pub fn resolve(post: &Element) -> PostIdentity {
    let container = match post.closest(IDENTITY_ANCESTOR_SELECTOR) {
        Ok(Some(container)) => container,
        _ => {
            warn!("no {} ancestor found for post, falling back to content prefix (collision risk)", IDENTITY_ATTR);
            return content_fallback(&post.text_content().unwrap_or_default());
        }
    };

    let attr = container.get_attribute(IDENTITY_ATTR).unwrap_or_default();
    identity_from_attr(&attr)
}

/// Extract the identity from a structured identifier attribute: the first
/// activity-URN-shaped substring wins, otherwise the full attribute value.
pub fn identity_from_attr(attr: &str) -> PostIdentity {
    match ACTIVITY_URN_REGEX.find(attr) {
        Some(m) => m.as_str().to_string(),
        None => attr.to_string(),
    }
}

/// Degraded-mode identity: the first 100 characters of the post text with
/// whitespace runs collapsed to a single separator.
pub fn content_fallback(text: &str) -> PostIdentity {
    let prefix: String = text.chars().take(FALLBACK_ID_CHARS).collect();
    WHITESPACE_RUN_REGEX.replace_all(&prefix, "-").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_urn_wins_when_attribute_carries_several() {
        let attr = "urn:li:activity:123 urn:li:activity:456";
        assert_eq!(identity_from_attr(attr), "urn:li:activity:123");
    }

    #[test]
    fn urn_is_extracted_from_composite_attribute() {
        let attr = "urn:li:aggregate:(urn:li:activity:7123456789,urn:li:activity:7987654321)";
        assert_eq!(identity_from_attr(attr), "urn:li:activity:7123456789");
    }

    #[test]
    fn full_attribute_used_when_no_urn_present() {
        let attr = "some-opaque-id-42";
        assert_eq!(identity_from_attr(attr), "some-opaque-id-42");
    }

    #[test]
    fn fallback_collapses_whitespace_runs() {
        assert_eq!(content_fallback("Hello   world"), "Hello-world");
        assert_eq!(content_fallback("a\n\t b"), "a-b");
    }

    #[test]
    fn fallback_caps_at_100_chars_before_collapsing() {
        let text = "x".repeat(250);
        assert_eq!(content_fallback(&text), "x".repeat(100));
    }
}
