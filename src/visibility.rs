//! DOM presentation of verdicts plus the filtered-post audit log.

use log::{info, warn};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::config::{ACTIVITY_URN_PREFIX, FEED_UPDATE_URL, OVERRIDE_FRAGMENT, POST_SELECTOR, PREVIEW_CHARS};

/// Hide or reveal one post element.
pub fn apply(post: &Element, hide: bool) {
    let Some(element) = post.dyn_ref::<HtmlElement>() else {
        return;
    };
    let style = element.style();
    let result = if hide {
        style.set_property("display", "none")
    } else {
        style.remove_property("display").map(|_| ())
    };
    if let Err(err) = result {
        warn!("could not update post visibility: {:?}", err);
    }
}

/// Force every post in the document back to visible. Used when the global
/// filtering toggle is off.
pub fn reveal_all(document: &Document) {
    let Ok(posts) = document.query_selector_all(POST_SELECTOR) else {
        return;
    };
    for index in 0..posts.length() {
        if let Some(element) = posts.item(index).and_then(|node| node.dyn_into().ok()) {
            apply(&element, false);
        }
    }
}

/// Emit the structured audit line for a hidden post: matched topic, resolved
/// identity, a direct link that reopens the post with filtering disabled, and
/// a truncated content preview.
pub fn log_hidden(identity: &str, matched: Option<&str>, text: &str) {
    let topic = matched.unwrap_or("LLM Analysis");
    let link = direct_link(identity).unwrap_or_else(|| "URL not available".to_string());
    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
    info!(
        "post filtered\ntopic: {}\nactivity id: {}\ndirect link (filtering disabled): {}\ncontent preview: {}...",
        topic, identity, link, preview
    );
}

/// URN-shaped identities map to a feed URL carrying the override fragment so
/// the post can be viewed without being re-hidden.
pub fn direct_link(identity: &str) -> Option<String> {
    identity
        .starts_with(ACTIVITY_URN_PREFIX)
        .then(|| format!("{}{}/{}", FEED_UPDATE_URL, identity, OVERRIDE_FRAGMENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urn_identity_yields_override_link() {
        assert_eq!(
            direct_link("urn:li:activity:123").as_deref(),
            Some("https://www.linkedin.com/feed/update/urn:li:activity:123/#override-deletion")
        );
    }

    #[test]
    fn fallback_identity_has_no_link() {
        assert_eq!(direct_link("Hello-world"), None);
    }
}
