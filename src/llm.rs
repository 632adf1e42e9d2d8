//! Provider adapters for remote-model evaluation.
//!
//! Each supported model id maps to a fixed endpoint, auth header shape,
//! request body shape and JSON answer path. Request and response shaping is
//! plain `serde_json` so it stays unit-testable; only `query` touches the
//! network (browser fetch).

use serde_json::{json, Value};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use crate::FilterError;

const ANALYSIS_INSTRUCTION: &str =
    "Analyze if the following content matches any of the given topics. Respond with true or false only.";

/// Build the single prompt embedding the post text and the topic keywords.
pub fn build_prompt(content: &str, keywords: &[&str]) -> String {
    format!("Content: {}\nTopics: {}", content, keywords.join(", "))
}

/// A supported remote-model provider, selected by exact model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
    Claude,
}

impl Provider {
    /// Map a configured model id to its provider. Unknown ids are an explicit
    /// request-construction failure, never a silently empty request.
    pub fn from_model_id(model: &str) -> Result<Self, FilterError> {
        match model {
            "gpt-4o-mini" => Ok(Provider::OpenAi),
            "gemini-2.0-flash-exp" => Ok(Provider::Gemini),
            "claude-3-5-sonnet-20241022" => Ok(Provider::Claude),
            other => Err(FilterError::UnsupportedModel(other.to_string())),
        }
    }

    /// Gemini carries the key as a query parameter; the other providers use
    /// headers and a fixed URL.
    pub fn endpoint(&self, api_key: &str) -> String {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1/chat/completions".to_string(),
            Provider::Gemini => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key={}",
                api_key
            ),
            Provider::Claude => "https://api.anthropic.com/v1/messages".to_string(),
        }
    }

    pub fn auth_headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        match self {
            Provider::OpenAi => vec![("Authorization", format!("Bearer {}", api_key))],
            Provider::Gemini => Vec::new(),
            Provider::Claude => vec![("x-api-key", api_key.to_string())],
        }
    }

    pub fn request_body(&self, prompt: &str) -> Value {
        match self {
            Provider::OpenAi => json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": ANALYSIS_INSTRUCTION },
                    { "role": "user", "content": prompt },
                ],
            }),
            Provider::Gemini => json!({
                "contents": [{
                    "parts": [{
                        "text": format!("{}\n\n{}", ANALYSIS_INSTRUCTION, prompt),
                    }],
                }],
            }),
            Provider::Claude => json!({
                "model": "claude-3-5-sonnet-20241022",
                "messages": [{
                    "role": "user",
                    "content": format!("{}\n\n{}", ANALYSIS_INSTRUCTION, prompt),
                }],
            }),
        }
    }

    /// Pull the answer text out of the provider-specific response shape.
    pub fn extract_answer(&self, response: &Value) -> Result<String, FilterError> {
        let path = match self {
            Provider::OpenAi => "/choices/0/message/content",
            Provider::Gemini => "/candidates/0/content/parts/0/text",
            Provider::Claude => "/content/0/text",
        };
        response
            .pointer(path)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| FilterError::MalformedResponse(format!("missing {}", path)))
    }

    /// POST the evaluation request and return the raw answer text.
    ///
    /// Network failure, non-2xx status and missing answer paths all propagate
    /// as errors; the caller decides what a failed evaluation means.
    pub async fn query(&self, prompt: &str, api_key: &str) -> Result<String, FilterError> {
        let headers = Headers::new().map_err(js_err)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_err)?;
        for (name, value) in self.auth_headers(api_key) {
            headers.set(name, &value).map_err(js_err)?;
        }

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_headers(&JsValue::from(headers));
        opts.set_body(&JsValue::from_str(&self.request_body(prompt).to_string()));

        let request =
            Request::new_with_str_and_init(&self.endpoint(api_key), &opts).map_err(js_err)?;
        let response = JsFuture::from(gloo_utils::window().fetch_with_request(&request))
            .await
            .map_err(js_err)?;
        let response: Response = response.unchecked_into();

        if !response.ok() {
            return Err(FilterError::Status(response.status()));
        }

        let body = JsFuture::from(response.text().map_err(js_err)?)
            .await
            .map_err(js_err)?
            .as_string()
            .unwrap_or_default();
        let body: Value = serde_json::from_str(&body)
            .map_err(|e| FilterError::MalformedResponse(e.to_string()))?;
        self.extract_answer(&body)
    }
}

fn js_err(err: JsValue) -> FilterError {
    FilterError::Request(format!("{:?}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_map_to_providers() {
        assert!(matches!(
            Provider::from_model_id("gpt-4o-mini"),
            Ok(Provider::OpenAi)
        ));
        assert!(matches!(
            Provider::from_model_id("gemini-2.0-flash-exp"),
            Ok(Provider::Gemini)
        ));
        assert!(matches!(
            Provider::from_model_id("claude-3-5-sonnet-20241022"),
            Ok(Provider::Claude)
        ));
    }

    #[test]
    fn unknown_model_is_an_explicit_error() {
        let err = Provider::from_model_id("gpt-5-turbo-ultra").unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedModel(m) if m == "gpt-5-turbo-ultra"));
    }

    #[test]
    fn prompt_embeds_content_and_keywords() {
        let prompt = build_prompt("I love hiking", &["hiking", "camping"]);
        assert_eq!(prompt, "Content: I love hiking\nTopics: hiking, camping");
    }

    #[test]
    fn openai_request_uses_chat_message_array() {
        let body = Provider::OpenAi.request_body("Content: x\nTopics: y");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], ANALYSIS_INSTRUCTION);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Content: x\nTopics: y");
    }

    #[test]
    fn gemini_request_uses_content_parts_and_query_key() {
        let body = Provider::Gemini.request_body("p");
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with(ANALYSIS_INSTRUCTION));
        assert!(text.ends_with("p"));

        assert!(Provider::Gemini.endpoint("KEY123").ends_with("?key=KEY123"));
        assert!(Provider::Gemini.auth_headers("KEY123").is_empty());
    }

    #[test]
    fn claude_request_uses_key_header() {
        let headers = Provider::Claude.auth_headers("sk-ant");
        assert_eq!(headers, vec![("x-api-key", "sk-ant".to_string())]);

        let body = Provider::Claude.request_body("p");
        assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn openai_bearer_header() {
        let headers = Provider::OpenAi.auth_headers("sk-live");
        assert_eq!(headers, vec![("Authorization", "Bearer sk-live".to_string())]);
    }

    #[test]
    fn answers_extracted_per_provider_path() {
        let openai = serde_json::json!({
            "choices": [{ "message": { "content": "true" } }]
        });
        assert_eq!(Provider::OpenAi.extract_answer(&openai).unwrap(), "true");

        let gemini = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "false" }] } }]
        });
        assert_eq!(Provider::Gemini.extract_answer(&gemini).unwrap(), "false");

        let claude = serde_json::json!({
            "content": [{ "text": "true" }]
        });
        assert_eq!(Provider::Claude.extract_answer(&claude).unwrap(), "true");
    }

    #[test]
    fn missing_answer_path_is_malformed_response() {
        let response = serde_json::json!({ "error": { "message": "rate limited" } });
        let err = Provider::OpenAi.extract_answer(&response).unwrap_err();
        assert!(matches!(err, FilterError::MalformedResponse(_)));
    }
}
