//! Settings popup for the feed-filter extension, rendered with Yew.
//!
//! Produces the configuration record the content script consumes: topic
//! list, filter mode, API key, model, debug toggle and the global on/off
//! toggle. Saving stamps every topic's `startDate` with the current time and
//! writes the synced settings store; the clear-cache button messages the
//! content script in the active tab.

use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use feed_filter::config::{CLEAR_CACHE_ACTION, DEFAULT_MODEL};
use feed_filter::{chrome, FilterMode, FilterSettings, Topic};

mod components;
mod utils;

use components::{StatusLine, TopicEdit, TopicRow};

const MODEL_CHOICES: [&str; 3] = [
    "gpt-4o-mini",
    "gemini-2.0-flash-exp",
    "claude-3-5-sonnet-20241022",
];

#[function_component(Popup)]
fn popup() -> Html {
    let topics = use_state(Vec::<Topic>::new);
    let topic_errors = use_state(Vec::<Option<String>>::new);
    let filter_mode = use_state(|| FilterMode::Keyword);
    let api_key = use_state(String::new);
    let llm_model = use_state(|| DEFAULT_MODEL.to_string());
    let debug_mode = use_state(|| false);
    let filtering_enabled = use_state(|| true);
    let status = use_state(|| None::<String>);

    // Load saved settings on mount.
    {
        let topics = topics.clone();
        let topic_errors = topic_errors.clone();
        let filter_mode = filter_mode.clone();
        let api_key = api_key.clone();
        let llm_model = llm_model.clone();
        let debug_mode = debug_mode.clone();
        let filtering_enabled = filtering_enabled.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let settings = chrome::load_settings().await;
                topic_errors.set(vec![None; settings.topics.len()]);
                topics.set(settings.topics);
                filter_mode.set(settings.filter_mode);
                api_key.set(settings.api_key);
                llm_model.set(settings.llm_model);
                debug_mode.set(settings.debug_mode);
                filtering_enabled.set(settings.filtering_enabled);
            });
        });
    }

    let on_topic_edit = {
        let topics = topics.clone();
        let topic_errors = topic_errors.clone();
        Callback::from(move |(index, edit): (usize, TopicEdit)| {
            let mut list = (*topics).clone();
            let mut errors = (*topic_errors).clone();
            errors.resize(list.len(), None);
            if index >= list.len() {
                return;
            }
            match edit {
                TopicEdit::Keyword(keyword) => list[index].keyword = keyword,
                TopicEdit::Duration(text) => match utils::validate_duration_days(&text) {
                    Ok(days) => {
                        list[index].duration = days;
                        errors[index] = None;
                    }
                    Err(err) => errors[index] = Some(err),
                },
                TopicEdit::ToggleEnabled => list[index].enabled = !list[index].enabled,
                TopicEdit::Remove => {
                    list.remove(index);
                    errors.remove(index);
                }
            }
            topics.set(list);
            topic_errors.set(errors);
        })
    };

    let on_add_topic = {
        let topics = topics.clone();
        let topic_errors = topic_errors.clone();
        Callback::from(move |_: MouseEvent| {
            let mut list = (*topics).clone();
            list.push(Topic::default());
            let mut errors = (*topic_errors).clone();
            errors.push(None);
            topics.set(list);
            topic_errors.set(errors);
        })
    };

    let on_mode_change = {
        let filter_mode = filter_mode.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            let mode = if select.value() == "llm" {
                FilterMode::Llm
            } else {
                FilterMode::Keyword
            };
            filter_mode.set(mode);
        })
    };

    let on_model_change = {
        let llm_model = llm_model.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            llm_model.set(select.value());
        })
    };

    let on_api_key_input = {
        let api_key = api_key.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            api_key.set(input.value());
        })
    };

    let on_debug_toggle = {
        let debug_mode = debug_mode.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            debug_mode.set(input.checked());
        })
    };

    let on_filtering_toggle = {
        let filtering_enabled = filtering_enabled.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            filtering_enabled.set(input.checked());
        })
    };

    let on_save = {
        let topics = topics.clone();
        let filter_mode = filter_mode.clone();
        let api_key = api_key.clone();
        let llm_model = llm_model.clone();
        let debug_mode = debug_mode.clone();
        let filtering_enabled = filtering_enabled.clone();
        let status = status.clone();
        Callback::from(move |_: MouseEvent| {
            let now = chrono::Utc::now().to_rfc3339();
            // Empty keywords are dropped: an empty keyword would match every
            // post. startDate is stamped at save time for every topic.
            let saved: Vec<Topic> = (*topics)
                .iter()
                .filter(|topic| !topic.keyword.trim().is_empty())
                .map(|topic| Topic {
                    keyword: topic.keyword.trim().to_string(),
                    start_date: Some(now.clone()),
                    ..topic.clone()
                })
                .collect();

            let settings = FilterSettings {
                topics: saved,
                filter_mode: *filter_mode,
                api_key: (*api_key).clone(),
                llm_model: (*llm_model).clone(),
                debug_mode: *debug_mode,
                filtering_enabled: *filtering_enabled,
            };

            let status = status.clone();
            spawn_local(async move {
                match chrome::save_settings(&settings).await {
                    Ok(()) => status.set(Some("Settings saved".to_string())),
                    Err(err) => status.set(Some(format!("Save failed: {}", err))),
                }
            });
        })
    };

    let on_clear_cache = {
        let status = status.clone();
        Callback::from(move |_: MouseEvent| {
            let status = status.clone();
            spawn_local(async move {
                match chrome::send_action_to_active_tab(CLEAR_CACHE_ACTION).await {
                    Ok(()) => status.set(Some("Post cache cleared".to_string())),
                    Err(err) => status.set(Some(format!("Clear failed: {}", err))),
                }
            });
        })
    };

    let llm_selected = *filter_mode == FilterMode::Llm;

    html! {
        <div class="popup">
            <h1>{ "Feed Filter" }</h1>

            <div class="form-group checkbox-group">
                <label>
                    <input type="checkbox"
                        checked={*filtering_enabled}
                        onchange={on_filtering_toggle}
                    />
                    { "Filtering enabled" }
                </label>
            </div>

            <div class="form-group">
                <label for="filter-mode">{ "Filter mode:" }</label>
                <select id="filter-mode" onchange={on_mode_change}>
                    <option value="keyword" selected={!llm_selected}>{ "Keywords" }</option>
                    <option value="llm" selected={llm_selected}>{ "LLM analysis" }</option>
                </select>
            </div>

            if llm_selected {
                <div class="form-group api-key-section">
                    <label for="api-key">{ "API key:" }</label>
                    <input type="password"
                        id="api-key"
                        value={(*api_key).clone()}
                        oninput={on_api_key_input}
                    />
                    <label for="llm-model">{ "Model:" }</label>
                    <select id="llm-model" onchange={on_model_change}>
                        { MODEL_CHOICES.iter().map(|choice| html! {
                            <option value={*choice} selected={*choice == *llm_model}>
                                { choice }
                            </option>
                        }).collect::<Html>() }
                    </select>
                </div>
            }

            <div class="topics-section">
                <h2>{ "Topics" }</h2>
                { (*topics).iter().enumerate().map(|(index, topic)| html! {
                    <TopicRow key={index}
                        {index}
                        topic={topic.clone()}
                        error={(*topic_errors).get(index).cloned().flatten()}
                        on_edit={on_topic_edit.clone()}
                    />
                }).collect::<Html>() }
                <button class="add-topic" onclick={on_add_topic}>{ "Add topic" }</button>
            </div>

            <div class="form-group checkbox-group">
                <label>
                    <input type="checkbox"
                        checked={*debug_mode}
                        onchange={on_debug_toggle}
                    />
                    { "Debug mode (log LLM requests without sending)" }
                </label>
            </div>

            <div class="actions">
                <button class="save-settings" onclick={on_save}>{ "Save settings" }</button>
                <button class="clear-cache" onclick={on_clear_cache}>{ "Clear post cache" }</button>
            </div>

            <StatusLine message={(*status).clone()} />
        </div>
    }
}

fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    yew::Renderer::<Popup>::new().render();
}
