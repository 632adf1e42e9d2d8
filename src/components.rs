//! Yew view components for the settings popup.

use yew::prelude::*;

use feed_filter::Topic;

/// Payload of an edit to one topic row.
#[derive(Clone, PartialEq)]
pub enum TopicEdit {
    Keyword(String),
    Duration(String),
    ToggleEnabled,
    Remove,
}

#[derive(Properties, PartialEq)]
pub struct TopicRowProps {
    pub index: usize,
    pub topic: Topic,
    pub error: Option<String>,
    pub on_edit: Callback<(usize, TopicEdit)>,
}

/// One editable topic: keyword, duration in days, enabled toggle, remove.
#[function_component(TopicRow)]
pub fn topic_row(props: &TopicRowProps) -> Html {
    let index = props.index;

    let on_keyword = {
        let on_edit = props.on_edit.clone();
        Callback::from(move |e: InputEvent| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            on_edit.emit((index, TopicEdit::Keyword(input.value())));
        })
    };
    let on_duration = {
        let on_edit = props.on_edit.clone();
        Callback::from(move |e: Event| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            on_edit.emit((index, TopicEdit::Duration(input.value())));
        })
    };
    let on_toggle = {
        let on_edit = props.on_edit.clone();
        Callback::from(move |_: Event| on_edit.emit((index, TopicEdit::ToggleEnabled)))
    };
    let on_remove = {
        let on_edit = props.on_edit.clone();
        Callback::from(move |_: MouseEvent| on_edit.emit((index, TopicEdit::Remove)))
    };

    html! {
        <div class="topic-item">
            <input type="text"
                class="topic-keyword"
                placeholder="Enter topic or keyword"
                value={props.topic.keyword.clone()}
                oninput={on_keyword}
            />
            <input type="number"
                class={if props.error.is_some() { "topic-duration invalid" } else { "topic-duration" }}
                placeholder="Days (0 for permanent)"
                min="0"
                value={props.topic.duration.to_string()}
                onchange={on_duration}
            />
            <label class="topic-enabled">
                <input type="checkbox"
                    checked={props.topic.enabled}
                    onchange={on_toggle}
                />
                { "Enabled" }
            </label>
            <button class="remove-topic" onclick={on_remove}>{ "Remove" }</button>
            if let Some(ref err) = props.error {
                <div class="input-error">{ err }</div>
            }
        </div>
    }
}

/// Transient status line shown after save/clear actions.
#[derive(Properties, PartialEq)]
pub struct StatusLineProps {
    pub message: Option<String>,
}

#[function_component(StatusLine)]
pub fn status_line(props: &StatusLineProps) -> Html {
    match &props.message {
        Some(message) => html! { <div class="status-line">{ message }</div> },
        None => html! {},
    }
}
