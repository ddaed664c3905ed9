//! wasm only: mirror a widget's log into an existing page element.
//!
//! user bodies are set with `textContent`, assistant bodies with
//! `innerHTML` of the formatted (escaped) html.

use bevy::prelude::*;
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::log::{Body, LogEntry};
use crate::message::{Sender, meta_label};
use crate::widget::ChatWidget;

/// attach to a `ChatWidget` entity to mirror its log into `#container_id`.
#[derive(Component, Clone, Debug)]
pub struct DomMirror {
    pub container_id: String,
    shown: usize,
}

impl DomMirror {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self { container_id: container_id.into(), shown: 0 }
    }
}

pub(crate) fn mirror_to_dom(mut q: Query<(&ChatWidget, &mut DomMirror)>) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    for (widget, mut mirror) in &mut q {
        let fresh = widget.log.since(mirror.shown);
        if fresh.is_empty() {
            continue;
        }
        let Some(container) = document.get_element_by_id(&mirror.container_id) else {
            warn!(target: "bevy_chat_widget", "dom mirror: no element #{}", mirror.container_id);
            continue;
        };
        for entry in fresh {
            if let Err(e) = append_entry(&document, &container, entry, &widget.config.assistant_name) {
                warn!(target: "bevy_chat_widget", "dom mirror: append failed: {:?}", e);
            }
        }
        mirror.shown = widget.log.len();
        container.set_scroll_top(container.scroll_height());
    }
}

fn append_entry(
    document: &Document,
    container: &Element,
    entry: &LogEntry,
    assistant_name: &str,
) -> Result<(), JsValue> {
    let user = entry.message.sender == Sender::User;

    let row = document.create_element("div")?;
    row.set_class_name(if user { "flex justify-end" } else { "flex justify-start" });

    let bubble = document.create_element("div")?;
    bubble.set_class_name(if user {
        "max-w-[80%] px-4 py-3 rounded-lg shadow bg-gradient-to-r from-blue-600 to-teal-600 text-white rounded-br-none"
    } else {
        "max-w-[80%] px-4 py-3 rounded-lg shadow bg-gray-700 text-gray-100 rounded-bl-none"
    });

    let content = document.create_element("div")?;
    content.set_class_name("message-content");
    match &entry.body {
        Body::Plain(text) => content.set_text_content(Some(text.as_str())),
        Body::Markup(markup) => content.set_inner_html(&markup.to_html()),
    }

    let meta = document.create_element("div")?;
    meta.set_class_name("text-xs text-gray-300 mt-1 text-right");
    meta.set_text_content(Some(meta_label(entry.message.sender, assistant_name).as_str()));

    bubble.append_child(&content)?;
    bubble.append_child(&meta)?;
    row.append_child(&bubble)?;
    container.append_child(&row)?;
    Ok(())
}
