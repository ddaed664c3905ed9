//! minimal bevy + bevy_chat_widget example against the chat endpoint.
//! - native: set `CHAT_WIDGET_BASE_URL` (e.g. http://127.0.0.1:8000) and
//!   `CHAT_WIDGET_COOKIE` (`csrftoken=...; sessionid=...`) for a logged-in
//!   session.
//! - wasm: requests are relative to the page; the log is also mirrored into
//!   `#chat-messages` when the page has one.
//!
//! click "chat" to open the panel, type, press enter.

use bevy::prelude::*;
use bevy_chat_widget::{
    ChatReplyEvt, ChatTransports, ChatWidgetPlugin, HistoryLoadedEvt, HttpTransport, WidgetConfig,
    spawn_chat_widget,
};
use std::sync::Arc;

#[derive(Resource, Clone)]
struct DemoConfig(WidgetConfig);

fn main() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let config = WidgetConfig::from_env();
    let transport = Arc::new(HttpTransport::new(config.clone()));

    App::new()
        .insert_resource(ClearColor(Color::srgb_u8(18, 18, 20)))
        .insert_resource(ChatTransports::new(transport))
        .insert_resource(DemoConfig(config))
        .add_plugins(DefaultPlugins)
        .add_plugins(ChatWidgetPlugin)
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (on_reply, on_history).after(bevy_chat_widget::ChatWidgetSet::Drain),
        )
        .run();
}

fn setup(mut commands: Commands, config: Res<DemoConfig>) {
    info!(
        target: "chat_demo",
        "history={} send={} cookie_present={}",
        config.0.history_url(),
        config.0.send_url(),
        !config.0.cookie.is_empty()
    );
    commands.spawn(Camera2d);
    let widget = spawn_chat_widget(&mut commands, config.0.clone(), Handle::default());
    info!(target: "chat_demo", "widget spawned: {:?}", widget);

    #[cfg(target_arch = "wasm32")]
    commands
        .entity(widget)
        .insert(bevy_chat_widget::DomMirror::new("chat-messages"));
}

fn on_reply(mut ev: EventReader<ChatReplyEvt>) {
    for ChatReplyEvt { entity, outcome } in ev.read() {
        info!(target: "chat_demo", "reply (entity={:?}): {:?}", entity, outcome);
    }
}

fn on_history(mut ev: EventReader<HistoryLoadedEvt>) {
    for HistoryLoadedEvt { entity, turns } in ev.read() {
        info!(target: "chat_demo", "history (entity={:?}): {} turns", entity, turns);
    }
}
