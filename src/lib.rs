//! bevy_chat_widget: a collapsible assistant chat panel for bevy.
//!
//! - `ChatWidget` (a component) owns the log, panel state, input and
//!   loading flag; everything that mutates it runs on the main thread.
//! - assistant text goes through an escape-then-markup transform
//!   (`format`); user text is always literal.
//! - history fetch and message send go through a `ChatTransport`. on
//!   native we spawn onto a tiny tokio runtime, on wasm we use bevy's async
//!   pool; results come back through a bounded inbox drained in `Update`.
//!
//! history is loaded once when a widget is spawned. nothing is persisted
//! on this side; the server owns the conversation.

use bevy::prelude::*;
use bevy::tasks::AsyncComputeTaskPool;
use flume::{Receiver, Sender, TryRecvError};
use std::collections::HashMap;
use std::sync::Arc;

pub mod config;
#[cfg(target_arch = "wasm32")]
pub mod dom;
pub mod format;
pub mod log;
pub mod message;
pub mod panel;
pub mod transport;
pub mod ui;
pub mod widget;

pub use config::{ConfigError, WidgetConfig};
#[cfg(target_arch = "wasm32")]
pub use dom::DomMirror;
pub use format::{Fragment, Markup, escape_html, format_assistant};
pub use log::{Body, ConversationLog, LogEntry};
pub use message::{Message, Sender as MessageSender};
pub use panel::PanelState;
pub use transport::{ChatTransport, HistoryTurn, HttpTransport, SendReply, TransportError};
pub use ui::spawn_chat_widget;
pub use widget::{ChatWidget, ReplyOutcome};

/// a map of ready-to-use transports.
///
/// - `default`: used when a `ChatWidget` doesn't specify a `key`
/// - `per_key`: named transports if widgets talk to different endpoints
#[derive(Resource, Clone)]
pub struct ChatTransports {
    pub default: Arc<dyn ChatTransport>,
    pub per_key: HashMap<String, Arc<dyn ChatTransport>>,
}

impl ChatTransports {
    pub fn new(default: Arc<dyn ChatTransport>) -> Self {
        Self { default, per_key: HashMap::new() }
    }
    pub fn with(mut self, key: impl Into<String>, transport: Arc<dyn ChatTransport>) -> Self {
        self.per_key.insert(key.into(), transport);
        self
    }
    fn get(&self, key: Option<&String>) -> Arc<dyn ChatTransport> {
        if let Some(k) = key {
            self.per_key.get(k).cloned().unwrap_or_else(|| self.default.clone())
        } else {
            self.default.clone()
        }
    }
}

/// on native we keep a tiny tokio runtime to drive transport futures
/// (the http transport runs blocking io in `spawn_blocking` on it).
#[cfg(not(target_arch = "wasm32"))]
#[derive(Resource, Clone)]
pub struct TokioRt(pub Arc<tokio::runtime::Runtime>);

#[cfg(not(target_arch = "wasm32"))]
impl Default for TokioRt {
    fn default() -> Self {
        info!(target: "bevy_chat_widget", "ChatWidget: initializing Tokio multi-thread runtime (native)");
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("tokio runtime");
        Self(Arc::new(rt))
    }
}

/// system ordering so apps can react after transport results land.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum ChatWidgetSet {
    /// transport results are applied to widgets here (in `Update`)
    Drain,
}

/// insert on a widget entity to fetch its history. one-shot.
#[derive(Component, Clone, Debug, Default)]
pub struct HistoryRequest;

/// inserted by `submit` once the user line is rendered. one-shot.
#[derive(Component, Clone, Debug)]
pub struct SendRequest {
    pub text: String,
}

/// submit `text` from `widget` (on entity `target`).
///
/// renders the user line, clears input and enters loading right away; the
/// transport call is spawned next `Update`. blank text does nothing and
/// returns false.
pub fn submit(commands: &mut Commands, target: Entity, widget: &mut ChatWidget, text: &str) -> bool {
    match widget.begin_submit(text) {
        Some(text) => {
            queue_send(commands, target, text);
            true
        }
        None => false,
    }
}

/// like `submit`, using the widget's input buffer.
pub fn submit_input(commands: &mut Commands, target: Entity, widget: &mut ChatWidget) -> bool {
    match widget.begin_submit_input() {
        Some(text) => {
            queue_send(commands, target, text);
            true
        }
        None => false,
    }
}

fn queue_send(commands: &mut Commands, target: Entity, text: String) {
    info!(target: "bevy_chat_widget", "submit: entity={:?} len={}", target, text.len());
    commands.entity(target).insert(SendRequest { text });
}

#[derive(Event, Debug)]
pub struct ChatReplyEvt {
    pub entity: Entity,
    pub outcome: ReplyOutcome,
}

#[derive(Event, Debug)]
pub struct HistoryLoadedEvt {
    pub entity: Entity,
    /// rendered turns; 0 when the fetch failed.
    pub turns: usize,
}

/// cross-thread inbox for transport results; tasks send, main thread drains.
#[derive(Resource, Clone)]
struct TransportInbox {
    tx: Sender<TransportMsg>,
    rx: Receiver<TransportMsg>,
}

impl Default for TransportInbox {
    fn default() -> Self {
        let (tx, rx) = flume::bounded(256);
        Self { tx, rx }
    }
}

#[derive(Debug)]
enum TransportMsg {
    History { entity: Entity, result: Result<Vec<HistoryTurn>, TransportError> },
    Reply { entity: Entity, result: Result<SendReply, TransportError> },
}

/// bevy plugin: wires systems, events, resources.
/// requires a `ChatTransports` resource.
/// on native, also inserts a tiny tokio runtime resource by default.
pub struct ChatWidgetPlugin;

impl Plugin for ChatWidgetPlugin {
    fn build(&self, app: &mut App) {
        info!(target: "bevy_chat_widget", "ChatWidgetPlugin: build()");
        app.init_resource::<TransportInbox>()
            .add_event::<ChatReplyEvt>()
            .add_event::<HistoryLoadedEvt>()
            .configure_sets(Update, ChatWidgetSet::Drain)
            .add_systems(Update, drain_transport_inbox.in_set(ChatWidgetSet::Drain))
            .add_systems(
                Update,
                (
                    ui::handle_buttons,
                    ui::handle_outside_click,
                    ui::handle_text_input,
                    spawn_transport_requests,
                )
                    .chain()
                    .before(ChatWidgetSet::Drain),
            )
            .add_systems(
                Update,
                (
                    ui::sync_log_nodes,
                    ui::apply_panel_layout,
                    ui::refresh_labels,
                    ui::refresh_send_button,
                )
                    .after(ChatWidgetSet::Drain),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Update, dom::mirror_to_dom.after(ChatWidgetSet::Drain));

        #[cfg(not(target_arch = "wasm32"))]
        if app.world().get_resource::<TokioRt>().is_none() {
            app.insert_resource(TokioRt::default());
        }
    }
}

/// runs `run` on the tokio runtime and delivers its message. a task that
/// panics still delivers: `on_join_error` builds its `Join` failure.
#[cfg(not(target_arch = "wasm32"))]
fn spawn_detached(
    rt: &TokioRt,
    tx: Sender<TransportMsg>,
    run: impl Future<Output = TransportMsg> + Send + 'static,
    on_join_error: impl FnOnce(TransportError) -> TransportMsg + Send + 'static,
) {
    let rt = rt.0.clone();
    // hand off to tokio so bevy pools stay free
    AsyncComputeTaskPool::get()
        .spawn(async move {
            let msg = match rt.spawn(run).await {
                Ok(msg) => msg,
                Err(e) => {
                    error!(target: "bevy_chat_widget", "transport task did not finish: {}", e);
                    on_join_error(TransportError::Join(e.to_string()))
                }
            };
            push_inbox(&tx, msg).await;
        })
        .detach();
}

/// panics abort on wasm, so there is no join failure to report.
#[cfg(target_arch = "wasm32")]
fn spawn_detached(
    tx: Sender<TransportMsg>,
    run: impl Future<Output = TransportMsg> + 'static,
    _on_join_error: impl FnOnce(TransportError) -> TransportMsg + 'static,
) {
    AsyncComputeTaskPool::get()
        .spawn(async move {
            let msg = run.await;
            push_inbox(&tx, msg).await;
        })
        .detach();
}

/// waits while the inbox is full; fails only once the app dropped it.
async fn push_inbox(tx: &Sender<TransportMsg>, msg: TransportMsg) {
    if tx.send_async(msg).await.is_err() {
        debug!(target: "bevy_chat_widget", "transport inbox closed; result dropped");
    }
}

/// spawns async tasks for pending history and send requests.
fn spawn_transport_requests(
    mut commands: Commands,
    transports: Option<Res<ChatTransports>>,
    inbox: Res<TransportInbox>,
    q_history: Query<(Entity, &ChatWidget), With<HistoryRequest>>,
    q_send: Query<(Entity, &ChatWidget, &SendRequest)>,
    #[cfg(not(target_arch = "wasm32"))] rt: Res<TokioRt>,
) {
    let Some(transports) = transports else {
        if !q_history.is_empty() || !q_send.is_empty() {
            warn!(target: "bevy_chat_widget", "no ChatTransports resource; requests are waiting");
        }
        return;
    };

    for (e, widget) in &q_history {
        commands.entity(e).remove::<HistoryRequest>();
        let transport = transports.get(widget.key.as_ref());
        debug!(target: "bevy_chat_widget", "history fetch: entity={:?}", e);

        let run = async move {
            let result = transport.fetch_history().await;
            TransportMsg::History { entity: e, result }
        };
        let on_join_error = move |err: TransportError| TransportMsg::History { entity: e, result: Err(err) };
        #[cfg(not(target_arch = "wasm32"))]
        spawn_detached(&rt, inbox.tx.clone(), run, on_join_error);
        #[cfg(target_arch = "wasm32")]
        spawn_detached(inbox.tx.clone(), run, on_join_error);
    }

    for (e, widget, req) in &q_send {
        commands.entity(e).remove::<SendRequest>();
        let transport = transports.get(widget.key.as_ref());
        let text = req.text.clone();
        debug!(target: "bevy_chat_widget", "send: entity={:?} len={}", e, text.len());

        let run = async move {
            let result = transport.send_message(&text).await;
            TransportMsg::Reply { entity: e, result }
        };
        let on_join_error = move |err: TransportError| TransportMsg::Reply { entity: e, result: Err(err) };
        #[cfg(not(target_arch = "wasm32"))]
        spawn_detached(&rt, inbox.tx.clone(), run, on_join_error);
        #[cfg(target_arch = "wasm32")]
        spawn_detached(inbox.tx.clone(), run, on_join_error);
    }
}

/// drains the inbox into widgets and emits events.
fn drain_transport_inbox(
    inbox: Res<TransportInbox>,
    mut q: Query<&mut ChatWidget>,
    mut ev_reply: EventWriter<ChatReplyEvt>,
    mut ev_history: EventWriter<HistoryLoadedEvt>,
) {
    const MAX_PER_FRAME: usize = 64;
    for _ in 0..MAX_PER_FRAME {
        let msg = match inbox.rx.try_recv() {
            Ok(m) => m,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        };
        match msg {
            TransportMsg::History { entity, result } => {
                let Ok(mut widget) = q.get_mut(entity) else {
                    debug!(target: "bevy_chat_widget", "history for despawned widget {:?}", entity);
                    continue;
                };
                let turns = widget.apply_history(result);
                ev_history.write(HistoryLoadedEvt { entity, turns });
            }
            TransportMsg::Reply { entity, result } => {
                let Ok(mut widget) = q.get_mut(entity) else {
                    debug!(target: "bevy_chat_widget", "reply for despawned widget {:?}", entity);
                    continue;
                };
                let outcome = widget.finish_submit(result);
                ev_reply.write(ChatReplyEvt { entity, outcome });
            }
        }
    }
}
