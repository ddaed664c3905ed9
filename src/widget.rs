//! session controller: view state, input, and the two transport operations.

use bevy::log::{error, info, warn};
use bevy::prelude::Component;

use crate::config::WidgetConfig;
use crate::log::ConversationLog;
use crate::message::Message;
use crate::panel::PanelState;
use crate::transport::{ChatTransport, HistoryTurn, SendReply, TransportError};

/// how a send ended, as far as the user can see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    Answered,
    /// server answered `success: false`.
    Rejected { error: String },
    /// request never produced a usable answer.
    Failed { error: String },
}

/// one chat widget: log, view state, and input buffer.
///
/// every mutation happens on the ui thread; transport calls are awaited
/// elsewhere and their results fed back through `finish_submit` /
/// `apply_history`.
#[derive(Component, Debug, Default)]
pub struct ChatWidget {
    /// optional key to pick a transport from `ChatTransports::per_key`.
    pub key: Option<String>,
    pub config: WidgetConfig,
    pub log: ConversationLog,
    pub panel: PanelState,
    pub input: String,
    loading: bool,
}

impl ChatWidget {
    pub fn new(config: WidgetConfig) -> Self {
        Self { config, ..Default::default() }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// input and send are accepted only while open and idle.
    pub fn accepts_input(&self) -> bool {
        self.panel.is_open() && !self.loading
    }

    pub fn render(&mut self, message: Message) {
        self.log.render(message);
    }

    /// opening also asks for a scroll; the log can't hold one while hidden.
    pub fn toggle(&mut self) {
        self.panel = self.panel.toggle();
        if self.panel.is_open() {
            self.log.scroll_to_latest();
        }
    }

    pub fn expand(&mut self) {
        self.panel = self.panel.expand();
        self.log.scroll_to_latest();
    }

    pub fn outside_click(&mut self) {
        self.panel = self.panel.outside_click();
    }

    /// first half of a submit: render the user line, clear input, enter loading.
    /// returns the text to send, or `None` when `text` is blank.
    ///
    /// not guarded against re-entry; callers disable their send affordance
    /// while `is_loading()`.
    pub fn begin_submit(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();
        self.log.render(Message::user(text.clone()));
        self.input.clear();
        self.loading = true;
        Some(text)
    }

    /// submit whatever is in the input buffer.
    pub fn begin_submit_input(&mut self) -> Option<String> {
        let input = std::mem::take(&mut self.input);
        let sent = self.begin_submit(&input);
        if sent.is_none() {
            self.input = input;
        }
        sent
    }

    /// second half of a submit: render the answer or a fallback, leave
    /// loading (on every path), scroll to latest.
    pub fn finish_submit(&mut self, result: Result<SendReply, TransportError>) -> ReplyOutcome {
        let outcome = match result {
            Ok(SendReply::Success { ai_message }) => {
                info!(target: "bevy_chat_widget", "reply received: len={}", ai_message.len());
                self.log.render(Message::assistant(ai_message));
                ReplyOutcome::Answered
            }
            Ok(SendReply::Failure { error }) => {
                error!(target: "bevy_chat_widget", "send rejected: {}", error);
                self.log.render(Message::assistant(self.config.processing_error_reply.clone()));
                ReplyOutcome::Rejected { error }
            }
            Err(err) => {
                error!(target: "bevy_chat_widget", "send failed: {}", err);
                self.log.render(Message::assistant(self.config.connection_error_reply.clone()));
                ReplyOutcome::Failed { error: err.to_string() }
            }
        };
        self.loading = false;
        self.log.scroll_to_latest();
        outcome
    }

    /// render fetched history, user then assistant per turn, in server order.
    /// failures are logged and otherwise ignored. returns rendered turns.
    pub fn apply_history(&mut self, result: Result<Vec<HistoryTurn>, TransportError>) -> usize {
        match result {
            Ok(turns) => {
                let n = turns.len();
                for HistoryTurn { user_message, ai_message } in turns {
                    self.log.render(Message::user(user_message));
                    self.log.render(Message::assistant(ai_message));
                }
                info!(target: "bevy_chat_widget", "history loaded: turns={}", n);
                n
            }
            Err(err) => {
                warn!(target: "bevy_chat_widget", "history unavailable: {}", err);
                0
            }
        }
    }

    pub async fn submit(&mut self, text: &str, transport: &dyn ChatTransport) -> Option<ReplyOutcome> {
        let text = self.begin_submit(text)?;
        let result = transport.send_message(&text).await;
        Some(self.finish_submit(result))
    }

    pub async fn load_history(&mut self, transport: &dyn ChatTransport) -> usize {
        let result = transport.fetch_history().await;
        self.apply_history(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Body;
    use crate::message::Sender;
    use crate::transport::scripted::ScriptedTransport;
    use pretty_assertions::assert_eq;

    fn lines(w: &ChatWidget) -> Vec<(Sender, String)> {
        w.log
            .entries()
            .iter()
            .map(|e| (e.message.sender, e.message.text.clone()))
            .collect()
    }

    #[test]
    fn blank_submit_is_a_no_op() {
        let transport = ScriptedTransport::default();
        let mut w = ChatWidget::default();
        for text in ["", "   ", "\n\t "] {
            let out = pollster::block_on(w.submit(text, &transport));
            assert_eq!(out, None);
        }
        assert!(w.log.is_empty());
        assert!(transport.sent().is_empty());
        assert!(!w.is_loading());
    }

    #[test]
    fn successful_submit_renders_both_sides() {
        let transport = ScriptedTransport::default()
            .reply(Ok(SendReply::Success { ai_message: "hello [x](y)".into() }));
        let mut w = ChatWidget::default();
        w.input = "  hi  ".into();

        let out = pollster::block_on(w.submit("  hi  ", &transport));

        assert_eq!(out, Some(ReplyOutcome::Answered));
        assert_eq!(transport.sent(), vec!["hi".to_string()]);
        assert_eq!(
            lines(&w),
            vec![(Sender::User, "hi".into()), (Sender::Assistant, "hello [x](y)".into())]
        );
        assert!(w.input.is_empty());
        assert!(!w.is_loading());
        assert!(w.log.take_scroll_request());
    }

    #[test]
    fn rejected_send_renders_processing_fallback() {
        let transport = ScriptedTransport::default()
            .reply(Ok(SendReply::Failure { error: "x".into() }));
        let mut w = ChatWidget::default();

        let out = pollster::block_on(w.submit("question", &transport));

        assert_eq!(out, Some(ReplyOutcome::Rejected { error: "x".into() }));
        assert_eq!(
            lines(&w),
            vec![
                (Sender::User, "question".into()),
                (Sender::Assistant, "Sorry, there was an error processing your request.".into()),
            ]
        );
        assert!(!w.is_loading());
    }

    #[test]
    fn transport_failure_renders_connection_fallback() {
        let transport = ScriptedTransport::default()
            .reply(Err(TransportError::Request("connection refused".into())));
        let mut w = ChatWidget::default();

        let out = pollster::block_on(w.submit("question", &transport));

        assert!(matches!(out, Some(ReplyOutcome::Failed { .. })));
        assert_eq!(
            w.log.entries()[1].message.text,
            "Sorry, there was an error connecting to the server."
        );
        assert!(!w.is_loading());
    }

    #[test]
    fn loading_spans_the_request() {
        let mut w = ChatWidget::default();
        w.panel = PanelState::OpenNormal;
        assert!(w.accepts_input());

        let text = w.begin_submit("ping").unwrap();
        assert_eq!(text, "ping");
        assert!(w.is_loading());
        assert!(!w.accepts_input());

        w.finish_submit(Ok(SendReply::Success { ai_message: "pong".into() }));
        assert!(!w.is_loading());
        assert!(w.accepts_input());
    }

    #[test]
    fn begin_submit_input_keeps_blank_input() {
        let mut w = ChatWidget::default();
        w.input = "  ".into();
        assert_eq!(w.begin_submit_input(), None);
        assert_eq!(w.input, "  ");

        w.input = "go".into();
        assert_eq!(w.begin_submit_input().as_deref(), Some("go"));
        assert!(w.input.is_empty());
    }

    #[test]
    fn history_renders_user_then_assistant() {
        let transport = ScriptedTransport::default().with_history(vec![HistoryTurn {
            user_message: "hi".into(),
            ai_message: "hello".into(),
        }]);
        let mut w = ChatWidget::default();

        let n = pollster::block_on(w.load_history(&transport));

        assert_eq!(n, 1);
        assert_eq!(
            lines(&w),
            vec![(Sender::User, "hi".into()), (Sender::Assistant, "hello".into())]
        );
        assert!(matches!(w.log.entries()[0].body, Body::Plain(_)));
        assert!(matches!(w.log.entries()[1].body, Body::Markup(_)));
    }

    #[test]
    fn history_failure_is_silent() {
        let transport = ScriptedTransport::default()
            .with_history_error(TransportError::Decode("not json".into()));
        let mut w = ChatWidget::default();

        let n = pollster::block_on(w.load_history(&transport));

        assert_eq!(n, 0);
        assert!(w.log.is_empty());
    }

    #[test]
    fn fallback_texts_are_configurable() {
        let mut w = ChatWidget::new(WidgetConfig {
            connection_error_reply: "offline".into(),
            ..Default::default()
        });
        w.begin_submit("a");
        w.finish_submit(Err(TransportError::Request("down".into())));
        assert_eq!(w.log.entries()[1].message.text, "offline");
    }

    #[test]
    fn stale_reply_still_renders_after_close() {
        let mut w = ChatWidget::default();
        w.toggle();
        w.begin_submit("a");
        w.outside_click();
        assert_eq!(w.panel, PanelState::Closed);
        w.finish_submit(Ok(SendReply::Success { ai_message: "late".into() }));
        assert_eq!(w.log.len(), 2);
    }

    #[test]
    fn opening_scrolls_to_history_loaded_while_closed() {
        let mut w = ChatWidget::default();
        w.apply_history(Ok(vec![HistoryTurn { user_message: "a".into(), ai_message: "b".into() }]));
        assert!(w.log.take_scroll_request());

        w.toggle();
        assert!(w.log.take_scroll_request());

        w.toggle();
        assert!(!w.panel.is_open());
        assert!(!w.log.take_scroll_request());
    }

    #[test]
    fn open_expand_expand_returns_to_normal() {
        let mut w = ChatWidget::default();
        w.toggle();
        w.expand();
        assert_eq!(w.panel, PanelState::OpenExpanded);
        w.expand();
        assert_eq!(w.panel, PanelState::OpenNormal);
    }
}
