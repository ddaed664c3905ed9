//! append-only conversation log.

use crate::format::Markup;
use crate::message::{Message, Sender};

/// display body of a log entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    /// literal text, never interpreted as markup.
    Plain(String),
    /// assistant text after the formatting transform.
    Markup(Markup),
}

impl Body {
    fn for_message(message: &Message) -> Self {
        match message.sender {
            Sender::User => Body::Plain(message.text.clone()),
            Sender::Assistant => Body::Markup(Markup::parse(&message.text)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub message: Message,
    pub body: Body,
}

/// ordered, append-only list of rendered messages.
///
/// entries are never mutated, removed, deduplicated or reordered.
#[derive(Clone, Debug, Default)]
pub struct ConversationLog {
    entries: Vec<LogEntry>,
    scroll_pending: bool,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// append `message` as the newest entry and request scroll-to-latest.
    pub fn render(&mut self, message: Message) -> &LogEntry {
        let body = Body::for_message(&message);
        self.entries.push(LogEntry { message, body });
        self.scroll_to_latest();
        &self.entries[self.entries.len() - 1]
    }

    /// ask the view to move to the maximum scroll offset.
    pub fn scroll_to_latest(&mut self) {
        self.scroll_pending = true;
    }

    /// consume a pending scroll request.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// entries appended after the first `seen`.
    pub fn since(&self, seen: usize) -> &[LogEntry] {
        self.entries.get(seen..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
