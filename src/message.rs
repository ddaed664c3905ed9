use serde::{Deserialize, Serialize};

/// who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// one turn in the conversation.
///
/// user text is literal plain text; assistant text is untrusted and only
/// ever displayed through the formatting transform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::User }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::Assistant }
    }
}

/// display-only meta line under a message bubble.
/// no timestamp is kept, so the time part is always "Just now".
pub fn meta_label(sender: Sender, assistant_name: &str) -> String {
    match sender {
        Sender::User => "You • Just now".to_string(),
        Sender::Assistant => format!("{assistant_name} • Just now"),
    }
}
