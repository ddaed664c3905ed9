use serde::{Deserialize, Serialize};

/// widget and transport settings. every field has a default, so partial
/// json documents are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// origin the endpoint paths are joined onto. empty on wasm, where
    /// requests are relative to the page.
    pub base_url: String,
    pub history_path: String,
    pub send_path: String,
    /// cookie holding the anti-forgery token.
    pub csrf_cookie: String,
    /// header the token is sent in.
    pub csrf_header: String,
    /// native only: raw `Cookie` header (`a=1; csrftoken=...`).
    pub cookie: String,
    pub title: String,
    pub assistant_name: String,
    /// shown when the server answers `success: false`.
    pub processing_error_reply: String,
    /// shown when the request itself fails.
    pub connection_error_reply: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            history_path: "/chat/send/".to_string(),
            send_path: "/chat/send/".to_string(),
            csrf_cookie: "csrftoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            cookie: String::new(),
            title: "TSC Assistant".to_string(),
            assistant_name: "TSC Assistant".to_string(),
            processing_error_reply: "Sorry, there was an error processing your request.".to_string(),
            connection_error_reply: "Sorry, there was an error connecting to the server.".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid widget config: {0}")]
    Json(#[from] serde_json::Error),
}

impl WidgetConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// defaults overridden by `CHAT_WIDGET_*` env vars.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|k| std::env::var(k).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var("CHAT_WIDGET_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = var("CHAT_WIDGET_HISTORY_PATH") {
            self.history_path = v;
        }
        if let Some(v) = var("CHAT_WIDGET_SEND_PATH") {
            self.send_path = v;
        }
        if let Some(v) = var("CHAT_WIDGET_COOKIE") {
            self.cookie = v;
        }
        self
    }

    pub fn history_url(&self) -> String {
        join_url(&self.base_url, &self.history_path)
    }

    pub fn send_url(&self) -> String {
        join_url(&self.base_url, &self.send_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    if b.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", b, path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_target_the_chat_endpoint() {
        let c = WidgetConfig::default();
        assert_eq!(c.history_url(), "/chat/send/");
        assert_eq!(c.send_url(), "/chat/send/");
        assert_eq!(c.csrf_header, "X-CSRFToken");
    }

    #[test]
    fn base_url_join_handles_slashes() {
        assert_eq!(join_url("http://h:8000/", "/chat/send/"), "http://h:8000/chat/send/");
        assert_eq!(join_url("http://h:8000", "chat/send/"), "http://h:8000/chat/send/");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = WidgetConfig::from_json(r#"{ "base_url": "http://localhost:8000", "title": "help" }"#)
            .unwrap();
        assert_eq!(c.title, "help");
        assert_eq!(c.send_url(), "http://localhost:8000/chat/send/");
        assert_eq!(c.assistant_name, "TSC Assistant");
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(matches!(WidgetConfig::from_json("{"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn env_overrides() {
        let c = WidgetConfig::default().with_overrides(|k| match k {
            "CHAT_WIDGET_BASE_URL" => Some("http://srv".to_string()),
            "CHAT_WIDGET_COOKIE" => Some("csrftoken=abc".to_string()),
            _ => None,
        });
        assert_eq!(c.base_url, "http://srv");
        assert_eq!(c.cookie, "csrftoken=abc");
        assert_eq!(c.send_path, "/chat/send/");
    }
}
