//! transport collaborator: history fetch and message send.
//!
//! - `ChatTransport` is the seam the controller awaits on.
//! - `HttpTransport` talks to the chat endpoint: `ureq` on native (run in
//!   `spawn_blocking`, so it needs a tokio context), `gloo-net` on wasm.
//! - status codes never fail a call by themselves; the json body decides,
//!   so `{success: false}` with a 4xx/5xx is an application failure.

use crate::config::WidgetConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// network / http layer.
    #[error("request failed: {0}")]
    Request(String),
    /// body was not the expected json.
    #[error("unexpected response body: {0}")]
    Decode(String),
    /// request body could not be serialized.
    #[error("could not encode request: {0}")]
    Encode(String),
    /// worker task panicked or was cancelled before answering.
    #[error("transport worker failed: {0}")]
    Join(String),
}

/// one user/assistant exchange from the server's history.
/// a missing or null side reads as an empty string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ai_message: String,
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    chats: Option<Vec<HistoryTurn>>,
}

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    ai_message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// application-level answer to a send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendReply {
    Success { ai_message: String },
    Failure { error: String },
}

impl From<SendResponse> for SendReply {
    fn from(r: SendResponse) -> Self {
        match (r.success, r.ai_message) {
            (true, Some(ai_message)) => SendReply::Success { ai_message },
            (true, None) => SendReply::Failure { error: "response had no ai_message".to_string() },
            (false, _) => SendReply::Failure {
                error: r.error.unwrap_or_else(|| "unknown error".to_string()),
            },
        }
    }
}

/// `{ "chats": [...] }`; a missing or null `chats` is an empty history.
pub fn parse_history(text: &str) -> Result<Vec<HistoryTurn>, TransportError> {
    let r: HistoryResponse =
        serde_json::from_str(text).map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(r.chats.unwrap_or_default())
}

pub fn parse_send_reply(text: &str) -> Result<SendReply, TransportError> {
    let r: SendResponse =
        serde_json::from_str(text).map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(r.into())
}

fn send_body(text: &str) -> Result<String, TransportError> {
    serde_json::to_string(&SendBody { message: text }).map_err(|e| TransportError::Encode(e.to_string()))
}

/// value of cookie `name` in a `document.cookie` style string, percent-decoded.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|c| c.strip_prefix(prefix.as_str()))
        .map(|v| {
            urlencoding::decode(v)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| v.to_string())
        })
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait ChatTransport: Send + Sync {
    async fn fetch_history(&self) -> Result<Vec<HistoryTurn>, TransportError>;
    async fn send_message(&self, text: &str) -> Result<SendReply, TransportError>;
}

/// json-over-http transport for the chat endpoint.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    config: WidgetConfig,
}

impl HttpTransport {
    pub fn new(config: WidgetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn cookie_jar(&self) -> Option<String> {
        (!self.config.cookie.is_empty()).then(|| self.config.cookie.clone())
    }

    #[cfg(target_arch = "wasm32")]
    fn cookie_jar(&self) -> Option<String> {
        use wasm_bindgen::JsCast;
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
            .and_then(|d| d.cookie().ok())
    }

    /// headers sent with both calls. the token header is omitted when the
    /// cookie is absent.
    fn headers(&self) -> Vec<(String, String)> {
        let mut h = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
        ];
        let jar = self.cookie_jar();
        if let Some(token) = jar.as_deref().and_then(|c| cookie_value(c, &self.config.csrf_cookie)) {
            h.push((self.config.csrf_header.clone(), token));
        }
        // the browser attaches cookies itself; native has to forward them
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(c) = jar {
            h.push(("Cookie".to_string(), c));
        }
        h
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

#[cfg(not(target_arch = "wasm32"))]
async fn blocking<T, F>(f: F) -> Result<T, TransportError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, TransportError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TransportError::Join(e.to_string()))?
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn fetch_history(&self) -> Result<Vec<HistoryTurn>, TransportError> {
        let url = self.config.history_url();
        let headers = self.headers();
        let text = blocking(move || {
            let mut req = agent().get(&url);
            for (k, v) in &headers {
                req = req.header(k.as_str(), v.as_str());
            }
            let res = req.call().map_err(|e| TransportError::Request(e.to_string()))?;
            res.into_body()
                .read_to_string()
                .map_err(|e| TransportError::Request(e.to_string()))
        })
        .await?;
        parse_history(&text)
    }

    async fn send_message(&self, text: &str) -> Result<SendReply, TransportError> {
        let url = self.config.send_url();
        let headers = self.headers();
        let body = send_body(text)?;
        let text = blocking(move || {
            let mut req = agent().post(&url);
            for (k, v) in &headers {
                req = req.header(k.as_str(), v.as_str());
            }
            let res = req
                .send(body.as_str())
                .map_err(|e| TransportError::Request(e.to_string()))?;
            res.into_body()
                .read_to_string()
                .map_err(|e| TransportError::Request(e.to_string()))
        })
        .await?;
        parse_send_reply(&text)
    }
}

#[cfg(target_arch = "wasm32")]
fn request_error(e: gloo_net::Error) -> TransportError {
    TransportError::Request(e.to_string())
}

#[cfg(target_arch = "wasm32")]
#[async_trait::async_trait(?Send)]
impl ChatTransport for HttpTransport {
    async fn fetch_history(&self) -> Result<Vec<HistoryTurn>, TransportError> {
        use gloo_net::http::Request;

        let mut req = Request::get(&self.config.history_url());
        for (k, v) in self.headers() {
            req = req.header(&k, &v);
        }
        let resp = req.send().await.map_err(request_error)?;
        let text = resp.text().await.map_err(request_error)?;
        parse_history(&text)
    }

    async fn send_message(&self, text: &str) -> Result<SendReply, TransportError> {
        use gloo_net::http::Request;

        let mut req = Request::post(&self.config.send_url());
        for (k, v) in self.headers() {
            req = req.header(&k, &v);
        }
        let resp = req
            .body(send_body(text)?)
            .map_err(request_error)?
            .send()
            .await
            .map_err(request_error)?;
        let text = resp.text().await.map_err(request_error)?;
        parse_send_reply(&text)
    }
}
