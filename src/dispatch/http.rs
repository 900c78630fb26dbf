use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{CommandSink, SinkReply, TransportError};
use crate::action::Action;

const CONNECT_PATH: &str = "/api/connect";

#[derive(Debug, Default, Deserialize)]
struct ReplyBody {
    #[serde(default)]
    message: Option<String>,
}

/// Delivers commands as JSON POSTs to the remote executor's HTTP API.
pub struct HttpSink {
    client: Client,
    base_url: String,
}

impl HttpSink {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .no_proxy()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| TransportError::Setup(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str, body: &Value) -> Result<SinkReply, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|err| TransportError::Unreachable(format!("POST {url}: {err}")))?;
        let status = resp.status().as_u16();
        let bytes = resp
            .bytes()
            .map_err(|err| TransportError::Unreachable(format!("POST {url} body: {err}")))?;
        let body = serde_json::from_slice::<ReplyBody>(&bytes).unwrap_or_default();
        Ok(SinkReply {
            status,
            message: body.message,
        })
    }
}

impl CommandSink for HttpSink {
    fn connect(&mut self) -> Result<SinkReply, TransportError> {
        self.post(CONNECT_PATH, &json!({}))
    }

    fn deliver(&mut self, action: &Action) -> Result<SinkReply, TransportError> {
        self.post(action.endpoint().path(), &request_body(action))
    }
}

/// JSON body for `action` in the shape its endpoint expects.
pub(super) fn request_body(action: &Action) -> Value {
    match action {
        Action::Hotkey { keys } => json!({ "keys": keys }),
        Action::KeyAction { key } => json!({ "key": key }),
        Action::AirMouse { active } => json!({ "active": active }),
        Action::Orientation { alpha, beta } => json!({
            "active": true,
            "orientation": { "alpha": alpha, "beta": beta },
        }),
        // Touchpad actions carry their own `action` tag.
        touchpad => serde_json::to_value(touchpad).unwrap_or(Value::Null),
    }
}
