use serde::{Deserialize, Serialize};

/// A client frame: `{"op": "subscribe" | "unsubscribe" | "ping", "topic"?}`
/// (§6 "WebSocket commands").
#[derive(Clone, Debug, Deserialize)]
pub struct ClientMessage {
    pub op: String,
    #[serde(default)]
    pub topic: Option<String>,
}

/// A server frame. `topic`/`data` accompany a broadcast; `code`/`message`
/// accompany an error; neither pair accompanies a bare `subscribed`,
/// `unsubscribed`, or `pong` acknowledgement (§6).
#[derive(Clone, Debug, Serialize)]
pub struct ServerMessage {
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServerMessage {
    pub fn subscribed(topic: String) -> Self {
        Self {
            event: "subscribed",
            topic: Some(topic),
            data: None,
            code: None,
            message: None,
        }
    }

    pub fn unsubscribed(topic: String) -> Self {
        Self {
            event: "unsubscribed",
            topic: Some(topic),
            data: None,
            code: None,
            message: None,
        }
    }

    pub fn data(topic: String, data: serde_json::Value) -> Self {
        Self {
            event: "data",
            topic: Some(topic),
            data: Some(data),
            code: None,
            message: None,
        }
    }

    pub fn ping() -> Self {
        Self {
            event: "ping",
            topic: None,
            data: None,
            code: None,
            message: None,
        }
    }

    pub fn pong() -> Self {
        Self {
            event: "pong",
            topic: None,
            data: None,
            code: None,
            message: None,
        }
    }

    /// Sent once before a connection is dropped for a refreshed/expired
    /// auth token, so the client knows to reconnect with a new one.
    pub fn refresh_required() -> Self {
        Self {
            event: "refresh_required",
            topic: None,
            data: None,
            code: None,
            message: None,
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            event: "error",
            topic: None,
            data: None,
            code: Some(code),
            message: Some(message.into()),
        }
    }
}
