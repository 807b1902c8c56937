use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frame received from a streaming client
#[derive(Debug, Clone)]
pub enum ClientMessage {
    /// JSON control object, e.g. `{"action":"start"}`
    Control(String),
    /// Raw little-endian f32 PCM at 16kHz
    Audio(Vec<u8>),
}

/// Parsed control object
#[derive(Debug, Deserialize)]
pub struct ControlMessage {
    #[serde(default)]
    pub action: Option<String>,
}

/// Control actions the controller acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
}

impl ControlMessage {
    pub fn action(&self) -> Option<ControlAction> {
        match self.action.as_deref() {
            Some("start") => Some(ControlAction::Start),
            Some("stop") => Some(ControlAction::Stop),
            _ => None,
        }
    }
}

/// Event pushed to a streaming client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// `{"type":"status","status":"ready","session_id":...}`
    Status { status: String, session_id: Uuid },
    /// `{"type":"partial","text":...,"chunk":...,"status":"recognizing"}`
    Partial {
        text: String,
        chunk: String,
        status: String,
    },
    /// `{"type":"final","text":...,"status":"completed"}`
    Final { text: String, status: String },
    /// `{"type":"error","message":...}`
    Error { message: String },
}

impl ServerEvent {
    pub fn ready(session_id: Uuid) -> Self {
        ServerEvent::Status {
            status: "ready".to_string(),
            session_id,
        }
    }

    pub fn partial(text: String, chunk: String) -> Self {
        ServerEvent::Partial {
            text,
            chunk,
            status: "recognizing".to_string(),
        }
    }

    pub fn final_result(text: String) -> Self {
        ServerEvent::Final {
            text,
            status: "completed".to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}
