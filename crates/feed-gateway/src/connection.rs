use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket};
use futures_util::StreamExt;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;

/// Longest excerpt of a rejected frame written to the log.
const LOG_EXCERPT_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("binary frame is not valid UTF-8")]
    NotUtf8,
}

/// Decode one frame into the JSON object it carries.
pub fn decode_frame(text: &str) -> Result<Value, FrameError> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Err(FrameError::NotAnObject("null")),
        Value::Bool(_) => Err(FrameError::NotAnObject("a boolean")),
        Value::Number(_) => Err(FrameError::NotAnObject("a number")),
        Value::String(_) => Err(FrameError::NotAnObject("a string")),
        Value::Array(_) => Err(FrameError::NotAnObject("an array")),
    }
}

/// Read frames until the client goes away. Bad frames never close the socket.
pub async fn handle_connection(mut socket: WebSocket, dispatcher: Dispatcher, peer: SocketAddr) {
    let open = dispatcher.connection_opened();
    info!("Feed client {} connected ({} open)", peer, open);

    while let Some(result) = socket.next().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Feed client {} socket error: {}", peer, e);
                break;
            }
        };

        let decoded = match msg {
            Message::Text(text) => {
                decode_frame(text.as_str()).map_err(|e| (e, excerpt(text.as_str())))
            }
            Message::Binary(data) => match std::str::from_utf8(&data) {
                Ok(text) => decode_frame(text).map_err(|e| (e, excerpt(text))),
                Err(_) => Err((FrameError::NotUtf8, format!("<{} bytes>", data.len()))),
            },
            Message::Close(_) => break,
            _ => continue,
        };

        match decoded {
            Ok(payload) => {
                dispatcher.forward(payload);
            }
            Err((e, raw)) => {
                warn!("Feed client {} sent a bad frame: {} -- raw: {}", peer, e, raw);
            }
        }
    }

    let open = dispatcher.connection_closed();
    info!("Feed client {} disconnected ({} open)", peer, open);
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(LOG_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_are_accepted_verbatim() {
        let value = decode_frame(r#"{"id":"1","extra":{"nested":true}}"#).unwrap();
        assert_eq!(value["id"], "1");
        assert_eq!(value["extra"]["nested"], true);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            decode_frame("{not json"),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(matches!(
            decode_frame("[1, 2]"),
            Err(FrameError::NotAnObject("an array"))
        ));
        assert!(matches!(
            decode_frame("42"),
            Err(FrameError::NotAnObject("a number"))
        ));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let long = "é".repeat(LOG_EXCERPT_LEN + 5);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), LOG_EXCERPT_LEN + 3);
        assert_eq!(excerpt("short"), "short");
    }
}
