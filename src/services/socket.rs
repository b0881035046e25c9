//! WebSocket transport for match notifications.
//!
//! Connects to `{url}?user={identity}` and turns [`ChannelFrame`] text
//! frames into [`MatchEvent`]s. A close frame or socket error ends the
//! stream; reconnecting is the channel's job, not the transport's.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use validator::Validate;

use crate::models::{ChannelFrame, MatchEvent};
use crate::services::{EventStream, EventTransport, TransportError};

/// Close code reported when the server closes without a close frame payload
const NO_STATUS_CODE: u16 = 1005;

/// Push transport backed by a persistent WebSocket
#[derive(Debug, Clone)]
pub struct SocketTransport {
    url: String,
    connect_timeout: Duration,
}

impl SocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Subscription URL for `identity`
    pub fn endpoint(&self, identity: &str) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}user={}", self.url, separator, urlencoding::encode(identity))
    }
}

#[async_trait]
impl EventTransport for SocketTransport {
    async fn connect(&self, identity: &str) -> Result<EventStream, TransportError> {
        let endpoint = self.endpoint(identity);

        tracing::debug!("Connecting match socket: {}", endpoint);

        let (socket, _response) =
            tokio::time::timeout(self.connect_timeout, tokio_tungstenite::connect_async(endpoint))
                .await
                .map_err(|_| TransportError::Timeout(self.connect_timeout))?
                .map_err(|e| TransportError::Connect(e.to_string()))?;

        let stream = socket
            .filter_map(|message| async move {
                match message {
                    Ok(Message::Text(text)) => decode_frame(&text).map(Ok),
                    Ok(Message::Binary(bytes)) => std::str::from_utf8(&bytes)
                        .ok()
                        .and_then(decode_frame)
                        .map(Ok),
                    Ok(Message::Close(frame)) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.into_owned()))
                            .unwrap_or((NO_STATUS_CODE, String::new()));
                        Some(Err(TransportError::Closed { code, reason }))
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(TransportError::Protocol(e.to_string()))),
                }
            })
            .boxed();

        Ok(stream)
    }
}

/// Decode one text frame, skipping anything that is not a valid match.
pub fn decode_frame(text: &str) -> Option<MatchEvent> {
    match serde_json::from_str::<ChannelFrame>(text) {
        Ok(ChannelFrame::Match { profile }) => {
            if let Err(e) = profile.validate() {
                tracing::warn!("Ignoring match with invalid profile: {}", e);
                return None;
            }
            Some(MatchEvent::new(profile))
        }
        Ok(ChannelFrame::Ping) => None,
        Ok(ChannelFrame::Error { code, reason }) => {
            tracing::warn!("Match socket reported error {}: {}", code, reason);
            None
        }
        Err(e) => {
            tracing::warn!("Ignoring undecodable socket frame: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_identity() {
        let transport = SocketTransport::new("ws://localhost:3333/ws");
        assert_eq!(transport.endpoint("a b"), "ws://localhost:3333/ws?user=a%20b");

        let transport = SocketTransport::new("ws://localhost:3333/ws?v=2");
        assert_eq!(transport.endpoint("u1"), "ws://localhost:3333/ws?v=2&user=u1");
    }

    #[test]
    fn test_decode_match_frame() {
        let event = decode_frame(r#"{"type":"match","profile":{"_id":"d","name":"Dee"}}"#).unwrap();
        assert_eq!(event.profile_id(), "d");
    }

    #[test]
    fn test_decode_skips_non_matches() {
        assert!(decode_frame(r#"{"type":"ping"}"#).is_none());
        assert!(decode_frame(r#"{"type":"error","code":4001,"reason":"nope"}"#).is_none());
        assert!(decode_frame("not json").is_none());
        assert!(decode_frame(r#"{"type":"match","profile":{"_id":"","name":"x"}}"#).is_none());
    }
}
