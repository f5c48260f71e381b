//! WebSocket event transport.
//!
//! Connects to the gateway's `/ws` endpoint, subscribes to the
//! `program_events` topic for one program and decodes each text frame as a
//! [`TokenEvent`]. Frames that do not decode (acks, other topics, garbage)
//! are logged and skipped.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use vft_types::{ProgramId, TokenEvent};

use crate::config::ClientConfig;
use crate::error::ChannelError;
use crate::events::{EventHandler, EventTransport, Subscription};

pub const EVENTS_TOPIC: &str = "program_events";

/// [`EventTransport`] over a gateway WebSocket. Each subscription owns its
/// own connection and reader task.
#[derive(Clone, Debug)]
pub struct WsEventTransport {
    url: String,
}

impl WsEventTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.ws_url.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventTransport for WsEventTransport {
    async fn subscribe(
        &self,
        program_id: ProgramId,
        handler: EventHandler,
    ) -> Result<Subscription, ChannelError> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChannelError::Unavailable(format!("connect to {} failed: {e}", self.url)))?;
        let (mut sink, mut stream) = ws_stream.split();

        sink.send(Message::Text(subscribe_message(&program_id)))
            .await
            .map_err(|e| ChannelError::Unavailable(format!("subscribe failed: {e}")))?;
        info!(url = %self.url, %program_id, "event stream connected");

        let reader = tokio::spawn(async move {
            // Keep the write half alive so the server does not see a half-close.
            let _sink = sink;
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => match decode_frame(&text) {
                        Some(event) => handler(event),
                        None => debug!(frame = %text, "skipping non-event frame"),
                    },
                    Ok(Message::Close(_)) => {
                        debug!("event stream closed by remote");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "event stream read error");
                        break;
                    }
                }
            }
        });

        Ok(Subscription::new(move || reader.abort()))
    }
}

fn subscribe_message(program_id: &ProgramId) -> String {
    json!({
        "action": "subscribe",
        "topic": EVENTS_TOPIC,
        "program_id": program_id.to_hex(),
    })
    .to_string()
}

fn decode_frame(text: &str) -> Option<TokenEvent> {
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!(error = %e, "frame is not a token event");
            None
        }
    }
}
