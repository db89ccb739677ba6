use crate::logging;
use crate::OverlayError;
use futures_util::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Events fanned out to client subscribers.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A JSON message carrying an `action` discriminator
    Message(Value),
    /// The connection failed; a reconnect is scheduled
    Error,
    /// A reconnection survived the confirm delay
    Reconnect,
}

/// Incremental decoder for a Server-Sent-Events byte stream.
///
/// Per the SSE grammar: `:`-prefixed comment lines are ignored, `data:`
/// field values accumulate, a blank line terminates the event and joins
/// multiple data lines with `\n`. Other field names are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line_buf: String,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes; returns every complete event payload it closed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.line_buf.push_str(&String::from_utf8_lossy(chunk));
        let mut payloads = Vec::new();

        while let Some(newline) = self.line_buf.find('\n') {
            let line: String = self.line_buf.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if !self.data.is_empty() {
                    payloads.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
            // comment lines and event:/id:/retry: fields carry nothing we consume
        }

        payloads
    }
}

/// Reconnecting consumer of the build tool's hot-update event stream.
///
/// A single driver task owns the connection, so an error arriving while a
/// reconnect is pending can never produce two simultaneous connections;
/// the reconnect delay is a fixed constant, not a backoff.
pub struct EventClient {
    sender: broadcast::Sender<ClientEvent>,
    driver: JoinHandle<()>,
}

impl EventClient {
    /// Open the stream at `url` and start the reconnect loop.
    pub fn connect(url: String, reconnect_delay: Duration, confirm_delay: Duration) -> Self {
        let (sender, _) = broadcast::channel(64);
        let task_sender = sender.clone();
        let driver = tokio::spawn(async move {
            run_client(url, reconnect_delay, confirm_delay, task_sender).await;
        });
        Self { sender, driver }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    pub fn close(&self) {
        self.driver.abort();
    }
}

impl Drop for EventClient {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

async fn run_client(
    url: String,
    reconnect_delay: Duration,
    confirm_delay: Duration,
    sender: broadcast::Sender<ClientEvent>,
) {
    let client = reqwest::Client::new();
    let mut is_reconnect = false;
    loop {
        let outcome = stream_events(&client, &url, confirm_delay, is_reconnect, &sender).await;
        let reason = match outcome {
            Ok(()) => "stream closed by server".to_string(),
            Err(e) => e.to_string(),
        };
        logging::log_stream_error(&reason, reconnect_delay.as_millis() as u64);
        let _ = sender.send(ClientEvent::Error);
        is_reconnect = true;
        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Run one connection until it fails or the server closes it.
///
/// On a reconnection the confirm timer is armed alongside the stream: if it
/// fires before any error, the reconnect is declared successful; an earlier
/// error returns first and the timer dies unfired.
async fn stream_events(
    client: &reqwest::Client,
    url: &str,
    confirm_delay: Duration,
    is_reconnect: bool,
    sender: &broadcast::Sender<ClientEvent>,
) -> Result<(), OverlayError> {
    logging::log_stream_connecting(url);
    let response = client
        .get(url)
        .header("Accept", "text/event-stream")
        .send()
        .await
        .map_err(|e| OverlayError::Transport(e.to_string()))?
        .error_for_status()
        .map_err(|e| OverlayError::Transport(e.to_string()))?;

    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    if is_reconnect {
        let mut timer = Box::pin(tokio::time::sleep(confirm_delay));
        loop {
            tokio::select! {
                _ = &mut timer => {
                    logging::log_stream_reconnected();
                    let _ = sender.send(ClientEvent::Reconnect);
                    break;
                }
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        for payload in decoder.feed(&bytes) {
                            dispatch_message(&payload, sender);
                        }
                    }
                    Some(Err(e)) => return Err(OverlayError::Transport(e.to_string())),
                    None => return Ok(()),
                },
            }
        }
    }

    loop {
        match stream.next().await {
            Some(Ok(bytes)) => {
                for payload in decoder.feed(&bytes) {
                    dispatch_message(&payload, sender);
                }
            }
            Some(Err(e)) => return Err(OverlayError::Transport(e.to_string())),
            None => return Ok(()),
        }
    }
}

/// Defensive JSON parse and fan-out of one event payload.
///
/// Payloads without an `action` discriminator (heartbeats and the like) are
/// ignored; parse failures are logged and swallowed.
fn dispatch_message(payload: &str, sender: &broadcast::Sender<ClientEvent>) {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => {
            if value.get("action").is_some() {
                let _ = sender.send(ClientEvent::Message(value));
            }
        }
        Err(e) => logging::log_message_parse_failed(&e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_single_event() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"action\":\"building\"}\n\n");
        assert_eq!(payloads, vec!["{\"action\":\"building\"}".to_string()]);
    }

    #[test]
    fn joins_multiple_data_lines() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: first\ndata: second\n\n");
        assert_eq!(payloads, vec!["first\nsecond".to_string()]);
    }

    #[test]
    fn handles_chunks_split_mid_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: par").is_empty());
        assert!(decoder.feed(b"tial\n").is_empty());
        let payloads = decoder.feed(b"\n");
        assert_eq!(payloads, vec!["partial".to_string()]);
    }

    #[test]
    fn ignores_comments_and_foreign_fields() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b":heartbeat\nevent: message\nid: 7\ndata: x\n\n");
        assert_eq!(payloads, vec!["x".to_string()]);
    }

    #[test]
    fn messages_without_an_action_marker_are_ignored() {
        let (sender, mut receiver) = broadcast::channel(8);
        dispatch_message(r#"{"action":"building"}"#, &sender);
        dispatch_message(r#"{"other":"field"}"#, &sender);
        dispatch_message("not json at all", &sender);

        match receiver.try_recv().unwrap() {
            ClientEvent::Message(value) => assert_eq!(value["action"], "building"),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn crlf_lines_decode_the_same() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: x\r\n\r\n");
        assert_eq!(payloads, vec!["x".to_string()]);
    }
}
