//! Server-sent event stream with auto-reconnect.
//!
//! Connects to the bridge's `/eventstream/clip/v2` endpoint and forwards
//! the data payload of every SSE event, undecoded, through a
//! [`tokio::sync::mpsc`] channel. One payload is one update batch (a JSON
//! array of envelopes). Reconnects with exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use lumen_api::event_stream::{EventStreamHandle, ReconnectConfig};
//! use lumen_api::TransportConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let (handle, mut rx) = EventStreamHandle::spawn(
//!     "192.168.1.20",
//!     &app_key,
//!     &TransportConfig::default(),
//!     ReconnectConfig::default(),
//!     cancel.clone(),
//! )?;
//!
//! while let Some(batch) = rx.recv().await {
//!     println!("{} bytes", batch.len());
//! }
//!
//! handle.shutdown();
//! ```

use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::{app_key_headers, normalize_base_url};
use crate::error::Error;
use crate::transport::TransportConfig;

const EVENT_STREAM_PATH: &str = "eventstream/clip/v2";

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for event stream reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── EventStreamHandle ────────────────────────────────────────────────

/// Handle to a running event stream task.
///
/// Call [`shutdown`](Self::shutdown) (or cancel the token passed to
/// [`spawn`](Self::spawn)) to stop the background task. Dropping the
/// receiver also ends it on the next payload.
pub struct EventStreamHandle {
    cancel: CancellationToken,
}

impl EventStreamHandle {
    /// Spawn the reconnecting reader and return the payload receiver.
    ///
    /// Returns immediately; the first connection attempt happens on the
    /// background task.
    pub fn spawn(
        bridge: &str,
        app_key: &SecretString,
        transport: &TransportConfig,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Bytes>), Error> {
        let http = transport.build_stream_client(app_key_headers(app_key)?)?;
        let url = normalize_base_url(bridge)?.join(EVENT_STREAM_PATH)?;
        Ok(Self::spawn_with_client(http, url, reconnect, cancel))
    }

    /// Spawn against an explicit stream URL with a prepared client.
    pub fn spawn_with_client(
        http: reqwest::Client,
        url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            stream_loop(http, url, tx, reconnect, task_cancel).await;
        });

        (Self { cancel }, rx)
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn stream_loop(
    http: reqwest::Client,
    url: Url,
    tx: mpsc::UnboundedSender<Bytes>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        if tx.is_closed() {
            break;
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&http, &url, &tx, &cancel) => {
                match result {
                    // Stream ended cleanly. Reset attempt counter and reconnect.
                    Ok(()) => {
                        tracing::info!("Event stream ended, reconnecting");
                        attempt = 0;

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(reconnect.initial_delay) => {}
                        }
                    }
                    Err(Error::InvalidAppKey) => {
                        tracing::error!("Bridge rejected the application key, event stream stopped");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "Event stream error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "Event stream reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            attempt,
                            "Waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt = attempt.saturating_add(1);
                    }
                }
            }
        }
    }

    tracing::debug!("Event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one SSE response and forward payloads until it ends.
async fn connect_and_read(
    http: &reqwest::Client,
    url: &Url,
    tx: &mpsc::UnboundedSender<Bytes>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "Connecting to event stream");

    let resp = http
        .get(url.clone())
        .header(ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| Error::EventStream(e.to_string()))?;

    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::InvalidAppKey);
    }
    if !status.is_success() {
        return Err(Error::EventStream(format!("HTTP {status}")));
    }

    tracing::info!("Event stream connected");

    let mut body = resp.bytes_stream();
    let mut parser = SseParser::default();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            chunk = body.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        for payload in parser.push(&bytes) {
                            tracing::trace!(len = payload.len(), "Event payload");
                            if tx.send(payload).is_err() {
                                // Receiver gone; nobody is listening anymore.
                                return Ok(());
                            }
                        }
                    }
                    Some(Err(e)) => return Err(Error::EventStream(e.to_string())),
                    None => return Ok(()),
                }
            }
        }
    }
}

// ── SSE framing ──────────────────────────────────────────────────────

/// Incremental `text/event-stream` parser.
///
/// Feed it arbitrary chunks; it yields the data payload of every complete
/// event. `data:` lines of one event are joined with `\n`. Comments
/// (`: hi`) and the `id`, `event` and `retry` fields are ignored.
#[derive(Debug, Default)]
pub struct SseParser {
    line: Vec<u8>,
    data: Vec<u8>,
    has_data: bool,
}

impl SseParser {
    /// Consume a chunk and return every payload it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        let mut out = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let line = std::mem::take(&mut self.line);
                let line = line.strip_suffix(b"\r").unwrap_or(&line);
                if let Some(payload) = self.process_line(line) {
                    out.push(payload);
                }
            } else {
                self.line.push(byte);
            }
        }
        out
    }

    fn process_line(&mut self, line: &[u8]) -> Option<Bytes> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(b":") {
            return None;
        }

        let (field, value) = match line.iter().position(|&b| b == b':') {
            Some(colon) => {
                let value = &line[colon + 1..];
                (&line[..colon], value.strip_prefix(b" ").unwrap_or(value))
            }
            None => (line, &[][..]),
        };

        if field == b"data" {
            if self.has_data {
                self.data.push(b'\n');
            }
            self.data.extend_from_slice(value);
            self.has_data = true;
        }
        None
    }

    fn dispatch(&mut self) -> Option<Bytes> {
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(Bytes::from(std::mem::take(&mut self.data)))
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * jitter`
///
/// Jitter is +-25%, derived from the attempt number.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(31)).unwrap_or(31);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter_factor = 1.0 + 0.25 * ((f64::from(attempt) * 7.3).sin());
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        assert!(
            d10 <= Duration::from_secs(13),
            "delay at attempt 10 ({d10:?}) should be capped near max_delay"
        );
        // Huge attempt counts must not overflow.
        let _ = calculate_backoff(u32::MAX, &config);
    }

    #[test]
    fn parser_yields_one_payload_per_event() {
        let mut parser = SseParser::default();
        let out = parser.push(b"id: 1:0\ndata: [{\"a\":1}]\n\nid: 2:0\ndata: [{\"b\":2}]\n\n");
        assert_eq!(
            out,
            vec![
                Bytes::from_static(b"[{\"a\":1}]"),
                Bytes::from_static(b"[{\"b\":2}]"),
            ]
        );
    }

    #[test]
    fn parser_handles_split_chunks_and_crlf() {
        let mut parser = SseParser::default();
        assert!(parser.push(b"data: [1,").is_empty());
        assert!(parser.push(b"2]\r\n").is_empty());
        let out = parser.push(b"\r\n");
        assert_eq!(out, vec![Bytes::from_static(b"[1,2]")]);
    }

    #[test]
    fn parser_joins_multiline_data() {
        let mut parser = SseParser::default();
        let out = parser.push(b"data:[\ndata: 1]\n\n");
        assert_eq!(out, vec![Bytes::from_static(b"[\n1]")]);
    }

    #[test]
    fn parser_ignores_comments_and_empty_events() {
        let mut parser = SseParser::default();
        let out = parser.push(b": hi\n\nevent: ping\nretry: 100\n\n");
        assert!(out.is_empty());
    }
}
