//! Event multiplexer: terminal input, bridge payloads and timers merged
//! into one channel consumed by the app loop.

use std::time::Duration;

use bytes::Bytes;
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Everything the app loop reacts to.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Housekeeping tick (4 Hz).
    Tick,
    /// Redraw tick (~30 FPS).
    Render,
    /// One raw payload from the bridge event stream.
    Bridge(Bytes),
    /// Periodic full refresh is due.
    Refresh,
}

/// Timer settings for [`EventReader::new`].
#[derive(Debug, Clone, Copy)]
pub struct Rates {
    pub tick: Duration,
    pub render: Duration,
    /// `None` disables periodic refresh.
    pub refresh: Option<Duration>,
}

/// Background task feeding [`Event`]s into a channel.
pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    /// Spawn the reader. `bridge` is the payload channel of the event
    /// stream, if one is running.
    pub fn new(rates: Rates, bridge: Option<mpsc::UnboundedReceiver<Bytes>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut bridge = bridge;
            let mut terminal_events = EventStream::new();
            let mut tick_interval = skipping_interval(rates.tick, false);
            let mut render_interval = skipping_interval(rates.render, false);
            // The first refresh happens at startup, so the timer starts one
            // period out.
            let mut refresh_interval = rates.refresh.map(|p| skipping_interval(p, true));

            loop {
                let event = tokio::select! {
                    () = task_cancel.cancelled() => break,

                    _ = tick_interval.tick() => Event::Tick,

                    _ = render_interval.tick() => Event::Render,

                    () = next_refresh(refresh_interval.as_mut()) => Event::Refresh,

                    Some(payload) = next_payload(&mut bridge) => Event::Bridge(payload),

                    Some(Ok(crossterm_event)) = terminal_events.next() => {
                        match crossterm_event {
                            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                                Event::Key(key)
                            }
                            CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
                            _ => continue,
                        }
                    }
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, cancel }
    }

    /// Next event, or `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// An already queued event, without waiting.
    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn skipping_interval(period: Duration, delay_first: bool) -> Interval {
    let start = if delay_first {
        Instant::now() + period
    } else {
        Instant::now()
    };
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn next_refresh(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Next bridge payload. A closed channel is dropped so the branch goes
/// quiet instead of resolving again.
async fn next_payload(bridge: &mut Option<mpsc::UnboundedReceiver<Bytes>>) -> Option<Bytes> {
    let Some(rx) = bridge.as_mut() else {
        return std::future::pending().await;
    };
    match rx.recv().await {
        Some(payload) => Some(payload),
        None => {
            tracing::warn!("Event stream channel closed");
            *bridge = None;
            None
        }
    }
}
