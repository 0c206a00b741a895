//! Application core: event loop, key mapping, action dispatch, rendering.
//!
//! The app is the single owner of the light registry and the selection.
//! Terminal keys, bridge payloads and timers all arrive as [`Event`]s on
//! one channel and are turned into [`Action`]s that run to completion
//! before the next one is taken.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use lumen_core::command::{run_line, step_brightness_selected, toggle_selected};
use lumen_core::{
    BatchReport, CommandOutcome, CoreError, LightGateway, LightRegistry, Selection, apply_batch,
    decode_batch, full_refresh,
};

use crate::action::{Action, Notification, NotificationLevel};
use crate::event::{Event, EventReader, Rates};
use crate::screens::lights;
use crate::theme;
use crate::tui::Tui;

/// Brightness change per arrow key press.
pub const BRIGHTNESS_STEP: i32 = 10;

const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing on the command line after `:`.
    Command,
}

pub struct App {
    gateway: Arc<dyn LightGateway>,
    /// Bridge address shown in the title.
    bridge_label: String,
    refresh_interval: Option<Duration>,
    registry: LightRegistry,
    selection: Selection,
    mode: InputMode,
    command_line: String,
    running: bool,
    notification: Option<(Notification, Instant)>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(
        gateway: Arc<dyn LightGateway>,
        bridge_label: impl Into<String>,
        refresh_interval: Option<Duration>,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            bridge_label: bridge_label.into(),
            refresh_interval,
            registry: LightRegistry::new(),
            selection: Selection::new(),
            mode: InputMode::Normal,
            command_line: String::new(),
            running: true,
            notification: None,
            action_tx,
            action_rx,
        }
    }

    /// Run until the user quits. `bridge_events` carries raw payloads from
    /// the event stream, when one is running.
    pub async fn run(&mut self, bridge_events: Option<mpsc::UnboundedReceiver<Bytes>>) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let mut events = EventReader::new(
            Rates {
                tick: Duration::from_millis(250),
                render: Duration::from_millis(33),
                refresh: self.refresh_interval,
            },
            bridge_events,
        );

        // A failed first refresh leaves an empty table and a notification.
        self.refresh().await;
        tui.draw(|frame| self.render(frame))?;

        info!("Event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            // Timers keep firing while a gateway call blocks the loop, so
            // take the whole backlog and draw once for it.
            let mut pending = Some(event);
            while let Some(event) = pending {
                if let Some(action) = self.map_event(event) {
                    self.action_tx.send(action)?;
                }
                pending = events.try_next();
            }

            if self.drain_actions().await {
                tui.draw(|frame| self.render(frame))?;
            }
        }

        events.stop();
        drop(tui);
        info!("Event loop ended");
        Ok(())
    }

    /// Process every queued action. Returns whether a redraw is due.
    async fn drain_actions(&mut self) -> bool {
        let mut redraw = false;
        while let Ok(action) = self.action_rx.try_recv() {
            redraw |= matches!(action, Action::Render | Action::Resize(..));
            self.process_action(action).await;
        }
        redraw
    }

    fn map_event(&self, event: Event) -> Option<Action> {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Resize(w, h) => Some(Action::Resize(w, h)),
            Event::Tick => Some(Action::Tick),
            Event::Render => Some(Action::Render),
            Event::Bridge(payload) => Some(Action::BridgeEvent(payload)),
            Event::Refresh => Some(Action::Refresh),
        }
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Map a key press to an action for the current input mode.
    pub fn handle_key_event(&self, key: KeyEvent) -> Option<Action> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        if self.mode == InputMode::Command {
            return match key.code {
                KeyCode::Esc => Some(Action::CancelCommand),
                KeyCode::Enter => Some(Action::SubmitCommand),
                KeyCode::Backspace => Some(Action::CommandBackspace),
                KeyCode::Char(c) => Some(Action::CommandInput(c)),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char(':') => Some(Action::OpenCommand),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::CursorDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::CursorUp),
            KeyCode::Char(' ') => Some(Action::ToggleMark),
            KeyCode::Enter => Some(Action::TogglePower),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::StepBrightness(-BRIGHTNESS_STEP)),
            KeyCode::Char('l') | KeyCode::Right => Some(Action::StepBrightness(BRIGHTNESS_STEP)),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Esc => Some(Action::DismissNotification),
            _ => None,
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    pub async fn process_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
            }

            Action::Render | Action::Resize(..) => {}

            Action::CursorUp => self.selection.move_cursor(-1, self.registry.len()),
            Action::CursorDown => self.selection.move_cursor(1, self.registry.len()),
            Action::ToggleMark => {
                let cursor = self.selection.cursor();
                self.selection.toggle_selection(&self.registry, cursor);
            }

            Action::TogglePower => {
                if self.nothing_marked() {
                    return;
                }
                let report =
                    toggle_selected(&*self.gateway, &mut self.registry, &mut self.selection)
                        .await;
                self.notify(batch_notification("Toggle", &report));
            }

            Action::StepBrightness(delta) => {
                if self.nothing_marked() {
                    return;
                }
                let report = step_brightness_selected(
                    &*self.gateway,
                    &mut self.registry,
                    &mut self.selection,
                    delta,
                )
                .await;
                let label = if delta > 0 { "Brighter" } else { "Dimmer" };
                self.notify(batch_notification(label, &report));
            }

            Action::Refresh => self.refresh().await,

            Action::OpenCommand => {
                self.mode = InputMode::Command;
                self.command_line.clear();
            }
            Action::CommandInput(c) => self.command_line.push(c),
            Action::CommandBackspace => {
                self.command_line.pop();
            }
            Action::CancelCommand => {
                self.mode = InputMode::Normal;
                self.command_line.clear();
            }
            Action::SubmitCommand => {
                self.mode = InputMode::Normal;
                let line = std::mem::take(&mut self.command_line);
                if !line.is_empty() {
                    self.run_command(&line).await;
                }
            }

            Action::BridgeEvent(payload) => self.merge(&payload),

            Action::DismissNotification => self.notification = None,
        }
    }

    async fn run_command(&mut self, line: &str) {
        let result = run_line(
            line,
            &*self.gateway,
            &mut self.registry,
            &mut self.selection,
        )
        .await;

        let notification = match result {
            Ok(CommandOutcome::Help(lines)) => {
                Notification::info(lines.into_iter().next().unwrap_or_default())
            }
            Ok(CommandOutcome::Refreshed { lights }) => {
                Notification::success(format!("Refreshed {lights} lights"))
            }
            Ok(CommandOutcome::Batch(report)) => batch_notification(line, &report),
            Ok(CommandOutcome::SceneRecalled { name }) => {
                Notification::success(format!("Scene '{name}' recalled"))
            }
            Err(e) => {
                warn!(command = line, error = %e, "Command failed");
                error_notification(&e)
            }
        };
        self.notify(notification);
    }

    /// Full refresh. Failures keep the previous registry.
    async fn refresh(&mut self) {
        match full_refresh(&*self.gateway, &mut self.registry).await {
            Ok(lights) => {
                self.selection.sync(&self.registry);
                debug!(lights, "Registry refreshed");
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed");
                self.notify(Notification::error(format!("Refresh failed: {e}")));
            }
        }
    }

    /// Decode one event-stream payload and merge it. Undecodable payloads
    /// are dropped whole.
    fn merge(&mut self, payload: &[u8]) {
        match decode_batch(payload) {
            Ok(records) => {
                let report = apply_batch(&mut self.registry, records);
                self.selection.sync(&self.registry);
                debug!(?report, "Event batch merged");
            }
            Err(e) => warn!(error = %e, bytes = payload.len(), "Discarding event batch"),
        }
    }

    fn nothing_marked(&mut self) -> bool {
        if self.selection.is_empty() {
            self.notify(Notification::info("Mark lights with Space first"));
            return true;
        }
        false
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    // ── Rendering ────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Length(1), // Title
            Constraint::Min(3),    // Lights table
            Constraint::Length(1), // Key hints
            Constraint::Length(3), // Command box
        ])
        .split(area);

        self.render_title(frame, layout[0]);
        lights::render(
            frame,
            layout[1],
            &self.registry,
            &self.selection,
            self.mode == InputMode::Normal,
        );
        self.render_key_hints(frame, layout[2]);
        self.render_command_box(frame, layout[3]);

        if let Some((ref notif, _)) = self.notification {
            render_notification(frame, area, notif);
        }
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let refreshed = self.registry.last_refresh().map_or_else(
            || "never".to_owned(),
            |at| {
                at.with_timezone(&chrono::Local)
                    .format("%H:%M:%S")
                    .to_string()
            },
        );

        let line = Line::from(vec![
            Span::styled(" lumen ", theme::title_style()),
            Span::styled(format!("· {} ", self.bridge_label), theme::key_hint()),
            Span::styled(
                format!("· {} lights ", self.registry.len()),
                Style::default().fg(theme::SOFT_WHITE),
            ),
            Span::styled(format!("· refreshed {refreshed}"), theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_key_hints(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(" ")];
        for (key, label) in [
            ("j/k", "move"),
            ("space", "mark"),
            ("enter", "toggle"),
            ("←/→", "brightness"),
            (":", "command"),
            ("q", "quit"),
        ] {
            spans.push(Span::styled(key, theme::key_hint_key()));
            spans.push(Span::styled(format!(" {label}  "), theme::key_hint()));
        }

        let marked = self.selection.selected_count();
        if marked > 0 {
            spans.push(Span::styled(
                format!("│ {marked} marked"),
                Style::default().fg(theme::ON_GREEN),
            ));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_command_box(&self, frame: &mut Frame, area: Rect) {
        let editing = self.mode == InputMode::Command;
        let block = Block::default()
            .title(" Command ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if editing {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let line = if editing {
            Line::from(vec![
                Span::styled(":", Style::default().fg(theme::DUSK_VIOLET)),
                Span::styled(&self.command_line, Style::default().fg(theme::DAYLIGHT)),
                Span::styled("█", Style::default().fg(theme::DAYLIGHT)),
                Span::styled("  Esc cancel  Enter run", theme::key_hint()),
            ])
        } else {
            Line::from(Span::styled(
                "Press : for commands (help, refresh, all_on, all_off, scene <name>)",
                theme::key_hint(),
            ))
        };

        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

/// Toast in the bottom-right corner, above the command box.
fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
    let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len
        .saturating_add(6)
        .clamp(20, 70)
        .min(area.width.saturating_sub(2));
    let height = 3u16;

    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 4);
    let toast_area = Rect::new(area.x + x, area.y + y, width, height).intersection(area);

    let (border_color, icon) = match notif.level {
        NotificationLevel::Success => (theme::ON_GREEN, "✓"),
        NotificationLevel::Error => (theme::FAULT_RED, "✗"),
        NotificationLevel::Warning => (theme::LAMP_YELLOW, "!"),
        NotificationLevel::Info => (theme::DAYLIGHT, "·"),
    };

    frame.render_widget(
        Block::default().style(Style::default().bg(theme::NIGHT)),
        toast_area,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
        Span::styled(notif.message.as_str(), Style::default().fg(theme::SOFT_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

// ── Outcome messages ─────────────────────────────────────────────────

/// One-line summary of a batch for the toast.
pub fn batch_notification(label: &str, report: &BatchReport) -> Notification {
    if let Some(first) = report.failures.first() {
        return Notification::error(format!(
            "{label}: {} of {} failed ({}: {})",
            report.failures.len(),
            report.attempted,
            first.name,
            first.error
        ));
    }
    if let Some(ref e) = report.refresh_error {
        return Notification::warning(format!("{label}: refresh failed: {e}"));
    }
    if report.attempted == 0 && report.skipped == 0 {
        return Notification::info(format!("{label}: nothing to change"));
    }

    let skipped = if report.skipped > 0 {
        format!(", {} unreachable skipped", report.skipped)
    } else {
        String::new()
    };
    Notification::success(format!("{label}: {} updated{skipped}", report.succeeded))
}

fn error_notification(error: &CoreError) -> Notification {
    match error {
        CoreError::Usage { .. } => Notification::warning(error.to_string()),
        _ => Notification::error(error.to_string()),
    }
}
