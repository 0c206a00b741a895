//! `lumen` — interactive terminal client for a Hue lighting bridge.
//!
//! Lists the bridge's lights in a table kept current by the bridge event
//! stream and a periodic full refresh. Lights are marked with Space and
//! switched, dimmed or brightened in batches; `:` opens a small command
//! line (`help`, `refresh`, `all_on`, `all_off`, `scene <name>`).
//!
//! Logs go to a file (default `$TMPDIR/lumen.log`) so they never corrupt
//! the terminal UI.

mod action;
mod app;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lumen_api::EventStreamHandle;
use lumen_config::Profile;
use lumen_core::{BridgeConfig, BridgeGateway};

use crate::app::App;

/// Terminal client for Hue lighting bridges.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about)]
struct Cli {
    /// Bridge host or URL (e.g., 192.168.1.20)
    #[arg(short = 'b', long, env = "LUMEN_BRIDGE")]
    bridge: Option<String>,

    /// Application key issued by the bridge
    #[arg(short = 'k', long, env = "LUMEN_APP_KEY", hide_env_values = true)]
    app_key: Option<String>,

    /// Config profile to use (defaults to the configured default)
    #[arg(short = 'p', long, env = "LUMEN_PROFILE")]
    profile: Option<String>,

    /// Store --bridge and --app-key as a named profile before starting
    #[arg(long, value_name = "NAME", requires_all = ["bridge", "app_key"])]
    save_profile: Option<String>,

    /// Do not subscribe to the bridge event stream; rely on refreshes
    #[arg(long)]
    no_events: bool,

    /// Log file path (defaults to $TMPDIR/lumen.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. Stdout belongs to the TUI. The guard must live until
/// exit so buffered lines get flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lumen_tui={log_level},lumen_core={log_level},lumen_api={log_level},lumen_config={log_level}"
        ))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("lumen.log"));
    let log_dir = log_file
        .parent()
        .map_or_else(std::env::temp_dir, std::path::Path::to_path_buf);
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("lumen.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Priority: CLI flags (and their env vars) > lumen profile > openhue file.
fn resolve_bridge(cli: &Cli) -> Result<BridgeConfig> {
    let mut config = match (&cli.bridge, &cli.app_key) {
        (Some(bridge), Some(key)) => {
            let defaults = lumen_config::load_config()
                .map(|cfg| cfg.defaults)
                .unwrap_or_default();
            lumen_config::bridge_config(
                lumen_config::bridge_url(bridge)?,
                SecretString::from(key.clone()),
                &defaults,
            )
        }
        _ => lumen_config::resolve_bridge_config(cli.profile.as_deref())?,
    };

    if let Some(ref bridge) = cli.bridge {
        config.url = lumen_config::bridge_url(bridge)?;
    }
    if let Some(ref key) = cli.app_key {
        config.app_key = SecretString::from(key.clone());
    }
    if cli.no_events {
        config.event_stream_enabled = false;
    }
    Ok(config)
}

fn save_profile(name: &str, config: &BridgeConfig) -> Result<()> {
    let profile = Profile {
        bridge: config.url.to_string(),
        app_key: Some(config.app_key.expose_secret().to_owned()),
        ..Profile::default()
    };
    let path = lumen_config::save_profile(name, profile)?;
    info!(profile = name, path = %path.display(), "Profile saved");
    println!("Saved profile '{name}' to {}", path.display());
    Ok(())
}

/// Subscribe to the event stream. A failure here is not fatal: the
/// periodic refresh still keeps the table current.
fn spawn_event_stream(
    config: &BridgeConfig,
) -> (
    Option<EventStreamHandle>,
    Option<tokio::sync::mpsc::UnboundedReceiver<bytes::Bytes>>,
) {
    if !config.event_stream_enabled {
        info!("Event stream disabled");
        return (None, None);
    }

    match EventStreamHandle::spawn(
        config.url.as_str(),
        &config.app_key,
        &config.transport(),
        config.reconnect(),
        CancellationToken::new(),
    ) {
        Ok((handle, rx)) => (Some(handle), Some(rx)),
        Err(e) => {
            warn!(error = %e, "Event stream unavailable");
            (None, None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks first so a panic during setup still restores the terminal.
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let config = resolve_bridge(&cli)?;
    if let Some(ref name) = cli.save_profile {
        save_profile(name, &config)?;
    }

    info!(bridge = %config.url, "Starting lumen");

    let gateway = BridgeGateway::connect(&config)?;
    let (stream, bridge_events) = spawn_event_stream(&config);

    let label = config.url.host_str().unwrap_or("bridge").to_owned();
    let mut app = App::new(Arc::new(gateway), label, config.refresh_interval());
    let result = app.run(bridge_events).await;

    if let Some(stream) = stream {
        stream.shutdown();
    }
    result
}
