// ── Command interpreter ──
//
// Closed vocabulary typed on the command line (`help`, `refresh`,
// `all_on`, `all_off`, `scene <name>`) plus the batch operations bound to
// keys (power toggle, brightness step). Batch operations are best-effort:
// per-light failures are logged and collected, unreachable lights are
// skipped, and one full refresh follows the whole batch.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::gateway::LightGateway;
use crate::model::LightId;
use crate::reconcile::full_refresh;
use crate::registry::LightRegistry;
use crate::selection::Selection;

// ── Vocabulary ───────────────────────────────────────────────────────

/// Command names as typed. Case-sensitive, no abbreviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CommandKind {
    Help,
    Refresh,
    AllOn,
    AllOff,
    Scene,
}

impl CommandKind {
    pub fn usage(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Refresh => "refresh",
            Self::AllOn => "all_on",
            Self::AllOff => "all_off",
            Self::Scene => "scene <name>",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Self::Help => "Lists the available commands",
            Self::Refresh => "Updates light status and checks connectivity",
            Self::AllOn => "Turns on every reachable light that is off",
            Self::AllOff => "Turns off every reachable light that is on",
            Self::Scene => "Recalls the first scene with exactly this name",
        }
    }
}

/// The text emitted by `help`.
pub fn help_lines() -> Vec<String> {
    let names: Vec<&str> = CommandKind::iter().map(CommandKind::usage).collect();
    let mut lines = vec![format!("Available commands: {}", names.join(", "))];
    lines.extend(
        CommandKind::iter().map(|kind| format!("{} - {}", kind.usage(), kind.summary())),
    );
    lines
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Refresh,
    PowerAll(bool),
    Scene(String),
}

impl Command {
    /// Parse one command line. For `scene`, the name is everything after
    /// the first space, verbatim.
    pub fn parse(line: &str) -> Result<Self, CoreError> {
        let unknown = || CoreError::UnknownCommand {
            command: line.to_owned(),
        };

        let (head, rest) = match line.split_once(' ') {
            Some((head, rest)) => (head, Some(rest)),
            None => (line, None),
        };
        let kind: CommandKind = head.parse().map_err(|_| unknown())?;

        match (kind, rest) {
            (CommandKind::Scene, Some(name)) if !name.is_empty() => Ok(Self::Scene(name.to_owned())),
            (CommandKind::Scene, _) => Err(CoreError::Usage {
                usage: CommandKind::Scene.usage().to_owned(),
            }),
            (_, Some(_)) => Err(unknown()),
            (CommandKind::Help, None) => Ok(Self::Help),
            (CommandKind::Refresh, None) => Ok(Self::Refresh),
            (CommandKind::AllOn, None) => Ok(Self::PowerAll(true)),
            (CommandKind::AllOff, None) => Ok(Self::PowerAll(false)),
        }
    }
}

// ── Outcomes ─────────────────────────────────────────────────────────

/// A light a batch operation could not change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub light: LightId,
    pub name: String,
    pub error: String,
}

/// Tally of one batch operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Reachable lights a mutation was issued for.
    pub attempted: usize,
    pub succeeded: usize,
    /// Unreachable lights left alone. Not errors.
    pub skipped: usize,
    pub failures: Vec<BatchFailure>,
    /// Set when the follow-up refresh failed.
    pub refresh_error: Option<String>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.refresh_error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Help(Vec<String>),
    Refreshed { lights: usize },
    Batch(BatchReport),
    SceneRecalled { name: String },
}

// ── Execution ────────────────────────────────────────────────────────

/// Parse and run one command line. Parse errors never reach the gateway.
pub async fn run_line<G: LightGateway + ?Sized>(
    line: &str,
    gateway: &G,
    registry: &mut LightRegistry,
    selection: &mut Selection,
) -> Result<CommandOutcome, CoreError> {
    let command = Command::parse(line)?;
    execute(&command, gateway, registry, selection).await
}

/// Run a parsed command against the registry and gateway.
///
/// Commands that mutate lights clear the selection.
pub async fn execute<G: LightGateway + ?Sized>(
    command: &Command,
    gateway: &G,
    registry: &mut LightRegistry,
    selection: &mut Selection,
) -> Result<CommandOutcome, CoreError> {
    info!(?command, "Executing command");

    match command {
        Command::Help => {
            let lines = help_lines();
            for line in &lines {
                info!("{line}");
            }
            Ok(CommandOutcome::Help(lines))
        }
        Command::Refresh => {
            let lights = full_refresh(gateway, registry).await?;
            selection.sync(registry);
            Ok(CommandOutcome::Refreshed { lights })
        }
        Command::PowerAll(on) => {
            let targets = registry
                .iter()
                .filter(|l| l.power != *on)
                .map(Target::from)
                .collect();
            let report = run_batch(gateway, registry, targets, LightOp::SetPower(*on)).await;
            selection.clear_selection();
            selection.sync(registry);
            Ok(CommandOutcome::Batch(report))
        }
        Command::Scene(name) => {
            recall_scene(gateway, registry, name).await?;
            selection.clear_selection();
            selection.sync(registry);
            Ok(CommandOutcome::SceneRecalled { name: name.clone() })
        }
    }
}

/// Flip power on every selected light, reading the current state from the
/// gateway right before writing. Clears the selection.
pub async fn toggle_selected<G: LightGateway + ?Sized>(
    gateway: &G,
    registry: &mut LightRegistry,
    selection: &mut Selection,
) -> BatchReport {
    let targets = selected_targets(registry, selection);
    if targets.is_empty() {
        return BatchReport::default();
    }
    let report = run_batch(gateway, registry, targets, LightOp::TogglePower).await;
    selection.clear_selection();
    selection.sync(registry);
    report
}

/// Step brightness by `delta` on every selected light, clamped to
/// `0..=100`. The selection is kept so repeated presses compose.
pub async fn step_brightness_selected<G: LightGateway + ?Sized>(
    gateway: &G,
    registry: &mut LightRegistry,
    selection: &mut Selection,
    delta: i32,
) -> BatchReport {
    let targets = selected_targets(registry, selection);
    if targets.is_empty() {
        return BatchReport::default();
    }
    let report = run_batch(gateway, registry, targets, LightOp::StepBrightness(delta)).await;
    selection.sync(registry);
    report
}

async fn recall_scene<G: LightGateway + ?Sized>(
    gateway: &G,
    registry: &mut LightRegistry,
    name: &str,
) -> Result<(), CoreError> {
    let scenes = gateway.list_scenes().await?;
    let scene = scenes
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| CoreError::SceneNotFound {
            name: name.to_owned(),
        })?;

    gateway.recall_scene(&scene.id).await?;
    info!(scene = %scene.name, id = %scene.id, "Scene recalled");

    if let Err(e) = full_refresh(gateway, registry).await {
        warn!(error = %e, "Refresh after scene recall failed");
    }
    Ok(())
}

// ── Batch plumbing ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum LightOp {
    TogglePower,
    SetPower(bool),
    StepBrightness(i32),
}

/// Owned snapshot of what a batch needs from a registry row.
#[derive(Debug, Clone)]
struct Target {
    id: LightId,
    name: String,
    reachable: bool,
}

impl From<&crate::model::Light> for Target {
    fn from(light: &crate::model::Light) -> Self {
        Self {
            id: light.id.clone(),
            name: light.name.clone(),
            reachable: light.reachable,
        }
    }
}

fn selected_targets(registry: &LightRegistry, selection: &Selection) -> Vec<Target> {
    selection
        .selected_lights(registry)
        .into_iter()
        .map(Target::from)
        .collect()
}

async fn apply_op<G: LightGateway + ?Sized>(
    gateway: &G,
    id: &LightId,
    op: LightOp,
) -> Result<String, CoreError> {
    match op {
        LightOp::SetPower(on) => {
            gateway.set_power(id, on).await?;
            Ok(if on { "on" } else { "off" }.to_owned())
        }
        LightOp::TogglePower => {
            let current = gateway.get_light(id).await?;
            let on = !current.power;
            gateway.set_power(id, on).await?;
            Ok(if on { "on" } else { "off" }.to_owned())
        }
        LightOp::StepBrightness(delta) => {
            let current = gateway.get_light(id).await?;
            let next = current.brightness.step(delta);
            gateway.set_brightness(id, next).await?;
            Ok(format!("brightness {} -> {next}", current.brightness))
        }
    }
}

async fn run_batch<G: LightGateway + ?Sized>(
    gateway: &G,
    registry: &mut LightRegistry,
    targets: Vec<Target>,
    op: LightOp,
) -> BatchReport {
    let mut report = BatchReport::default();

    for target in targets {
        if !target.reachable {
            info!(light = %target.name, "Skipping unreachable light");
            report.skipped += 1;
            continue;
        }

        report.attempted += 1;
        match apply_op(gateway, &target.id, op).await {
            Ok(change) => {
                info!(light = %target.name, id = %target.id, "Set {change}");
                report.succeeded += 1;
            }
            Err(e) => {
                warn!(light = %target.name, id = %target.id, error = %e, "Light update failed");
                report.failures.push(BatchFailure {
                    light: target.id,
                    name: target.name,
                    error: e.to_string(),
                });
            }
        }
    }

    if let Err(e) = full_refresh(gateway, registry).await {
        warn!(error = %e, "Refresh after batch failed");
        report.refresh_error = Some(e.to_string());
    }

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_fixed_vocabulary() {
        assert_eq!(Command::parse("help").unwrap(), Command::Help);
        assert_eq!(Command::parse("refresh").unwrap(), Command::Refresh);
        assert_eq!(Command::parse("all_on").unwrap(), Command::PowerAll(true));
        assert_eq!(Command::parse("all_off").unwrap(), Command::PowerAll(false));
    }

    #[test]
    fn scene_name_is_the_verbatim_rest() {
        assert_eq!(
            Command::parse("scene Movie  Night ").unwrap(),
            Command::Scene("Movie  Night ".into())
        );
    }

    #[test]
    fn scene_without_name_is_a_usage_error() {
        assert!(matches!(Command::parse("scene"), Err(CoreError::Usage { .. })));
        assert!(matches!(Command::parse("scene "), Err(CoreError::Usage { .. })));
    }

    #[test]
    fn commands_are_case_sensitive_and_unabbreviated() {
        for line in ["Help", "ref", "ALL_ON", "", "help me", "dance"] {
            assert!(
                matches!(Command::parse(line), Err(CoreError::UnknownCommand { .. })),
                "{line:?} should be unknown"
            );
        }
    }

    #[test]
    fn help_text() {
        insta::assert_snapshot!(help_lines().join("\n"), @r"
        Available commands: help, refresh, all_on, all_off, scene <name>
        help - Lists the available commands
        refresh - Updates light status and checks connectivity
        all_on - Turns on every reachable light that is off
        all_off - Turns off every reachable light that is on
        scene <name> - Recalls the first scene with exactly this name
        ");
    }
}
