use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::Level;

use analogwatch::config::{WidgetConfig, load_widget_config, parse_time_format};
use analogwatch::diagnostics::run_diagnostics;
use analogwatch::error::WidgetError;
use analogwatch::theme::Theme;
use analogwatch::time_provider::{TimingSourceKind, parse_start_at, select_provider};
use analogwatch::ui;
use analogwatch::ui::render::{HeadlessOptions, ScheduledAction, run_headless};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTimingSource {
    System,
    Simulated,
}

impl From<CliTimingSource> for TimingSourceKind {
    fn from(value: CliTimingSource) -> Self {
        match value {
            CliTimingSource::System => TimingSourceKind::System,
            CliTimingSource::Simulated => TimingSourceKind::Simulated,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(value: CliLogLevel) -> Self {
        match value {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "analogwatch",
    version,
    about = "Analog clock widget with alarm, stopwatch and themes"
)]
struct Cli {
    /// Widget config file (JSON); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    theme: Option<String>,

    /// Alarm to arm at mount, as HH:MM.
    #[arg(long)]
    alarm: Option<String>,

    /// 24h or 12h.
    #[arg(long)]
    time_format: Option<String>,

    #[arg(long, value_enum, default_value_t = CliTimingSource::System)]
    timing_source: CliTimingSource,

    /// Local start time for the simulated source, e.g. 2026-02-07T07:29:55.
    #[arg(long)]
    start_at: Option<String>,

    /// Print widget updates to stdout instead of opening a window.
    #[arg(long)]
    headless: bool,

    #[arg(long, default_value_t = 10)]
    steps: u64,

    #[arg(long)]
    json: bool,

    /// Scripted action for headless runs, as <step>:<action>. Repeatable.
    #[arg(long = "action")]
    actions: Vec<String>,

    #[arg(long)]
    diagnostics: bool,

    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        let fatal = err
            .downcast_ref::<WidgetError>()
            .is_some_and(WidgetError::is_fatal);
        std::process::exit(if fatal { 2 } else { 1 });
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let start_at = cli.start_at.as_deref().map(parse_start_at).transpose()?;
    let selected = select_provider(cli.timing_source.into(), start_at)?;

    if cli.diagnostics {
        return run_diagnostics(&selected, Duration::from_millis(config.tick_period_ms));
    }

    if cli.headless {
        let actions = cli
            .actions
            .iter()
            .map(|raw| raw.parse::<ScheduledAction>())
            .collect::<Result<Vec<_>>>()?;
        let options = HeadlessOptions {
            steps: cli.steps,
            json: cli.json,
            actions,
        };
        let stdout = std::io::stdout();
        run_headless(&selected, &config, &options, stdout.lock())?;
        return Ok(());
    }

    if !cli.actions.is_empty() {
        bail!("--action is only supported together with --headless");
    }
    ui::app::run_gui(selected, config)
}

/// Config file first, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<WidgetConfig> {
    let mut config = match &cli.config {
        Some(path) => load_widget_config(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => WidgetConfig::default(),
    };
    if let Some(theme) = &cli.theme {
        config.theme = theme.parse::<Theme>()?;
    }
    if let Some(alarm) = &cli.alarm {
        config.alarm = Some(alarm.parse()?);
    }
    if let Some(format) = &cli.time_format {
        config.time_format = parse_time_format(format)?;
    }
    Ok(config)
}
