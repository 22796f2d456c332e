use std::io::Write;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;

use crate::config::WidgetConfig;
use crate::diagnostics::sleep_until;
use crate::alarm::model::AlarmStatus;
use crate::notification::Severity;
use crate::stopwatch::StopwatchPhase;
use crate::theme::Theme;
use crate::time_provider::{SelectedTimeProvider, TimeSample};
use crate::widget::{RenderSurface, WatchWidget, WidgetUpdate};

/// Line-oriented surface for terminals and scripts.
pub struct TerminalSurface<W: Write> {
    out: W,
    json: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    fn write_summary(&mut self, summary: &HeadlessSummary) -> Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, summary).context("failed to encode summary")?;
            writeln!(self.out)?;
        } else {
            writeln!(
                self.out,
                "summary steps={} clock_ticks={} stopwatch_refreshes={} missed_ticks={} alarms_fired={} render_failures={} stopwatch={} theme={}",
                summary.steps,
                summary.clock_ticks,
                summary.stopwatch_refreshes,
                summary.missed_ticks,
                summary.alarms_fired,
                summary.render_failures,
                summary.stopwatch,
                summary.theme,
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> RenderSurface for TerminalSurface<W> {
    fn is_attached(&self) -> bool {
        true
    }

    fn present(&mut self, update: &WidgetUpdate) -> Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, update).context("failed to encode update")?;
            writeln!(self.out)?;
        } else {
            writeln!(self.out, "{}", format_update(update))?;
        }
        Ok(())
    }
}

pub fn format_update(update: &WidgetUpdate) -> String {
    match update {
        WidgetUpdate::Clock(snapshot) => format!(
            "clock {} | {} | hands h={:.1} m={:.1} s={:.1}",
            snapshot.time_text,
            snapshot.date_text,
            snapshot.hour_angle_deg,
            snapshot.minute_angle_deg,
            snapshot.second_angle_deg
        ),
        WidgetUpdate::Alarm(event) => format!(
            "alarm ringing for {} at {}",
            event.target,
            event.fired_at.format("%H:%M:%S")
        ),
        WidgetUpdate::AlarmState(state) => {
            let target = state.target_time.map(|t| t.to_string()).unwrap_or_default();
            match state.status() {
                AlarmStatus::Unset => "alarm-state unset".to_string(),
                AlarmStatus::Armed => format!("alarm-state armed {target}"),
                AlarmStatus::Ringing => format!("alarm-state ringing {target}"),
            }
        }
        WidgetUpdate::Stopwatch(display) => {
            format!("stopwatch {} {}", display.text, phase_name(display.phase))
        }
        WidgetUpdate::Theme(state) => format!("theme {}", state.current_theme),
        WidgetUpdate::Weather { text } => format!("weather {text}"),
        WidgetUpdate::NotificationPosted(notification) => {
            let level = match notification.severity {
                Severity::Info => "info",
                Severity::Error => "error",
            };
            format!("notify [{level}] {}", notification.message)
        }
        WidgetUpdate::NotificationExpired { id } => format!("notify-expired #{}", id.0),
    }
}

fn phase_name(phase: StopwatchPhase) -> &'static str {
    match phase {
        StopwatchPhase::Idle => "idle",
        StopwatchPhase::Running => "running",
        StopwatchPhase::Paused => "paused",
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum WidgetAction {
    SetAlarm(String),
    ClearAlarm,
    Start,
    Stop,
    Reset,
    Theme(String),
    Refresh,
}

/// An action to deliver at a given polling step; step 0 runs right after mount.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ScheduledAction {
    pub step: u64,
    pub action: WidgetAction,
}

impl FromStr for ScheduledAction {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let (step, action) = input
            .split_once(':')
            .ok_or_else(|| anyhow!("invalid action '{input}', expected <step>:<action>"))?;
        let step = step
            .trim()
            .parse::<u64>()
            .with_context(|| format!("invalid step in action '{input}'"))?;
        let action = match action.trim() {
            "clear-alarm" => WidgetAction::ClearAlarm,
            "start" => WidgetAction::Start,
            "stop" => WidgetAction::Stop,
            "reset" => WidgetAction::Reset,
            "refresh" => WidgetAction::Refresh,
            other => match other.split_once('=') {
                Some(("alarm", value)) => WidgetAction::SetAlarm(value.to_string()),
                Some(("theme", value)) => WidgetAction::Theme(value.to_string()),
                _ => bail!(
                    "unknown action '{other}', expected alarm=HH:MM, clear-alarm, start, stop, reset, theme=<name> or refresh"
                ),
            },
        };
        Ok(Self { step, action })
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub steps: u64,
    pub json: bool,
    pub actions: Vec<ScheduledAction>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename = "summary")]
pub struct HeadlessSummary {
    pub steps: u64,
    pub clock_ticks: u64,
    pub stopwatch_refreshes: u64,
    pub missed_ticks: u64,
    pub alarms_fired: u64,
    pub render_failures: u64,
    pub stopwatch: String,
    pub theme: Theme,
}

/// Mounts a widget on a terminal surface and drives it for `options.steps`
/// polling steps. Simulated time is stepped by the shortest schedule period;
/// real time sleeps until each step's deadline.
pub fn run_headless<W: Write>(
    selected: &SelectedTimeProvider,
    config: &WidgetConfig,
    options: &HeadlessOptions,
    out: W,
) -> Result<HeadlessSummary> {
    let step_ms = config.tick_period_ms.min(config.stopwatch_refresh_ms).max(1);
    let first = selected.provider.now()?;
    let mut widget = WatchWidget::mount(TerminalSurface::new(out, options.json), config, &first)?;
    tracing::info!(
        source = selected.label,
        steps = options.steps,
        step_ms,
        "headless run started"
    );

    apply_actions(&mut widget, options, 0, &first);
    let anchor = Instant::now();
    let mut alarms_fired = 0;
    let mut last = first;
    for step in 1..=options.steps {
        match &selected.manual {
            Some(manual) => manual.advance(Duration::from_millis(step_ms))?,
            None => sleep_until(anchor + Duration::from_millis(step_ms.saturating_mul(step))),
        }
        let now = selected.provider.now()?;
        apply_actions(&mut widget, options, step, &now);
        if widget.on_tick(&now).alarm_fired {
            alarms_fired += 1;
        }
        last = now;
    }

    let stats = widget.tick_stats().clone();
    let summary = HeadlessSummary {
        steps: options.steps,
        clock_ticks: stats.clock_ticks(),
        stopwatch_refreshes: stats.stopwatch_refreshes(),
        missed_ticks: stats.missed_ticks(),
        alarms_fired,
        render_failures: widget.render_failures(),
        stopwatch: widget.stopwatch_display(last.monotonic_ms).text,
        theme: widget.theme(),
    };
    widget.on_destroy();
    widget.into_surface().write_summary(&summary)?;
    Ok(summary)
}

fn apply_actions<S: RenderSurface>(
    widget: &mut WatchWidget<S>,
    options: &HeadlessOptions,
    step: u64,
    now: &TimeSample,
) {
    for scheduled in options.actions.iter().filter(|a| a.step == step) {
        let result = match &scheduled.action {
            WidgetAction::SetAlarm(target) => widget.on_set_alarm(target, now).map(|_| ()),
            WidgetAction::ClearAlarm => widget.on_clear_alarm(now).map(|_| ()),
            WidgetAction::Start => widget.on_start_stopwatch(now),
            WidgetAction::Stop => widget.on_stop_stopwatch(now),
            WidgetAction::Reset => widget.on_reset_stopwatch(now),
            WidgetAction::Theme(name) => widget.on_select_theme(name, now).map(|_| ()),
            WidgetAction::Refresh => {
                widget.on_update_view(now);
                Ok(())
            }
        };
        if let Err(err) = result {
            // Already surfaced through the notification slot.
            tracing::debug!(step, error = %err, "scripted action refused");
        }
    }
}
