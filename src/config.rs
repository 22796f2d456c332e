use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use crate::alarm::model::AlarmTime;
use crate::alarm::monitor::DEFAULT_ALARM_COOLDOWN_MS;
use crate::clock::TimeDisplayMode;
use crate::notification::DEFAULT_NOTIFICATION_DURATION_MS;
use crate::scheduler::{DEFAULT_STOPWATCH_REFRESH_MS, DEFAULT_TICK_PERIOD_MS, MAX_PERIOD_MS};
use crate::theme::Theme;

pub const DEFAULT_WEATHER_TEXT: &str = "25°C";

/// Everything a widget instance needs at mount time.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    pub theme: Theme,
    pub time_format: TimeDisplayMode,
    pub weather_text: String,
    pub tick_period_ms: u64,
    pub stopwatch_refresh_ms: u64,
    pub notification_duration_ms: u64,
    pub alarm_cooldown_ms: u64,
    pub alarm: Option<AlarmTime>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Default,
            time_format: TimeDisplayMode::Hour24,
            weather_text: DEFAULT_WEATHER_TEXT.to_string(),
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            stopwatch_refresh_ms: DEFAULT_STOPWATCH_REFRESH_MS,
            notification_duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
            alarm_cooldown_ms: DEFAULT_ALARM_COOLDOWN_MS,
            alarm: None,
        }
    }
}

pub fn load_widget_config(path: &Path) -> Result<WidgetConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file {}", path.display()))?;
    parse_widget_config_text(&content)
}

pub fn parse_widget_config_text(content: &str) -> Result<WidgetConfig> {
    let raw = serde_json::from_str::<WidgetConfigFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported widget config version {}; expected version 1",
            raw.version
        );
    }

    let theme = match raw.theme.as_deref() {
        Some(name) => name.parse::<Theme>()?,
        None => Theme::Default,
    };
    let time_format = match raw.time_format.as_deref() {
        Some(text) => parse_time_format(text)?,
        None => TimeDisplayMode::Hour24,
    };
    let alarm = raw
        .alarm
        .as_deref()
        .map(str::parse::<AlarmTime>)
        .transpose()?;

    for (name, value) in [
        ("tick_period_ms", raw.tick_period_ms),
        ("stopwatch_refresh_ms", raw.stopwatch_refresh_ms),
        ("notification_duration_ms", raw.notification_duration_ms),
        ("alarm_cooldown_ms", raw.alarm_cooldown_ms),
    ] {
        if value == 0 {
            bail!("{name} must be greater than zero");
        }
    }
    for (name, value) in [
        ("tick_period_ms", raw.tick_period_ms),
        ("stopwatch_refresh_ms", raw.stopwatch_refresh_ms),
    ] {
        if value > MAX_PERIOD_MS {
            bail!("{name} must be at most {MAX_PERIOD_MS} ms, got {value}");
        }
    }

    Ok(WidgetConfig {
        theme,
        time_format,
        weather_text: raw.weather_text,
        tick_period_ms: raw.tick_period_ms,
        stopwatch_refresh_ms: raw.stopwatch_refresh_ms,
        notification_duration_ms: raw.notification_duration_ms,
        alarm_cooldown_ms: raw.alarm_cooldown_ms,
        alarm,
    })
}

pub fn parse_time_format(input: &str) -> Result<TimeDisplayMode> {
    match input.trim().to_ascii_lowercase().as_str() {
        "24h" | "24" => Ok(TimeDisplayMode::Hour24),
        "12h" | "12" => Ok(TimeDisplayMode::Hour12),
        _ => bail!("invalid time_format '{input}', expected \"24h\" or \"12h\""),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WidgetConfigFile {
    version: u32,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    time_format: Option<String>,
    #[serde(default = "default_weather_text")]
    weather_text: String,
    #[serde(default = "default_tick_period_ms")]
    tick_period_ms: u64,
    #[serde(default = "default_stopwatch_refresh_ms")]
    stopwatch_refresh_ms: u64,
    #[serde(default = "default_notification_duration_ms")]
    notification_duration_ms: u64,
    #[serde(default = "default_alarm_cooldown_ms")]
    alarm_cooldown_ms: u64,
    #[serde(default)]
    alarm: Option<String>,
}

fn default_weather_text() -> String {
    DEFAULT_WEATHER_TEXT.to_string()
}

fn default_tick_period_ms() -> u64 {
    DEFAULT_TICK_PERIOD_MS
}

fn default_stopwatch_refresh_ms() -> u64 {
    DEFAULT_STOPWATCH_REFRESH_MS
}

fn default_notification_duration_ms() -> u64 {
    DEFAULT_NOTIFICATION_DURATION_MS
}

fn default_alarm_cooldown_ms() -> u64 {
    DEFAULT_ALARM_COOLDOWN_MS
}
