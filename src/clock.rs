use chrono::{DateTime, TimeZone, Timelike};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeDisplayMode {
    #[default]
    Hour24,
    Hour12,
}

/// Render-facing clock state for one tick. Always recomputed, never patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockSnapshot {
    pub hour_angle_deg: f64,
    pub minute_angle_deg: f64,
    pub second_angle_deg: f64,
    pub time_text: String,
    pub date_text: String,
}

/// Derives hand angles and labels from a wall-clock reading.
///
/// The hour hand creeps with the minutes (`(h % 12 + m / 60) * 30`); minute
/// and second hands move in whole 6 degree steps. All angles are clockwise
/// from twelve o'clock and normalised into `[0, 360)`.
pub fn compute_snapshot<Tz>(now: &DateTime<Tz>, mode: TimeDisplayMode) -> ClockSnapshot
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let hours = f64::from(now.hour() % 12);
    let minutes = f64::from(now.minute());
    let seconds = f64::from(now.second());

    let time_text = match mode {
        TimeDisplayMode::Hour24 => now.format("%H:%M:%S").to_string(),
        TimeDisplayMode::Hour12 => now.format("%I:%M:%S %p").to_string(),
    };

    ClockSnapshot {
        hour_angle_deg: normalize_degrees((hours + minutes / 60.0) * 30.0),
        minute_angle_deg: normalize_degrees(minutes * 6.0),
        second_angle_deg: normalize_degrees(seconds * 6.0),
        time_text,
        date_text: now.format("%a %b %d %Y").to_string(),
    }
}

pub fn normalize_degrees(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if normalized >= 360.0 { 0.0 } else { normalized }
}
