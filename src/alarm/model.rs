use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, Timelike};
use serde::{Serialize, Serializer};

use crate::error::WidgetError;

pub const ALARM_RINGING_MESSAGE: &str = "🔔 Alarm is ringing!";

/// A local wall-clock hour and minute, written `HH:MM`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct AlarmTime {
    hour: u32,
    minute: u32,
}

impl AlarmTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Seconds and date are ignored.
    pub fn matches<T: Timelike>(&self, now: &T) -> bool {
        now.hour() == self.hour && now.minute() == self.minute
    }
}

impl FromStr for AlarmTime {
    type Err = WidgetError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || WidgetError::InvalidAlarmFormat(input.to_string());
        let bytes = input.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let hour = u32::from(digits[0] - b'0') * 10 + u32::from(digits[1] - b'0');
        let minute = u32::from(digits[2] - b'0') * 10 + u32::from(digits[3] - b'0');
        AlarmTime::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for AlarmTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Read view of the alarm: what is set and whether it already rang.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize)]
pub struct AlarmState {
    pub target_time: Option<AlarmTime>,
    pub has_fired: bool,
}

impl AlarmState {
    pub fn status(&self) -> AlarmStatus {
        match (self.target_time, self.has_fired) {
            (None, _) => AlarmStatus::Unset,
            (Some(_), false) => AlarmStatus::Armed,
            (Some(_), true) => AlarmStatus::Ringing,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmStatus {
    Unset,
    Armed,
    Ringing,
}

/// Emitted once when an armed alarm reaches its minute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmEvent {
    pub target: AlarmTime,
    pub fired_at: DateTime<Local>,
    pub message: String,
}
