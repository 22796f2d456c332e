use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::time_manual::ManualTimeProvider;
use crate::time_software::SoftwareTimeProvider;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimingSourceKind {
    System,
    Simulated,
}

/// One reading of the host clock.
///
/// `unix_seconds`/`nanos` are wall-clock time and may jump when the system clock
/// is adjusted. `monotonic_ms` counts milliseconds since the provider was
/// created and never goes backwards; durations are always measured on it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimeSample {
    pub unix_seconds: i64,
    pub nanos: u32,
    pub monotonic_ms: u64,
    pub source: &'static str,
}

impl TimeSample {
    pub fn to_local_datetime(&self) -> Result<DateTime<Local>> {
        Local
            .timestamp_opt(self.unix_seconds, self.nanos)
            .single()
            .ok_or_else(|| anyhow!("failed to convert sample into local datetime"))
    }
}

pub trait TimeProvider: Send + Sync {
    fn now(&self) -> Result<TimeSample>;
    /// Whether samples follow the real clock (false for simulated time).
    fn is_realtime(&self) -> bool;
}

pub struct SelectedTimeProvider {
    pub provider: Box<dyn TimeProvider>,
    pub label: &'static str,
    /// Present for simulated sources so the host can step time forward.
    pub manual: Option<ManualTimeProvider>,
}

pub fn select_provider(
    kind: TimingSourceKind,
    start_at: Option<NaiveDateTime>,
) -> Result<SelectedTimeProvider> {
    match kind {
        TimingSourceKind::System => {
            if start_at.is_some() {
                tracing::warn!("--start-at is ignored by the system timing source");
            }
            Ok(SelectedTimeProvider {
                provider: Box::new(SoftwareTimeProvider::new()?),
                label: "SYSTEM_CLOCK",
                manual: None,
            })
        }
        TimingSourceKind::Simulated => {
            let start = start_at
                .ok_or_else(|| anyhow!("simulated timing source requires --start-at"))?;
            let start_local = resolve_local_datetime(start)?;
            let manual = ManualTimeProvider::starting_at(start_local);
            Ok(SelectedTimeProvider {
                provider: Box::new(manual.clone()),
                label: "SIMULATED",
                manual: Some(manual),
            })
        }
    }
}

/// Resolves a naive local datetime, taking the earlier instant when the wall
/// time is ambiguous and failing when it does not exist (DST gap).
pub fn resolve_local_datetime(naive: NaiveDateTime) -> Result<DateTime<Local>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| anyhow!("local time {naive} does not exist in this time zone"))
}

pub fn parse_start_at(input: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M"))
        .map_err(|_| anyhow!("invalid start time '{input}', expected ISO local datetime"))
}
