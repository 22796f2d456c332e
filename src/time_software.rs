use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};

use crate::time_provider::{TimeProvider, TimeSample};

/// Reads wall time from the system clock and measures durations on an
/// `Instant` anchored when the provider is created.
pub struct SoftwareTimeProvider {
    monotonic_anchor: Instant,
    last_monotonic_ms: Mutex<u64>,
}

impl SoftwareTimeProvider {
    pub fn new() -> Result<Self> {
        // Fail early on a clock set before the epoch rather than on first tick.
        system_time_to_parts(SystemTime::now())?;
        Ok(Self {
            monotonic_anchor: Instant::now(),
            last_monotonic_ms: Mutex::new(0),
        })
    }

    fn clamp_monotonic(&self, proposed_ms: u64) -> Result<u64> {
        let mut guard = self
            .last_monotonic_ms
            .lock()
            .map_err(|_| anyhow!("failed to lock software time monotonic state"))?;
        if proposed_ms < *guard {
            return Ok(*guard);
        }
        *guard = proposed_ms;
        Ok(proposed_ms)
    }
}

impl TimeProvider for SoftwareTimeProvider {
    fn now(&self) -> Result<TimeSample> {
        let (unix_seconds, nanos) = system_time_to_parts(SystemTime::now())?;
        let elapsed_ms =
            u64::try_from(self.monotonic_anchor.elapsed().as_millis()).unwrap_or(u64::MAX);
        let monotonic_ms = self.clamp_monotonic(elapsed_ms)?;
        Ok(TimeSample {
            unix_seconds,
            nanos,
            monotonic_ms,
            source: "SYSTEM_CLOCK",
        })
    }

    fn is_realtime(&self) -> bool {
        true
    }
}

fn system_time_to_parts(system_time: SystemTime) -> Result<(i64, u32)> {
    let duration = system_time
        .duration_since(UNIX_EPOCH)
        .context("system clock is before UNIX_EPOCH")?;
    let seconds = i64::try_from(duration.as_secs()).context("system clock out of range")?;
    Ok((seconds, duration.subsec_nanos()))
}
