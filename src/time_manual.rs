use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local};

use crate::time_provider::{TimeProvider, TimeSample};

/// A clock that only moves when told to.
///
/// Clones share the same state, so a host can hand one clone to the widget
/// loop and keep another to step time. Wall time and the monotonic timeline
/// advance together through [`ManualTimeProvider::advance`];
/// [`ManualTimeProvider::set_wall_clock`] jumps wall time alone, the way a
/// system clock adjustment would.
#[derive(Debug, Clone)]
pub struct ManualTimeProvider {
    state: Arc<Mutex<ManualState>>,
}

#[derive(Debug)]
struct ManualState {
    wall: DateTime<Local>,
    monotonic_ms: u64,
}

impl ManualTimeProvider {
    pub fn starting_at(wall: DateTime<Local>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                wall,
                monotonic_ms: 0,
            })),
        }
    }

    pub fn advance(&self, step: Duration) -> Result<()> {
        let mut state = self.lock()?;
        advance_state(&mut state, step);
        Ok(())
    }

    pub fn set_wall_clock(&self, wall: DateTime<Local>) -> Result<()> {
        let mut state = self.lock()?;
        state.wall = wall;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ManualState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("failed to lock manual time state"))
    }
}

impl TimeProvider for ManualTimeProvider {
    fn now(&self) -> Result<TimeSample> {
        let mut state = self.lock()?;
        let sample = TimeSample {
            unix_seconds: state.wall.timestamp(),
            nanos: state.wall.timestamp_subsec_nanos(),
            monotonic_ms: state.monotonic_ms,
            source: "SIMULATED",
        };
        Ok(sample)
    }

    fn is_realtime(&self) -> bool {
        false
    }
}

fn advance_state(state: &mut ManualState, step: Duration) {
    let step_ms = u64::try_from(step.as_millis()).unwrap_or(u64::MAX);
    state.monotonic_ms = state.monotonic_ms.saturating_add(step_ms);
    if let Ok(delta) = chrono::Duration::from_std(step) {
        state.wall = state.wall + delta;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;

    fn start() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 2, 7, 7, 29, 0)
            .single()
            .expect("valid local time")
    }

    #[test]
    fn advance_moves_wall_and_monotonic_together() {
        let clock = ManualTimeProvider::starting_at(start());
        clock.advance(Duration::from_secs(61)).expect("advance");
        let sample = clock.now().expect("sample");
        let local = sample.to_local_datetime().expect("local");
        assert_eq!((local.minute(), local.second()), (30, 1));
        assert_eq!(sample.monotonic_ms, 61_000);
    }

    #[test]
    fn wall_clock_jump_leaves_monotonic_timeline_alone() {
        let clock = ManualTimeProvider::starting_at(start());
        clock.advance(Duration::from_secs(5)).expect("advance");
        clock
            .set_wall_clock(start() - chrono::Duration::hours(3))
            .expect("jump");
        let sample = clock.now().expect("sample");
        assert_eq!(sample.monotonic_ms, 5_000);
        assert_eq!(sample.to_local_datetime().expect("local").hour(), 4);
    }

    #[test]
    fn clones_share_state() {
        let clock = ManualTimeProvider::starting_at(start());
        let handle = clock.clone();
        handle.advance(Duration::from_millis(1_500)).expect("advance");
        assert_eq!(clock.now().expect("sample").monotonic_ms, 1_500);
    }
}
