use std::time::{Duration, Instant};

use anyhow::Result;

use crate::time_provider::SelectedTimeProvider;

/// Counters the scheduler keeps about its own punctuality.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TickStats {
    clock_ticks: u64,
    stopwatch_refreshes: u64,
    missed_ticks: u64,
    late_polls: u64,
}

impl TickStats {
    pub fn record_tick(&mut self, missed: u64) {
        self.clock_ticks += 1;
        self.record_missed(missed);
    }

    pub fn record_refresh(&mut self, missed: u64) {
        self.stopwatch_refreshes += 1;
        self.record_missed(missed);
    }

    fn record_missed(&mut self, missed: u64) {
        if missed > 0 {
            self.late_polls += 1;
            self.missed_ticks = self.missed_ticks.saturating_add(missed);
        }
    }

    pub fn clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    pub fn stopwatch_refreshes(&self) -> u64 {
        self.stopwatch_refreshes
    }

    pub fn missed_ticks(&self) -> u64 {
        self.missed_ticks
    }

    pub fn late_polls(&self) -> u64 {
        self.late_polls
    }
}

pub fn run_diagnostics(selected: &SelectedTimeProvider, tick_period: Duration) -> Result<()> {
    println!("AnalogWatch diagnostics");
    println!("Selected timing source: {}", selected.label);
    println!("Realtime clock: {}", selected.provider.is_realtime());
    let first = selected.provider.now()?;
    println!("Local time: {}", first.to_local_datetime()?.to_rfc3339());

    if !selected.provider.is_realtime() {
        println!("Pacing benchmark skipped for simulated time");
        return Ok(());
    }

    println!("Running 10 tick pacing benchmark...");
    let period_ms = u64::try_from(tick_period.as_millis()).unwrap_or(u64::MAX);
    let bench_start = Instant::now();
    let mut worst_late = Duration::ZERO;
    let mut worst_drift_ms = 0u64;
    let mut previous = first.monotonic_ms;
    for tick in 1..=10u32 {
        let deadline = bench_start + tick_period * tick;
        sleep_until(deadline);
        worst_late = worst_late.max(Instant::now().saturating_duration_since(deadline));
        let sample = selected.provider.now()?;
        let step_ms = sample.monotonic_ms.saturating_sub(previous);
        worst_drift_ms = worst_drift_ms.max(step_ms.abs_diff(period_ms));
        previous = sample.monotonic_ms;
    }

    println!("Benchmark summary:");
    println!(
        "  Monotonic elapsed: {} ms",
        previous.saturating_sub(first.monotonic_ms)
    );
    println!("  Worst wake-up lateness: {:.3} ms", worst_late.as_secs_f64() * 1_000.0);
    println!("  Worst per-tick drift: {worst_drift_ms} ms");
    Ok(())
}

/// Blocks until `deadline`: one coarse sleep, then yields through the last
/// `SPIN_WINDOW` so the wake-up lands close to the deadline.
pub fn sleep_until(deadline: Instant) {
    const SPIN_WINDOW: Duration = Duration::from_micros(500);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        if remaining > SPIN_WINDOW {
            std::thread::sleep(remaining - SPIN_WINDOW);
        } else {
            std::thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_separate_ticks_from_refreshes() {
        let mut stats = TickStats::default();
        stats.record_tick(0);
        stats.record_tick(3);
        stats.record_refresh(0);
        assert_eq!(stats.clock_ticks(), 2);
        assert_eq!(stats.stopwatch_refreshes(), 1);
        assert_eq!(stats.missed_ticks(), 3);
        assert_eq!(stats.late_polls(), 1);
    }

    #[test]
    fn sleep_until_waits_for_deadline() {
        let deadline = Instant::now() + Duration::from_millis(5);
        sleep_until(deadline);
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn sleep_until_returns_immediately_for_past_deadline() {
        let start = Instant::now();
        sleep_until(start);
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
