use crate::diagnostics::TickStats;

pub const DEFAULT_TICK_PERIOD_MS: u64 = 1_000;
pub const DEFAULT_STOPWATCH_REFRESH_MS: u64 = 1_000;
/// Longest allowed period for either schedule. A slower clock tick could step
/// over an alarm minute; a slower stopwatch refresh would lag the display.
pub const MAX_PERIOD_MS: u64 = 1_000;

/// One fixed-period deadline on the monotonic timeline.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Schedule {
    period_ms: u64,
    next_due_ms: Option<u64>,
}

impl Schedule {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            next_due_ms: None,
        }
    }

    /// First tick is due one period after `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.period_ms));
    }

    pub fn cancel(&mut self) {
        self.next_due_ms = None;
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    /// Returns `Some(missed)` when a tick is due. Deadlines move forward in
    /// whole periods from the start anchor, so late polls do not shift the
    /// cadence; every period that passed without a poll beyond the first is
    /// reported in `missed`.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        let due = self.next_due_ms?;
        if now_ms < due {
            return None;
        }
        let behind = (now_ms - due) / self.period_ms;
        let next = due.saturating_add((behind + 1).saturating_mul(self.period_ms));
        self.next_due_ms = Some(next);
        Some(behind)
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct DueTicks {
    pub clock: bool,
    pub stopwatch: bool,
    pub missed: u64,
}

/// Cooperative, single-threaded driver for the widget's periodic work.
///
/// The clock tick runs for the widget's whole lifetime; the stopwatch refresh
/// only while the stopwatch is running. Hosts call [`TickScheduler::poll`]
/// from their own loop and sleep until [`TickScheduler::next_deadline_ms`].
#[derive(Debug)]
pub struct TickScheduler {
    clock: Schedule,
    stopwatch: Schedule,
    stats: TickStats,
}

impl TickScheduler {
    pub fn new(tick_period_ms: u64, stopwatch_refresh_ms: u64) -> Self {
        Self {
            clock: Schedule::new(cap_period("tick_period_ms", tick_period_ms)),
            stopwatch: Schedule::new(cap_period("stopwatch_refresh_ms", stopwatch_refresh_ms)),
            stats: TickStats::default(),
        }
    }

    pub fn start_clock(&mut self, now_ms: u64) {
        self.clock.start(now_ms);
    }

    pub fn start_stopwatch_refresh(&mut self, now_ms: u64) {
        self.stopwatch.start(now_ms);
    }

    pub fn stop_stopwatch_refresh(&mut self) {
        self.stopwatch.cancel();
    }

    pub fn cancel_all(&mut self) {
        self.clock.cancel();
        self.stopwatch.cancel();
    }

    pub fn poll(&mut self, now_ms: u64) -> DueTicks {
        let mut due = DueTicks::default();
        if let Some(missed) = self.clock.poll(now_ms) {
            due.clock = true;
            due.missed += missed;
            self.stats.record_tick(missed);
            if missed > 0 {
                tracing::warn!(missed, now_ms, "clock ticks were late and coalesced");
            }
        }
        if let Some(missed) = self.stopwatch.poll(now_ms) {
            due.stopwatch = true;
            due.missed += missed;
            self.stats.record_refresh(missed);
            if missed > 0 {
                tracing::warn!(missed, now_ms, "stopwatch refreshes were late and coalesced");
            }
        }
        due
    }

    /// Earliest pending deadline, if anything is scheduled.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        match (self.clock.next_due_ms(), self.stopwatch.next_due_ms()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }
}

fn cap_period(name: &'static str, period_ms: u64) -> u64 {
    if period_ms > MAX_PERIOD_MS {
        tracing::warn!(name, period_ms, max = MAX_PERIOD_MS, "schedule period capped");
        return MAX_PERIOD_MS;
    }
    period_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_is_due_one_period_after_start() {
        let mut schedule = Schedule::new(1_000);
        assert_eq!(schedule.poll(5_000), None);
        schedule.start(0);
        assert_eq!(schedule.poll(999), None);
        assert_eq!(schedule.poll(1_000), Some(0));
        assert_eq!(schedule.poll(1_500), None);
        assert_eq!(schedule.poll(2_000), Some(0));
    }

    #[test]
    fn late_polls_keep_the_original_cadence() {
        let mut schedule = Schedule::new(1_000);
        schedule.start(0);
        assert_eq!(schedule.poll(1_250), Some(0));
        assert_eq!(schedule.next_due_ms(), Some(2_000));
        assert_eq!(schedule.poll(2_010), Some(0));
        assert_eq!(schedule.next_due_ms(), Some(3_000));
    }

    #[test]
    fn backlog_is_coalesced_and_reported() {
        let mut schedule = Schedule::new(1_000);
        schedule.start(0);
        assert_eq!(schedule.poll(4_500), Some(3));
        assert_eq!(schedule.next_due_ms(), Some(5_000));
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut schedule = Schedule::new(0);
        schedule.start(10);
        assert_eq!(schedule.next_due_ms(), Some(11));
    }

    #[test]
    fn stopwatch_refresh_is_independent() {
        let mut scheduler = TickScheduler::new(1_000, 250);
        scheduler.start_clock(0);
        assert_eq!(scheduler.next_deadline_ms(), Some(1_000));

        scheduler.start_stopwatch_refresh(100);
        assert_eq!(scheduler.next_deadline_ms(), Some(350));

        let due = scheduler.poll(350);
        assert!(due.stopwatch && !due.clock);

        let due = scheduler.poll(1_000);
        assert!(due.clock && due.stopwatch);

        scheduler.stop_stopwatch_refresh();
        let due = scheduler.poll(1_100);
        assert_eq!(due, DueTicks::default());
        assert_eq!(scheduler.next_deadline_ms(), Some(2_000));
    }

    #[test]
    fn slow_periods_are_capped_at_one_second() {
        let mut scheduler = TickScheduler::new(120_000, 5_000);
        scheduler.start_clock(0);
        scheduler.start_stopwatch_refresh(0);
        assert_eq!(scheduler.next_deadline_ms(), Some(1_000));

        let due = scheduler.poll(1_000);
        assert!(due.clock && due.stopwatch);
    }

    #[test]
    fn cancel_all_stops_every_schedule() {
        let mut scheduler = TickScheduler::new(1_000, 1_000);
        scheduler.start_clock(0);
        scheduler.start_stopwatch_refresh(0);
        scheduler.cancel_all();
        assert_eq!(scheduler.next_deadline_ms(), None);
        assert_eq!(scheduler.poll(10_000), DueTicks::default());
    }

    #[test]
    fn stats_count_ticks_and_missed_periods() {
        let mut scheduler = TickScheduler::new(1_000, 1_000);
        scheduler.start_clock(0);
        scheduler.poll(1_000);
        let due = scheduler.poll(4_000);
        assert_eq!(due.missed, 2);
        assert_eq!(scheduler.stats().clock_ticks(), 2);
        assert_eq!(scheduler.stats().missed_ticks(), 2);
    }
}
