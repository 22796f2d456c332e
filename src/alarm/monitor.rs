use chrono::{DateTime, Local};

use crate::alarm::model::{ALARM_RINGING_MESSAGE, AlarmEvent, AlarmState, AlarmTime};
use crate::error::WidgetError;

pub const DEFAULT_ALARM_COOLDOWN_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq)]
enum AlarmPhase {
    Unset,
    Armed {
        target: AlarmTime,
    },
    Fired {
        target: AlarmTime,
        fired_at: DateTime<Local>,
    },
}

/// Polls the wall clock once per tick and rings a single alarm.
///
/// An armed alarm fires on the first evaluation inside its minute and moves
/// to `Fired`; nothing fires from `Fired`, so repeated evaluations inside the
/// same minute (or the cool-down after it) stay silent. Once the cool-down has
/// elapsed the next evaluation clears the alarm entirely, which is what allows
/// the same time to be set again later. There is no daily recurrence.
pub struct AlarmMonitor {
    phase: AlarmPhase,
    cooldown: chrono::Duration,
}

impl AlarmMonitor {
    pub fn new(cooldown_ms: u64) -> Self {
        let cooldown_ms = i64::try_from(cooldown_ms).unwrap_or(i64::MAX);
        Self {
            phase: AlarmPhase::Unset,
            cooldown: chrono::Duration::milliseconds(cooldown_ms),
        }
    }

    /// Arms `target`, superseding any pending or ringing alarm. Malformed
    /// input leaves the current alarm untouched.
    pub fn set_alarm(&mut self, target: &str) -> Result<AlarmTime, WidgetError> {
        let target = target.parse::<AlarmTime>()?;
        if let AlarmPhase::Armed { target: previous } | AlarmPhase::Fired { target: previous, .. } =
            &self.phase
        {
            tracing::debug!(%previous, %target, "alarm superseded");
        }
        self.phase = AlarmPhase::Armed { target };
        tracing::info!(%target, "alarm armed");
        Ok(target)
    }

    /// Drops the alarm, returning the target that was set.
    pub fn clear(&mut self) -> Option<AlarmTime> {
        let previous = self.target();
        self.phase = AlarmPhase::Unset;
        previous
    }

    pub fn evaluate(&mut self, now: DateTime<Local>) -> Option<AlarmEvent> {
        match self.phase.clone() {
            AlarmPhase::Unset => None,
            AlarmPhase::Armed { target } => {
                if !target.matches(&now) {
                    return None;
                }
                self.phase = AlarmPhase::Fired {
                    target,
                    fired_at: now,
                };
                tracing::info!(%target, "alarm ringing");
                Some(AlarmEvent {
                    target,
                    fired_at: now,
                    message: ALARM_RINGING_MESSAGE.to_string(),
                })
            }
            AlarmPhase::Fired { target, fired_at } => {
                if now < fired_at {
                    // Wall clock stepped back; count the cool-down from here.
                    self.phase = AlarmPhase::Fired {
                        target,
                        fired_at: now,
                    };
                } else if now.signed_duration_since(fired_at) >= self.cooldown {
                    self.phase = AlarmPhase::Unset;
                    tracing::debug!(%target, "alarm cleared after cool-down");
                }
                None
            }
        }
    }

    pub fn state(&self) -> AlarmState {
        match self.phase {
            AlarmPhase::Unset => AlarmState::default(),
            AlarmPhase::Armed { target } => AlarmState {
                target_time: Some(target),
                has_fired: false,
            },
            AlarmPhase::Fired { target, .. } => AlarmState {
                target_time: Some(target),
                has_fired: true,
            },
        }
    }

    pub fn target(&self) -> Option<AlarmTime> {
        self.state().target_time
    }
}

impl Default for AlarmMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_ALARM_COOLDOWN_MS)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::alarm::model::AlarmStatus;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 2, 7, h, m, s)
            .single()
            .expect("valid local time")
    }

    #[test]
    fn starts_empty() {
        let monitor = AlarmMonitor::default();
        assert_eq!(monitor.state(), AlarmState::default());
        assert_eq!(monitor.state().status(), AlarmStatus::Unset);
    }

    #[test]
    fn fires_once_within_the_target_minute() {
        let mut monitor = AlarmMonitor::default();
        monitor.set_alarm("07:30").expect("valid");

        assert!(monitor.evaluate(at(7, 29, 0)).is_none());
        assert!(monitor.evaluate(at(7, 29, 59)).is_none());

        let mut fired = 0;
        for second in 0..60 {
            if let Some(event) = monitor.evaluate(at(7, 30, second)) {
                fired += 1;
                assert_eq!(event.target.to_string(), "07:30");
                assert_eq!(event.fired_at, at(7, 30, 0));
                assert_eq!(event.message, ALARM_RINGING_MESSAGE);
            }
        }
        assert_eq!(fired, 1);
        assert!(monitor.evaluate(at(7, 31, 0)).is_none());
        assert_eq!(monitor.state().status(), AlarmStatus::Ringing);
    }

    #[test]
    fn fires_at_any_second_of_the_minute() {
        let mut monitor = AlarmMonitor::default();
        monitor.set_alarm("07:30").expect("valid");
        let event = monitor.evaluate(at(7, 30, 42)).expect("fires mid-minute");
        assert_eq!(event.fired_at, at(7, 30, 42));
    }

    #[test]
    fn clears_after_cooldown() {
        let mut monitor = AlarmMonitor::default();
        monitor.set_alarm("07:30").expect("valid");
        monitor.evaluate(at(7, 30, 5)).expect("fires");
        assert!(monitor.state().has_fired);

        assert!(monitor.evaluate(at(7, 31, 4)).is_none());
        let target = monitor.state().target_time.map(|t| t.to_string());
        assert_eq!(target.as_deref(), Some("07:30"));

        assert!(monitor.evaluate(at(7, 31, 5)).is_none());
        assert_eq!(monitor.state(), AlarmState::default());
        assert_eq!(monitor.state().status(), AlarmStatus::Unset);
    }

    #[test]
    fn same_time_can_be_set_again_after_clearing() {
        let mut monitor = AlarmMonitor::new(1_000);
        monitor.set_alarm("07:30").expect("valid");
        monitor.evaluate(at(7, 30, 0)).expect("fires");
        assert!(monitor.evaluate(at(7, 30, 1)).is_none());
        assert_eq!(monitor.state().status(), AlarmStatus::Unset);

        // Still inside the minute but nothing is armed any more.
        assert!(monitor.evaluate(at(7, 30, 2)).is_none());

        monitor.set_alarm("07:30").expect("valid");
        assert!(monitor.evaluate(at(7, 30, 3)).is_some());
    }

    #[test]
    fn malformed_input_leaves_state_unchanged() {
        let mut monitor = AlarmMonitor::default();
        monitor.set_alarm("06:45").expect("valid");
        let before = monitor.state();

        let err = monitor.set_alarm("bad").expect_err("malformed");
        assert_eq!(err, WidgetError::InvalidAlarmFormat("bad".to_string()));
        assert_eq!(monitor.state(), before);

        monitor.evaluate(at(6, 45, 0)).expect("fires");
        let fired = monitor.state();
        assert!(monitor.set_alarm("25:00").is_err());
        assert_eq!(monitor.state(), fired);
    }

    #[test]
    fn new_alarm_supersedes_a_ringing_one() {
        let mut monitor = AlarmMonitor::default();
        monitor.set_alarm("07:30").expect("valid");
        monitor.evaluate(at(7, 30, 0)).expect("fires");

        monitor.set_alarm("07:30").expect("valid");
        assert_eq!(
            monitor.state(),
            AlarmState {
                target_time: Some("07:30".parse().expect("valid")),
                has_fired: false,
            }
        );
        assert!(monitor.evaluate(at(7, 30, 10)).is_some());
    }

    #[test]
    fn backwards_clock_step_restarts_cooldown() {
        let mut monitor = AlarmMonitor::default();
        monitor.set_alarm("07:30").expect("valid");
        monitor.evaluate(at(7, 30, 30)).expect("fires");

        assert!(monitor.evaluate(at(7, 30, 0)).is_none());
        assert!(monitor.evaluate(at(7, 30, 59)).is_none());
        assert!(monitor.state().has_fired);
        assert!(monitor.evaluate(at(7, 31, 0)).is_none());
        assert_eq!(monitor.state().status(), AlarmStatus::Unset);
    }

    #[test]
    fn ignores_the_date() {
        let mut monitor = AlarmMonitor::default();
        monitor.set_alarm("07:30").expect("valid");
        let next_day = at(7, 30, 0) + chrono::Duration::days(1);
        assert!(monitor.evaluate(next_day).is_some());
    }

    #[test]
    fn clear_drops_pending_alarm() {
        let mut monitor = AlarmMonitor::default();
        monitor.set_alarm("07:30").expect("valid");
        assert_eq!(monitor.clear().map(|t| t.to_string()), Some("07:30".to_string()));
        assert!(monitor.evaluate(at(7, 30, 0)).is_none());
        assert_eq!(monitor.clear(), None);
    }
}
