use anyhow::Result;
use serde::Serialize;

use crate::alarm::model::{AlarmEvent, AlarmState, AlarmTime};
use crate::alarm::monitor::AlarmMonitor;
use crate::clock::{ClockSnapshot, TimeDisplayMode, compute_snapshot};
use crate::config::WidgetConfig;
use crate::diagnostics::TickStats;
use crate::error::WidgetError;
use crate::notification::{Notification, NotificationBus, NotificationHandle, Severity};
use crate::scheduler::TickScheduler;
use crate::stopwatch::{StopwatchController, StopwatchDisplay, StopwatchState};
use crate::theme::{Theme, ThemeSelector, ThemeState};
use crate::time_provider::TimeSample;

/// Where the widget's render-facing state ends up.
pub trait RenderSurface {
    /// False when the host has nothing to draw into yet.
    fn is_attached(&self) -> bool;
    fn present(&mut self, update: &WidgetUpdate) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetUpdate {
    Clock(ClockSnapshot),
    Alarm(AlarmEvent),
    AlarmState(AlarmState),
    Stopwatch(StopwatchDisplay),
    Theme(ThemeState),
    Weather { text: String },
    NotificationPosted(Notification),
    NotificationExpired { id: NotificationHandle },
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct TickReport {
    pub clock_ticked: bool,
    pub stopwatch_refreshed: bool,
    pub alarm_fired: bool,
    pub missed_ticks: u64,
    pub render_failures: u64,
}

/// One mounted widget instance. Owns every piece of widget state; all
/// mutation goes through the `on_*` methods, which mirror the host contract.
pub struct WatchWidget<S: RenderSurface> {
    surface: S,
    time_format: TimeDisplayMode,
    weather_text: String,
    alarm: AlarmMonitor,
    stopwatch: StopwatchController,
    theme: ThemeSelector,
    notifications: NotificationBus,
    scheduler: TickScheduler,
    render_failures: u64,
    destroyed: bool,
}

impl<S: RenderSurface> WatchWidget<S> {
    /// Attaches to `surface` and renders the initial state.
    pub fn mount(surface: S, config: &WidgetConfig, now: &TimeSample) -> Result<Self, WidgetError> {
        if !surface.is_attached() {
            tracing::error!("widget mount refused: render surface is not attached");
            return Err(WidgetError::MissingRenderTarget);
        }

        let mut widget = Self {
            surface,
            time_format: config.time_format,
            weather_text: config.weather_text.clone(),
            alarm: AlarmMonitor::new(config.alarm_cooldown_ms),
            stopwatch: StopwatchController::new(),
            theme: ThemeSelector::new(config.theme),
            notifications: NotificationBus::new(config.notification_duration_ms),
            scheduler: TickScheduler::new(config.tick_period_ms, config.stopwatch_refresh_ms),
            render_failures: 0,
            destroyed: false,
        };

        widget.scheduler.start_clock(now.monotonic_ms);
        widget.render_clock(now);
        widget.present(WidgetUpdate::Stopwatch(widget.stopwatch.display(now.monotonic_ms)));
        widget.present(WidgetUpdate::Theme(widget.theme.state()));
        widget.present(WidgetUpdate::Weather {
            text: widget.weather_text.clone(),
        });
        if let Some(target) = config.alarm {
            // Already validated by the config parser.
            widget.on_set_alarm(&target.to_string(), now)?;
        }
        tracing::info!(source = now.source, theme = %widget.theme.current(), "widget mounted");
        Ok(widget)
    }

    pub fn on_tick(&mut self, now: &TimeSample) -> TickReport {
        if self.destroyed {
            tracing::debug!("tick after teardown ignored");
            return TickReport::default();
        }

        let failures_before = self.render_failures;
        let mut report = TickReport::default();
        let due = self.scheduler.poll(now.monotonic_ms);
        report.missed_ticks = due.missed;

        if due.clock {
            report.clock_ticked = true;
            report.alarm_fired = self.render_clock(now).is_some_and(|local| self.check_alarm(local, now));
        }
        if due.stopwatch {
            report.stopwatch_refreshed = true;
            self.present(WidgetUpdate::Stopwatch(self.stopwatch.display(now.monotonic_ms)));
        }
        if let Some(id) = self.notifications.expire(now.monotonic_ms) {
            self.present(WidgetUpdate::NotificationExpired { id });
        }

        report.render_failures = self.render_failures - failures_before;
        report
    }

    /// Host-requested redraw of the clock face outside the tick cadence.
    pub fn on_update_view(&mut self, now: &TimeSample) {
        if self.destroyed {
            return;
        }
        self.render_clock(now);
    }

    pub fn on_set_alarm(&mut self, target: &str, now: &TimeSample) -> Result<AlarmTime, WidgetError> {
        self.ensure_live()?;
        match self.alarm.set_alarm(target) {
            Ok(target) => {
                self.present(WidgetUpdate::AlarmState(self.alarm.state()));
                self.notify(format!("⏰ Alarm set for {target}"), Severity::Info, now);
                Ok(target)
            }
            Err(err) => Err(self.refuse(err, now)),
        }
    }

    pub fn on_clear_alarm(&mut self, now: &TimeSample) -> Result<Option<AlarmTime>, WidgetError> {
        self.ensure_live()?;
        let cleared = self.alarm.clear();
        self.present(WidgetUpdate::AlarmState(self.alarm.state()));
        if let Some(target) = cleared {
            self.notify(format!("🔕 Alarm for {target} cleared"), Severity::Info, now);
        }
        Ok(cleared)
    }

    pub fn on_start_stopwatch(&mut self, now: &TimeSample) -> Result<(), WidgetError> {
        self.ensure_live()?;
        if let Err(err) = self.stopwatch.start(now.monotonic_ms) {
            return Err(self.refuse(err, now));
        }
        self.scheduler.start_stopwatch_refresh(now.monotonic_ms);
        self.present(WidgetUpdate::Stopwatch(self.stopwatch.display(now.monotonic_ms)));
        self.notify("⏱ Stopwatch started!", Severity::Info, now);
        Ok(())
    }

    pub fn on_stop_stopwatch(&mut self, now: &TimeSample) -> Result<(), WidgetError> {
        self.ensure_live()?;
        if let Err(err) = self.stopwatch.stop(now.monotonic_ms) {
            return Err(self.refuse(err, now));
        }
        self.scheduler.stop_stopwatch_refresh();
        self.present(WidgetUpdate::Stopwatch(self.stopwatch.display(now.monotonic_ms)));
        self.notify("⏹ Stopwatch stopped!", Severity::Info, now);
        Ok(())
    }

    pub fn on_reset_stopwatch(&mut self, now: &TimeSample) -> Result<(), WidgetError> {
        self.ensure_live()?;
        if let Err(err) = self.stopwatch.reset() {
            return Err(self.refuse(err, now));
        }
        self.present(WidgetUpdate::Stopwatch(self.stopwatch.display(now.monotonic_ms)));
        self.notify("🔄 Stopwatch reset!", Severity::Info, now);
        Ok(())
    }

    pub fn on_select_theme(&mut self, name: &str, now: &TimeSample) -> Result<Theme, WidgetError> {
        self.ensure_live()?;
        match self.theme.set_theme(name) {
            Ok(theme) => {
                self.present(WidgetUpdate::Theme(self.theme.state()));
                self.notify(format!("🎨 Theme changed to {theme}"), Severity::Info, now);
                Ok(theme)
            }
            Err(err) => {
                let message = format!("⚠ {err}; keeping {}", self.theme.current());
                self.notify(message, Severity::Error, now);
                Err(err)
            }
        }
    }

    /// Cancels every schedule. Later ticks are ignored and actions refused.
    pub fn on_destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.scheduler.cancel_all();
        self.notifications.clear();
        self.destroyed = true;
        tracing::info!(
            clock_ticks = self.scheduler.stats().clock_ticks(),
            render_failures = self.render_failures,
            "widget destroyed"
        );
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Hands the surface back to the host, typically after `on_destroy`.
    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.alarm.state()
    }

    pub fn stopwatch_state(&self) -> StopwatchState {
        self.stopwatch.state()
    }

    pub fn stopwatch_display(&self, now_ms: u64) -> StopwatchDisplay {
        self.stopwatch.display(now_ms)
    }

    pub fn theme(&self) -> Theme {
        self.theme.current()
    }

    pub fn weather_text(&self) -> &str {
        &self.weather_text
    }

    pub fn current_notification(&self, now_ms: u64) -> Option<&Notification> {
        self.notifications.current(now_ms)
    }

    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.scheduler.next_deadline_ms()
    }

    pub fn tick_stats(&self) -> &TickStats {
        self.scheduler.stats()
    }

    pub fn render_failures(&self) -> u64 {
        self.render_failures
    }

    fn ensure_live(&self) -> Result<(), WidgetError> {
        if self.destroyed {
            return Err(WidgetError::Destroyed);
        }
        Ok(())
    }

    /// Renders a fresh snapshot and returns the local time it was built from.
    fn render_clock(&mut self, now: &TimeSample) -> Option<chrono::DateTime<chrono::Local>> {
        match now.to_local_datetime() {
            Ok(local) => {
                self.present(WidgetUpdate::Clock(compute_snapshot(&local, self.time_format)));
                Some(local)
            }
            Err(err) => {
                tracing::error!(error = %err, "clock tick skipped: unusable time sample");
                self.render_failures += 1;
                None
            }
        }
    }

    fn check_alarm(&mut self, local: chrono::DateTime<chrono::Local>, now: &TimeSample) -> bool {
        let before = self.alarm.state();
        match self.alarm.evaluate(local) {
            Some(event) => {
                let message = event.message.clone();
                self.present(WidgetUpdate::Alarm(event));
                self.present(WidgetUpdate::AlarmState(self.alarm.state()));
                self.notify(message, Severity::Info, now);
                true
            }
            None => {
                let after = self.alarm.state();
                if after != before {
                    self.present(WidgetUpdate::AlarmState(after));
                }
                false
            }
        }
    }

    fn refuse(&mut self, err: WidgetError, now: &TimeSample) -> WidgetError {
        tracing::warn!(error = %err, "widget action refused");
        self.notify(format!("⚠ {err}"), Severity::Error, now);
        err
    }

    fn notify(&mut self, message: impl Into<String>, severity: Severity, now: &TimeSample) {
        let posted = self
            .notifications
            .post(message, severity, now.monotonic_ms)
            .clone();
        self.present(WidgetUpdate::NotificationPosted(posted));
    }

    fn present(&mut self, update: WidgetUpdate) {
        if let Err(err) = self.surface.present(&update) {
            self.render_failures += 1;
            tracing::error!(error = %err, "render surface rejected update");
        }
    }
}
