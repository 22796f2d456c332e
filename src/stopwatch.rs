use serde::Serialize;

use crate::error::WidgetError;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopwatchPhase {
    #[default]
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize)]
pub struct StopwatchState {
    pub phase: StopwatchPhase,
    pub accumulated_ms: u64,
    pub last_resume_ms: Option<u64>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct StopwatchDisplay {
    pub phase: StopwatchPhase,
    pub elapsed_ms: u64,
    pub text: String,
}

/// Start/stop/reset stopwatch measured on the monotonic millisecond timeline.
///
/// Each run segment is the difference between two timestamps, so the reading
/// never depends on how often the display was refreshed.
#[derive(Debug, Default)]
pub struct StopwatchController {
    state: StopwatchState,
}

impl StopwatchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: u64) -> Result<(), WidgetError> {
        if self.state.phase == StopwatchPhase::Running {
            return Err(WidgetError::AlreadyRunning);
        }
        self.state.phase = StopwatchPhase::Running;
        self.state.last_resume_ms = Some(now_ms);
        tracing::debug!(now_ms, accumulated_ms = self.state.accumulated_ms, "stopwatch started");
        Ok(())
    }

    pub fn stop(&mut self, now_ms: u64) -> Result<(), WidgetError> {
        let (StopwatchPhase::Running, Some(resumed_at)) =
            (self.state.phase, self.state.last_resume_ms)
        else {
            return Err(WidgetError::NotRunning);
        };
        self.state.accumulated_ms = self
            .state
            .accumulated_ms
            .saturating_add(now_ms.saturating_sub(resumed_at));
        self.state.phase = StopwatchPhase::Paused;
        self.state.last_resume_ms = None;
        tracing::debug!(now_ms, accumulated_ms = self.state.accumulated_ms, "stopwatch stopped");
        Ok(())
    }

    /// Refused while running so a live measurement is never thrown away.
    pub fn reset(&mut self) -> Result<(), WidgetError> {
        if self.state.phase == StopwatchPhase::Running {
            return Err(WidgetError::CannotResetWhileRunning);
        }
        self.state = StopwatchState::default();
        tracing::debug!("stopwatch reset");
        Ok(())
    }

    pub fn elapsed(&self, now_ms: u64) -> u64 {
        match (self.state.phase, self.state.last_resume_ms) {
            (StopwatchPhase::Running, Some(resumed_at)) => self
                .state
                .accumulated_ms
                .saturating_add(now_ms.saturating_sub(resumed_at)),
            _ => self.state.accumulated_ms,
        }
    }

    pub fn display(&self, now_ms: u64) -> StopwatchDisplay {
        let elapsed_ms = self.elapsed(now_ms);
        StopwatchDisplay {
            phase: self.state.phase,
            elapsed_ms,
            text: format_hms(elapsed_ms),
        }
    }

    pub fn state(&self) -> StopwatchState {
        self.state
    }
}

/// Formats milliseconds as `HH:MM:SS`; hours keep counting past 24.
pub fn format_hms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}
