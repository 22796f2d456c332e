use thiserror::Error;

/// Failures raised by the widget core.
///
/// Everything except [`WidgetError::MissingRenderTarget`] is a recoverable
/// misuse: the action is refused, state is left as it was, and the host is
/// expected to surface the message through the notification slot.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum WidgetError {
    #[error("invalid alarm time '{0}', expected HH:MM")]
    InvalidAlarmFormat(String),

    #[error("stopwatch is already running")]
    AlreadyRunning,

    #[error("stopwatch is not running")]
    NotRunning,

    #[error("stop the stopwatch before resetting it")]
    CannotResetWhileRunning,

    #[error("unknown theme '{0}', expected one of default, dark, light")]
    UnknownTheme(String),

    #[error("render target is missing; the widget cannot attach")]
    MissingRenderTarget,

    #[error("widget has been destroyed")]
    Destroyed,
}

impl WidgetError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, WidgetError::MissingRenderTarget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_render_target_is_fatal() {
        assert!(WidgetError::MissingRenderTarget.is_fatal());
        assert!(!WidgetError::AlreadyRunning.is_fatal());
        assert!(!WidgetError::UnknownTheme("neon".to_string()).is_fatal());
        assert!(!WidgetError::InvalidAlarmFormat("bad".to_string()).is_fatal());
    }

    #[test]
    fn messages_name_the_rejected_input() {
        let err = WidgetError::InvalidAlarmFormat("7:3".to_string());
        assert!(err.to_string().contains("'7:3'"));
        let err = WidgetError::UnknownTheme("neon".to_string());
        assert!(err.to_string().contains("'neon'"));
    }
}
