use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::WidgetError;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Light,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Default, Theme::Dark, Theme::Light];

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Default => "Default",
            Theme::Dark => "Dark",
            Theme::Light => "Light",
        }
    }
}

impl FromStr for Theme {
    type Err = WidgetError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WidgetError::UnknownTheme(input.to_string()))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize)]
pub struct ThemeState {
    pub current_theme: Theme,
}

/// Holds the active theme; unknown names are refused and the last valid
/// theme stays in place.
#[derive(Debug, Default)]
pub struct ThemeSelector {
    state: ThemeState,
}

impl ThemeSelector {
    pub fn new(initial: Theme) -> Self {
        Self {
            state: ThemeState {
                current_theme: initial,
            },
        }
    }

    pub fn set_theme(&mut self, name: &str) -> Result<Theme, WidgetError> {
        let theme = name.parse::<Theme>().inspect_err(|_| {
            tracing::warn!(name, current = %self.state.current_theme, "unknown theme refused");
        })?;
        self.state.current_theme = theme;
        Ok(theme)
    }

    pub fn current(&self) -> Theme {
        self.state.current_theme
    }

    pub fn state(&self) -> ThemeState {
        self.state
    }
}
