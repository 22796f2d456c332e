pub mod alarm;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod notification;
pub mod scheduler;
pub mod stopwatch;
pub mod theme;
pub mod time_manual;
pub mod time_provider;
pub mod time_software;
pub mod ui;
pub mod widget;
