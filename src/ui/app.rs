use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use eframe::egui::{
    self, Align, Align2, Color32, FontId, Layout, Pos2, RichText, Stroke, TextEdit,
    TopBottomPanel, Ui, Vec2,
};

use crate::alarm::model::AlarmStatus;
use crate::clock::ClockSnapshot;
use crate::config::WidgetConfig;
use crate::error::WidgetError;
use crate::notification::Severity;
use crate::stopwatch::{StopwatchDisplay, StopwatchPhase};
use crate::theme::Theme;
use crate::time_provider::{SelectedTimeProvider, TimeSample};
use crate::widget::{RenderSurface, WatchWidget, WidgetUpdate};

type AppResult =
    std::result::Result<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>>;

pub fn run_gui(selected: SelectedTimeProvider, config: WidgetConfig) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("AnalogWatch")
            .with_inner_size([760.0, 560.0])
            .with_min_inner_size([520.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "AnalogWatch",
        native_options,
        Box::new(move |cc: &eframe::CreationContext<'_>| -> AppResult {
            apply_theme(&cc.egui_ctx, config.theme);
            let app = AnalogWatchApp::new(cc.egui_ctx.clone(), selected, &config)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow!("failed to launch AnalogWatch window: {err}"))?;

    Ok(())
}

fn apply_theme(ctx: &egui::Context, theme: Theme) {
    let visuals = match theme {
        Theme::Default => {
            let mut visuals = egui::Visuals::dark();
            visuals.override_text_color = Some(Color32::from_rgb(226, 234, 246));
            visuals.panel_fill = Color32::from_rgb(8, 16, 26);
            visuals.window_fill = Color32::from_rgb(12, 20, 32);
            visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(10, 18, 30);
            visuals.widgets.inactive.bg_fill = Color32::from_rgb(16, 24, 38);
            visuals.widgets.hovered.bg_fill = Color32::from_rgb(26, 42, 62);
            visuals.widgets.active.bg_fill = Color32::from_rgb(34, 60, 88);
            visuals.selection.bg_fill = Color32::from_rgb(43, 148, 178);
            visuals
        }
        Theme::Dark => egui::Visuals::dark(),
        Theme::Light => egui::Visuals::light(),
    };
    ctx.set_visuals(visuals);
}

struct FacePalette {
    face: Color32,
    rim: Color32,
    marker: Color32,
    hands: Color32,
    second: Color32,
}

impl FacePalette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Default => Self {
                face: Color32::from_rgb(16, 24, 38),
                rim: Color32::from_rgb(68, 98, 122),
                marker: Color32::from_rgb(150, 171, 191),
                hands: Color32::from_rgb(255, 204, 96),
                second: Color32::from_rgb(89, 204, 184),
            },
            Theme::Dark => Self {
                face: Color32::from_rgb(24, 24, 24),
                rim: Color32::from_gray(90),
                marker: Color32::from_gray(200),
                hands: Color32::from_gray(235),
                second: Color32::from_rgb(255, 106, 106),
            },
            Theme::Light => Self {
                face: Color32::from_rgb(250, 250, 246),
                rim: Color32::from_gray(60),
                marker: Color32::from_gray(40),
                hands: Color32::from_gray(20),
                second: Color32::from_rgb(200, 40, 40),
            },
        }
    }
}

/// What the window currently shows; filled in from widget updates.
#[derive(Default)]
struct FaceState {
    clock: Option<ClockSnapshot>,
    stopwatch: Option<StopwatchDisplay>,
    theme: Theme,
    weather: String,
}

struct EguiSurface {
    ctx: Option<egui::Context>,
    face: FaceState,
}

impl RenderSurface for EguiSurface {
    fn is_attached(&self) -> bool {
        self.ctx.is_some()
    }

    fn present(&mut self, update: &WidgetUpdate) -> Result<()> {
        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| anyhow!("egui context is gone"))?;
        match update {
            WidgetUpdate::Clock(snapshot) => self.face.clock = Some(snapshot.clone()),
            WidgetUpdate::Stopwatch(display) => self.face.stopwatch = Some(display.clone()),
            WidgetUpdate::Theme(state) => {
                self.face.theme = state.current_theme;
                apply_theme(ctx, state.current_theme);
            }
            WidgetUpdate::Weather { text } => self.face.weather = text.clone(),
            // Alarm status and the toast are read straight from the widget each frame.
            WidgetUpdate::Alarm(_)
            | WidgetUpdate::AlarmState(_)
            | WidgetUpdate::NotificationPosted(_)
            | WidgetUpdate::NotificationExpired { .. } => {}
        }
        ctx.request_repaint();
        Ok(())
    }
}

struct AnalogWatchApp {
    selected: SelectedTimeProvider,
    widget: WatchWidget<EguiSurface>,
    latest_sample: TimeSample,
    last_frame: Instant,
    alarm_input: String,
    theme_choice: Theme,
}

impl AnalogWatchApp {
    fn new(
        ctx: egui::Context,
        selected: SelectedTimeProvider,
        config: &WidgetConfig,
    ) -> Result<Self> {
        let surface = EguiSurface {
            ctx: Some(ctx),
            face: FaceState::default(),
        };
        let sample = selected.provider.now()?;
        let widget = WatchWidget::mount(surface, config, &sample)?;
        Ok(Self {
            selected,
            widget,
            latest_sample: sample,
            last_frame: Instant::now(),
            alarm_input: config.alarm.map(|a| a.to_string()).unwrap_or_default(),
            theme_choice: config.theme,
        })
    }

    fn sample(&mut self) -> Result<TimeSample> {
        // Simulated time runs at wall speed from its start point while the window is open.
        if let Some(manual) = &self.selected.manual {
            let now = Instant::now();
            manual.advance(now.saturating_duration_since(self.last_frame))?;
            self.last_frame = now;
        }
        self.selected.provider.now()
    }

    fn show_header(&self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading(RichText::new("AnalogWatch").strong());
            ui.separator();
            let face = &self.widget.surface().face;
            if let Some(clock) = &face.clock {
                ui.label(RichText::new(&clock.time_text).monospace().strong());
                ui.label(&clock.date_text);
            }
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(RichText::new(format!("Weather {}", face.weather)).strong());
            });
        });
    }

    fn show_controls(&mut self, ui: &mut Ui) {
        let sample = self.latest_sample.clone();

        ui.heading("Theme");
        egui::ComboBox::from_id_salt("theme_select")
            .selected_text(self.theme_choice.label())
            .show_ui(ui, |ui| {
                for theme in Theme::ALL {
                    ui.selectable_value(&mut self.theme_choice, theme, theme.label());
                }
            });
        if self.theme_choice != self.widget.theme() {
            let name = self.theme_choice.name();
            log_refusal(self.widget.on_select_theme(name, &sample).map(|_| ()));
            self.theme_choice = self.widget.theme();
        }

        ui.separator();
        ui.heading("Alarm");
        let alarm = self.widget.alarm_state();
        let target = alarm.target_time.map(|t| t.to_string()).unwrap_or_default();
        let status = match alarm.status() {
            AlarmStatus::Unset => "No alarm set".to_string(),
            AlarmStatus::Armed => format!("Armed for {target}"),
            AlarmStatus::Ringing => format!("Ringing ({target})"),
        };
        ui.label(status);
        ui.horizontal(|ui| {
            ui.add(
                TextEdit::singleline(&mut self.alarm_input)
                    .hint_text("HH:MM")
                    .desired_width(80.0),
            );
            if ui.button("Set Alarm").clicked() {
                let input = self.alarm_input.trim().to_string();
                log_refusal(self.widget.on_set_alarm(&input, &sample).map(|_| ()));
            }
            if ui
                .add_enabled(alarm.target_time.is_some(), egui::Button::new("Clear"))
                .clicked()
            {
                log_refusal(self.widget.on_clear_alarm(&sample).map(|_| ()));
            }
        });

        ui.separator();
        ui.heading("Stopwatch");
        let display = self
            .widget
            .surface()
            .face
            .stopwatch
            .clone()
            .unwrap_or_else(|| self.widget.stopwatch_display(sample.monotonic_ms));
        ui.label(RichText::new(&display.text).monospace().size(28.0));
        let phase = self.widget.stopwatch_state().phase;
        let running = phase == StopwatchPhase::Running;
        ui.horizontal(|ui| {
            if ui.add_enabled(!running, egui::Button::new("Start")).clicked() {
                log_refusal(self.widget.on_start_stopwatch(&sample));
            }
            if ui.add_enabled(running, egui::Button::new("Stop")).clicked() {
                log_refusal(self.widget.on_stop_stopwatch(&sample));
            }
            let resettable = phase == StopwatchPhase::Paused;
            if ui.add_enabled(resettable, egui::Button::new("Reset")).clicked() {
                log_refusal(self.widget.on_reset_stopwatch(&sample));
            }
        });

        ui.separator();
        ui.label(
            RichText::new(format!("Source: {}", self.selected.label))
                .color(Color32::from_rgb(161, 180, 201)),
        );
    }

    fn show_toast(&self, ui: &mut Ui) {
        let Some(notification) = self.widget.current_notification(self.latest_sample.monotonic_ms)
        else {
            return;
        };
        let color = match notification.severity {
            Severity::Info => Color32::from_rgb(104, 218, 131),
            Severity::Error => Color32::from_rgb(255, 106, 106),
        };
        ui.label(RichText::new(&notification.message).color(color).strong());
    }
}

fn log_refusal(result: std::result::Result<(), WidgetError>) {
    if let Err(err) = result {
        tracing::debug!(error = %err, "window action refused");
    }
}

fn paint_face(ui: &mut Ui, face: &FaceState) {
    let palette = FacePalette::for_theme(face.theme);
    let size = ui.available_size().min_elem().clamp(160.0, 520.0);
    let (response, painter) = ui.allocate_painter(Vec2::splat(size), egui::Sense::hover());
    let center = response.rect.center();
    let radius = size * 0.46;

    painter.circle(center, radius, palette.face, Stroke::new(3.0, palette.rim));
    for marker in 0..12u8 {
        let dir = hand_direction(f64::from(marker) * 30.0);
        let inner: f32 = if marker % 3 == 0 { 0.78 } else { 0.85 };
        painter.line_segment(
            [center + dir * radius * inner, center + dir * radius * 0.93],
            Stroke::new(if marker % 3 == 0 { 4.0_f32 } else { 2.0 }, palette.marker),
        );
    }
    let font = FontId::proportional((size * 0.075).max(11.0));
    for hour in 1..=12u8 {
        painter.text(
            center + numeral_offset(hour, radius),
            Align2::CENTER_CENTER,
            hour.to_string(),
            font.clone(),
            palette.marker,
        );
    }

    if let Some(clock) = &face.clock {
        draw_hand(&painter, center, clock.hour_angle_deg, radius * 0.5, 6.0, palette.hands);
        draw_hand(&painter, center, clock.minute_angle_deg, radius * 0.72, 4.0, palette.hands);
        draw_hand(&painter, center, clock.second_angle_deg, radius * 0.86, 1.5, palette.second);
    }
    painter.circle_filled(center, 5.0, palette.second);
}

fn draw_hand(
    painter: &egui::Painter,
    center: Pos2,
    angle_deg: f64,
    length: f32,
    width: f32,
    color: Color32,
) {
    let tip = center + hand_direction(angle_deg) * length;
    painter.line_segment([center, tip], Stroke::new(width, color));
}

/// Numerals sit just inside the hour markers.
fn numeral_offset(hour: u8, radius: f32) -> Vec2 {
    hand_direction(f64::from(hour % 12) * 30.0) * radius * 0.66
}

/// Clockwise from 12 o'clock in screen coordinates (y grows downwards).
fn hand_direction(angle_deg: f64) -> Vec2 {
    let radians = angle_deg.to_radians() as f32;
    egui::vec2(radians.sin(), -radians.cos())
}

impl eframe::App for AnalogWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.sample() {
            Ok(sample) => {
                self.widget.on_tick(&sample);
                self.latest_sample = sample;
            }
            Err(err) => tracing::error!(error = %err, "failed to read time source"),
        }

        TopBottomPanel::top("header")
            .resizable(false)
            .show(ctx, |ui| self.show_header(ui));

        TopBottomPanel::bottom("toast")
            .resizable(false)
            .show(ctx, |ui| self.show_toast(ui));

        egui::SidePanel::right("controls_panel")
            .resizable(true)
            .min_width(220.0)
            .default_width(260.0)
            .show(ctx, |ui| self.show_controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.with_layout(Layout::top_down(Align::Center), |ui| {
                paint_face(ui, &self.widget.surface().face);
            });
        });

        if let Some(deadline) = self.widget.next_deadline_ms() {
            let wait = deadline.saturating_sub(self.latest_sample.monotonic_ms);
            ctx.request_repaint_after(Duration::from_millis(wait));
        }
    }
}

impl Drop for AnalogWatchApp {
    fn drop(&mut self) {
        self.widget.on_destroy();
    }
}
