#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use audio::AlarmAudio;
use background::Background;
use config::Settings;
use eframe::egui::{self, Align, CentralPanel, Color32, Frame, Layout, RichText, UiBuilder};
use outcome::Outcome;
use snooze::Snooze;
use widgets::{glass_panel, GlassButton};

pub mod audio;
pub mod background;
pub mod cli;
pub mod clock;
pub mod config;
pub mod duration;
pub mod outcome;
pub mod snooze;
pub mod watchdog;
pub mod widgets;

const CONTROLS_HEIGHT: f32 = 220.0;
const PADDING: f32 = 24.0;
const CLOCK_TEXT_SIZE: f32 = 150.0;
const SNOOZE_TEXT_SIZE: f32 = 40.0;

/// the fullscreen alarm screen
pub struct AlarmApp {
    time_format: String,
    snooze: Snooze,
    audio: Option<AlarmAudio>,
    background: Background,
    /// width of the snooze row last frame, egui rows can't center themselves
    snooze_row_width: f32,
}

/// space to put before a row of `row_width` so it ends up centered in `available`
#[must_use]
pub fn centering_space(available: f32, row_width: f32) -> f32 {
    ((available - row_width) / 2.0).max(0.0)
}

impl AlarmApp {
    #[must_use]
    pub fn new(cc: &eframe::CreationContext<'_>, settings: &Settings, audio: Option<AlarmAudio>) -> Self {
        clock::spawn_tick(cc.egui_ctx.clone());
        Self {
            time_format: settings.time_format.clone(),
            snooze: Snooze::new(settings.snooze),
            audio,
            background: Background::load(
                &cc.egui_ctx,
                settings.background.as_deref(),
                &settings.video,
            ),
            snooze_row_width: 0.0,
        }
    }

    /// silences everything and exits, both dismiss and snooze end up here
    fn finish(&self, outcome: Outcome) -> ! {
        if let Some(audio) = &self.audio {
            audio.pause();
        }
        self.background.stop();
        println!("{outcome}");
        log::info!("{outcome}, exiting with {}", outcome.exit_code());
        std::process::exit(outcome.exit_code())
    }

    fn render_clock(&self, ui: &mut egui::Ui) {
        ui.with_layout(
            Layout::top_down(Align::Center).with_main_align(Align::Center),
            |ui| {
                glass_panel().show(ui, |ui| {
                    ui.label(
                        RichText::new(clock::clock_text(&self.time_format))
                            .size(CLOCK_TEXT_SIZE)
                            .strong()
                            .color(Color32::WHITE),
                    );
                });
            },
        );
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) -> Option<Outcome> {
        let mut outcome = None;
        ui.with_layout(Layout::bottom_up(Align::Center), |ui| {
            glass_panel().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.horizontal(|ui| {
                        ui.add_space(centering_space(ui.available_width(), self.snooze_row_width));
                        let start = ui.cursor().min.x;
                        if ui.add(GlassButton::new("-")).clicked() {
                            self.snooze.decrease();
                        }
                        ui.label(
                            RichText::new(self.snooze.label())
                                .size(SNOOZE_TEXT_SIZE)
                                .color(Color32::WHITE),
                        );
                        if ui.add(GlassButton::new("+")).clicked() {
                            self.snooze.increase();
                        }
                        if ui.add(GlassButton::new("Snooze")).clicked() {
                            outcome = Some(Outcome::Snoozed(self.snooze.current()));
                        }
                        let width = ui.min_rect().right() - start;
                        if (width - self.snooze_row_width).abs() > 0.5 {
                            self.snooze_row_width = width;
                            ui.ctx().request_repaint();
                        }
                    });
                    ui.add_space(PADDING / 2.0);
                    if ui
                        .add(GlassButton::new("DISMISS").min_width(ui.available_width()))
                        .clicked()
                    {
                        outcome = Some(Outcome::Dismissed);
                    }
                });
            });
        });
        outcome
    }
}

impl eframe::App for AlarmApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut outcome = None;
        CentralPanel::default().frame(Frame::NONE).show(ctx, |ui| {
            let full = ui.max_rect();
            self.background.paint(ctx, ui.painter(), full);

            let (clock_area, controls_area) =
                full.split_top_bottom_at_y(full.bottom() - CONTROLS_HEIGHT);
            ui.scope_builder(UiBuilder::new().max_rect(clock_area.shrink(PADDING)), |ui| {
                self.render_clock(ui);
            });
            ui.scope_builder(
                UiBuilder::new().max_rect(controls_area.shrink(PADDING)),
                |ui| {
                    outcome = self.render_controls(ui);
                },
            );
        });
        if let Some(outcome) = outcome {
            self.finish(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_is_centered() {
        assert_eq!(centering_space(1000.0, 400.0), 300.0);
        assert_eq!(centering_space(400.0, 400.0), 0.0);
        // too wide rows start at the left edge
        assert_eq!(centering_space(300.0, 400.0), 0.0);
        // nothing measured yet
        assert_eq!(centering_space(800.0, 0.0), 400.0);
    }
}
