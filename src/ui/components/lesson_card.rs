//! Exercise catalog cards and the lesson detail panel

use crate::lessons::Exercise;
use crate::ui::theme::Theme;
use egui::{RichText, Sense};

/// What the user did inside the detail panel this frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LessonAction {
    None,
    /// Close the detail panel
    Close,
    /// Request a demonstration video for this exercise
    GenerateVideo,
}

/// Compact catalog card; clicking opens the lesson (or routes a locked one
/// to the upgrade surface; the caller decides, the card just reports the
/// click)
pub struct LessonCard<'a> {
    exercise: &'a Exercise,
    theme: &'a Theme,
}

impl<'a> LessonCard<'a> {
    pub fn new(exercise: &'a Exercise, theme: &'a Theme) -> Self {
        Self { exercise, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let frame = egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing);

        let inner = frame.show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(&self.exercise.title)
                                .size(16.0)
                                .strong()
                                .color(if self.exercise.is_locked {
                                    self.theme.text_muted
                                } else {
                                    self.theme.text_primary
                                }),
                        );
                        if self.exercise.is_locked {
                            ui.label(RichText::new("🔒").size(14.0));
                        }
                        if self.exercise.video_uri.is_some() {
                            ui.label(
                                RichText::new("▶ video")
                                    .size(11.0)
                                    .color(self.theme.success),
                            );
                        }
                    });
                    ui.label(
                        RichText::new(self.exercise.difficulty.to_string())
                            .size(11.0)
                            .color(self.theme.primary),
                    );
                    ui.label(
                        RichText::new(&self.exercise.description)
                            .size(12.0)
                            .color(self.theme.text_muted),
                    );
                });
            });
        });

        ui.allocate_rect(inner.response.rect, Sense::click())
    }
}

/// Full lesson view: theory, steps, tablature, video affordance
pub struct LessonDetail<'a> {
    exercise: &'a Exercise,
    theme: &'a Theme,
    video_in_flight: bool,
}

impl<'a> LessonDetail<'a> {
    pub fn new(exercise: &'a Exercise, theme: &'a Theme) -> Self {
        Self {
            exercise,
            theme,
            video_in_flight: false,
        }
    }

    /// Mark that a video generation call is running for this exercise
    pub fn video_in_flight(mut self, in_flight: bool) -> Self {
        self.video_in_flight = in_flight;
        self
    }

    pub fn show(self, ui: &mut egui::Ui) -> LessonAction {
        let mut action = LessonAction::None;

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(&self.exercise.title)
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Back").clicked() {
                            action = LessonAction::Close;
                        }
                    });
                });
                ui.label(
                    RichText::new(self.exercise.difficulty.to_string())
                        .size(12.0)
                        .color(self.theme.primary),
                );

                ui.add_space(self.theme.spacing_sm);
                ui.label(RichText::new(&self.exercise.description).color(self.theme.text_secondary));

                ui.add_space(self.theme.spacing);
                self.heading(ui, "Why this works");
                ui.label(RichText::new(&self.exercise.theory).color(self.theme.text_secondary));

                ui.add_space(self.theme.spacing);
                self.heading(ui, "Step by step");
                for (i, step) in self.exercise.lesson_steps.iter().enumerate() {
                    ui.label(
                        RichText::new(format!("{}. {}", i + 1, step))
                            .color(self.theme.text_secondary),
                    );
                }

                ui.add_space(self.theme.spacing);
                self.heading(ui, "Tablature");
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .rounding(self.theme.button_rounding)
                    .inner_margin(self.theme.spacing_sm)
                    .show(ui, |ui| {
                        ui.label(
                            RichText::new(&self.exercise.tablature)
                                .monospace()
                                .color(self.theme.text_primary),
                        );
                    });

                ui.add_space(self.theme.spacing);
                match (&self.exercise.video_uri, self.video_in_flight) {
                    (Some(uri), _) => {
                        self.heading(ui, "Demonstration");
                        ui.hyperlink_to("Open generated video", uri);
                    }
                    (None, true) => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(
                                RichText::new("Generating video, this can take a few minutes…")
                                    .color(self.theme.text_muted),
                            );
                        });
                    }
                    (None, false) => {
                        if ui.button("Generate demo video").clicked() {
                            action = LessonAction::GenerateVideo;
                        }
                    }
                }
            });

        action
    }

    fn heading(&self, ui: &mut egui::Ui, text: &str) {
        ui.label(
            RichText::new(text)
                .size(13.0)
                .strong()
                .color(self.theme.primary),
        );
    }
}
