//! Analysis result card
//!
//! Shows the grade and the three advice sections of a completed analysis.

use crate::state::AnalysisResult;
use crate::ui::theme::Theme;
use egui::RichText;

/// Card presenting one analysis result
pub struct ScoreCard<'a> {
    result: &'a AnalysisResult,
    theme: &'a Theme,
}

impl<'a> ScoreCard<'a> {
    pub fn new(result: &'a AnalysisResult, theme: &'a Theme) -> Self {
        Self { result, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new(self.result.display_score())
                            .size(44.0)
                            .strong()
                            .color(self.score_color()),
                    );
                    ui.label(
                        RichText::new("Coach verdict")
                            .size(12.0)
                            .color(self.theme.text_muted),
                    );
                });

                ui.add_space(self.theme.spacing);
                self.section(ui, "Feedback", &self.result.feedback);
                self.section(ui, "Technique", &self.result.technical_advice);
                self.section(ui, "Theory tip", &self.result.theory_tip);
            });
    }

    fn section(&self, ui: &mut egui::Ui, title: &str, body: &str) {
        ui.separator();
        ui.label(
            RichText::new(title)
                .size(13.0)
                .strong()
                .color(self.theme.primary),
        );
        ui.label(RichText::new(body).color(self.theme.text_secondary));
        ui.add_space(self.theme.spacing_sm);
    }

    fn score_color(&self) -> egui::Color32 {
        if self.result.score >= 7.0 {
            self.theme.success
        } else if self.result.score >= 4.0 {
            self.theme.warning
        } else {
            self.theme.error
        }
    }
}
