//! Record button component
//!
//! One circular control whose face tracks the session state: microphone when
//! a take can start, spinner while the device opens, stop square while
//! recording. Outside those states the session is in review or submission
//! and the button goes dormant.

use crate::state::SessionState;
use crate::ui::theme::Theme;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};

const BUTTON_RADIUS: f32 = 36.0;

/// Circular record control driven by the session state
pub struct RecordButton<'a> {
    session_state: SessionState,
    theme: &'a Theme,
}

impl<'a> RecordButton<'a> {
    pub fn new(session_state: SessionState, theme: &'a Theme) -> Self {
        Self {
            session_state,
            theme,
        }
    }

    /// Whether the button reacts to clicks in this state
    pub fn is_actionable(&self) -> bool {
        matches!(
            self.session_state,
            SessionState::Idle | SessionState::Recording
        )
    }

    /// Show the button and return the response
    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let size = Vec2::splat(BUTTON_RADIUS * 2.0 + 8.0);
        let sense = if self.is_actionable() {
            Sense::click()
        } else {
            Sense::hover()
        };
        let (rect, response) = ui.allocate_exact_size(size, sense);

        if ui.is_rect_visible(rect) {
            self.paint(ui, rect, &response);
        }

        match self.session_state {
            SessionState::Idle => response.on_hover_text("Start recording"),
            SessionState::Recording => response.on_hover_text("Stop recording"),
            _ => response,
        }
    }

    fn paint(&self, ui: &mut egui::Ui, rect: Rect, response: &egui::Response) {
        let painter = ui.painter();
        let center = rect.center();

        let face = match self.session_state {
            SessionState::Recording => self.theme.recording,
            SessionState::Requesting => self.theme.warning.gamma_multiply(0.7),
            SessionState::Idle if response.hovered() => self.theme.primary.gamma_multiply(1.15),
            SessionState::Idle => self.theme.primary,
            _ => self.theme.bg_tertiary,
        };

        painter.circle_filled(center, BUTTON_RADIUS, face);

        match self.session_state {
            SessionState::Recording => {
                self.paint_stop_square(painter, center);
                self.paint_pulse(ui, center);
            }
            SessionState::Requesting => self.paint_spinner(ui, center),
            _ => self.paint_mic(painter, center),
        }
    }

    fn paint_stop_square(&self, painter: &egui::Painter, center: Pos2) {
        painter.rect_filled(
            Rect::from_center_size(center, Vec2::splat(20.0)),
            3.0,
            Color32::WHITE,
        );
    }

    /// Expanding ring synced to the frame clock while recording
    fn paint_pulse(&self, ui: &egui::Ui, center: Pos2) {
        let time = ui.ctx().input(|i| i.time);
        let phase = (time * 1.4).fract() as f32;
        let radius = BUTTON_RADIUS + phase * 14.0;
        let alpha = ((1.0 - phase) * 120.0) as u8;

        ui.painter().circle_stroke(
            center,
            radius,
            Stroke::new(
                2.0,
                Color32::from_rgba_unmultiplied(
                    self.theme.recording.r(),
                    self.theme.recording.g(),
                    self.theme.recording.b(),
                    alpha,
                ),
            ),
        );
        ui.ctx().request_repaint();
    }

    fn paint_spinner(&self, ui: &egui::Ui, center: Pos2) {
        let time = ui.ctx().input(|i| i.time);
        let base_angle = time * 4.0;
        let painter = ui.painter();

        for i in 0..8 {
            let angle = base_angle + i as f64 * std::f64::consts::TAU / 8.0;
            let pos = Pos2::new(
                center.x + (angle.cos() as f32) * 12.0,
                center.y + (angle.sin() as f32) * 12.0,
            );
            let alpha = 255 - i * 28;
            painter.circle_filled(pos, 2.5, Color32::from_white_alpha(alpha as u8));
        }
        ui.ctx().request_repaint();
    }

    fn paint_mic(&self, painter: &egui::Painter, center: Pos2) {
        let ink = match self.session_state {
            SessionState::Idle => Color32::WHITE,
            _ => self.theme.text_muted,
        };

        // Capsule body
        painter.rect_filled(
            Rect::from_center_size(Pos2::new(center.x, center.y - 4.0), Vec2::new(10.0, 18.0)),
            5.0,
            ink,
        );
        // Cradle
        painter.line_segment(
            [
                Pos2::new(center.x - 9.0, center.y + 2.0),
                Pos2::new(center.x - 9.0, center.y + 6.0),
            ],
            Stroke::new(2.0, ink),
        );
        painter.line_segment(
            [
                Pos2::new(center.x + 9.0, center.y + 2.0),
                Pos2::new(center.x + 9.0, center.y + 6.0),
            ],
            Stroke::new(2.0, ink),
        );
        painter.line_segment(
            [
                Pos2::new(center.x - 9.0, center.y + 6.0),
                Pos2::new(center.x + 9.0, center.y + 6.0),
            ],
            Stroke::new(2.0, ink),
        );
        // Stand
        painter.line_segment(
            [
                Pos2::new(center.x, center.y + 6.0),
                Pos2::new(center.x, center.y + 13.0),
            ],
            Stroke::new(2.0, ink),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actionable_only_when_a_click_has_meaning() {
        let theme = Theme::dark();
        for (state, expected) in [
            (SessionState::Idle, true),
            (SessionState::Requesting, false),
            (SessionState::Recording, true),
            (SessionState::Stopped, false),
            (SessionState::Submitting, false),
            (SessionState::Scored, false),
            (SessionState::Failed, false),
        ] {
            let button = RecordButton::new(state, &theme);
            assert_eq!(button.is_actionable(), expected, "state {state}");
        }
    }
}
