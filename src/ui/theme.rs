//! Theme and styling for the FretCoach UI
//!
//! Dark stage-light palette: near-black background, amber brand accent,
//! violet for everything premium.

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};

/// Application theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    /// Brand accent (amber)
    pub primary: Color32,
    /// Premium accent (violet)
    pub premium: Color32,
    /// Success color
    pub success: Color32,
    /// Warning color
    pub warning: Color32,
    /// Error color
    pub error: Color32,

    /// Background colors
    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    /// Text colors
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    /// Recording indicator color
    pub recording: Color32,

    /// Spectrum bar colors (low to high frequency gradient endpoints)
    pub spectrum_low: Color32,
    pub spectrum_high: Color32,
    pub spectrum_idle: Color32,

    /// Overlay tint for locked exercises
    pub locked_overlay: Color32,

    /// Border radius for buttons
    pub button_rounding: Rounding,
    /// Border radius for cards/panels
    pub card_rounding: Rounding,

    /// Standard spacing
    pub spacing: f32,
    pub spacing_lg: f32,
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// The dark stage theme
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(245, 158, 11),  // Amber
            premium: Color32::from_rgb(168, 85, 247),  // Violet
            success: Color32::from_rgb(34, 197, 94),   // Green
            warning: Color32::from_rgb(234, 179, 8),   // Yellow
            error: Color32::from_rgb(239, 68, 68),     // Red

            bg_primary: Color32::from_rgb(17, 17, 27),   // Near-black
            bg_secondary: Color32::from_rgb(28, 28, 40), // Card background
            bg_tertiary: Color32::from_rgb(42, 42, 58),  // Raised surfaces

            text_primary: Color32::from_rgb(245, 245, 244),
            text_secondary: Color32::from_rgb(214, 211, 209),
            text_muted: Color32::from_rgb(148, 145, 150),

            recording: Color32::from_rgb(239, 68, 68),

            spectrum_low: Color32::from_rgb(245, 158, 11),  // Amber
            spectrum_high: Color32::from_rgb(217, 70, 130), // Magenta
            spectrum_idle: Color32::from_rgb(72, 72, 90),

            locked_overlay: Color32::from_rgba_premultiplied(10, 10, 16, 180),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(12.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::dark();

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_tertiary;

        visuals.widgets.noninteractive.bg_fill = self.bg_secondary;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_muted);

        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_secondary);

        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.widgets.active.bg_fill = self.primary;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.bg_primary);

        visuals.selection.bg_fill = self.primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.primary);

        visuals.hyperlink_color = self.primary;

        visuals.window_rounding = self.card_rounding;
        visuals.window_stroke = Stroke::new(1.0, self.bg_tertiary);

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.window_margin = egui::Margin::same(self.spacing);
        style.spacing.button_padding = Vec2::new(self.spacing, self.spacing_sm);

        style.text_styles.insert(
            egui::TextStyle::Heading,
            FontId::new(26.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(14.0, FontFamily::Proportional),
        );
        // Tablature rendering leans on monospace alignment
        style.text_styles.insert(
            egui::TextStyle::Monospace,
            FontId::new(13.0, FontFamily::Monospace),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            FontId::new(14.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            FontId::new(12.0, FontFamily::Proportional),
        );

        ctx.set_style(style);
    }

    /// Accent for the current subscription tier
    pub fn tier_color(&self, is_premium: bool) -> Color32 {
        if is_premium {
            self.premium
        } else {
            self.primary
        }
    }
}
