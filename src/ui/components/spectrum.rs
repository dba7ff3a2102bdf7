//! Live spectrum component
//!
//! Renders frequency-band energy bars from the visualizer window. The
//! component samples current band energy on each frame via Goertzel filters;
//! it never consumes the recorded chunks, and a skipped frame simply renders
//! the next one from fresher data.

use crate::ui::theme::Theme;
use egui::{Pos2, Rect, Sense, Stroke, Vec2};

/// Number of frequency bands displayed
const BAND_COUNT: usize = 24;
/// Lowest analyzed frequency (low E fundamental territory)
const MIN_HZ: f32 = 80.0;
/// Highest analyzed frequency
const MAX_HZ: f32 = 5_000.0;

/// Spectrum bars over the current visualizer window
pub struct Spectrum<'a> {
    window: &'a [f32],
    theme: &'a Theme,
    sample_rate: f32,
    height: f32,
    live: bool,
}

impl<'a> Spectrum<'a> {
    pub fn new(window: &'a [f32], sample_rate: f32, theme: &'a Theme) -> Self {
        Self {
            window,
            theme,
            sample_rate,
            height: 96.0,
            live: false,
        }
    }

    /// Set the component height
    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Mark the spectrum live: keeps the frame loop running while recording
    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    /// Show the spectrum and return the response
    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let desired = Vec2::new(ui.available_width(), self.height);
        let (rect, response) = ui.allocate_exact_size(desired, Sense::hover());

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, self.theme.card_rounding, self.theme.bg_secondary);

            if self.window.is_empty() || self.sample_rate <= 0.0 {
                let baseline = rect.center().y;
                painter.line_segment(
                    [
                        Pos2::new(rect.left() + 10.0, baseline),
                        Pos2::new(rect.right() - 10.0, baseline),
                    ],
                    Stroke::new(1.0, self.theme.spectrum_idle),
                );
            } else {
                self.draw_bands(ui, rect);
            }
        }

        // One visual update per display refresh while live
        if self.live {
            ui.ctx().request_repaint();
        }

        response
    }

    fn draw_bands(&self, ui: &egui::Ui, rect: Rect) {
        let painter = ui.painter();
        let draw_rect = rect.shrink(10.0);
        let energies = band_energies(self.window, self.sample_rate);

        let slot = draw_rect.width() / BAND_COUNT as f32;
        let gap = 2.0;

        for (i, energy) in energies.iter().enumerate() {
            let x = draw_rect.left() + i as f32 * slot;
            let height = (energy * 6.0).clamp(0.02, 1.0) * draw_rect.height();

            let t = i as f32 / (BAND_COUNT - 1) as f32;
            let color = if self.live {
                lerp_color(self.theme.spectrum_low, self.theme.spectrum_high, t)
            } else {
                self.theme.spectrum_idle
            };

            let bar = Rect::from_min_max(
                Pos2::new(x, draw_rect.bottom() - height),
                Pos2::new(x + slot - gap, draw_rect.bottom()),
            );
            painter.rect_filled(bar, 1.5, color);
        }
    }
}

/// Energy per logarithmically spaced band over the window
pub fn band_energies(window: &[f32], sample_rate: f32) -> Vec<f32> {
    (0..BAND_COUNT)
        .map(|i| {
            let t = i as f32 / (BAND_COUNT - 1) as f32;
            let hz = MIN_HZ * (MAX_HZ / MIN_HZ).powf(t);
            goertzel(window, hz, sample_rate)
        })
        .collect()
}

/// Normalized Goertzel magnitude of one frequency in the window
fn goertzel(samples: &[f32], target_hz: f32, sample_rate: f32) -> f32 {
    if samples.is_empty() || sample_rate <= 0.0 || target_hz * 2.0 >= sample_rate {
        return 0.0;
    }

    let omega = std::f32::consts::TAU * target_hz / sample_rate;
    let coeff = 2.0 * omega.cos();

    let mut s_prev = 0.0f32;
    let mut s_prev2 = 0.0f32;
    for &x in samples {
        let s = x + coeff * s_prev - s_prev2;
        s_prev2 = s_prev;
        s_prev = s;
    }

    let power = s_prev * s_prev + s_prev2 * s_prev2 - coeff * s_prev * s_prev2;
    power.max(0.0).sqrt() / samples.len() as f32
}

fn lerp_color(a: egui::Color32, b: egui::Color32, t: f32) -> egui::Color32 {
    let mix = |x: u8, y: u8| -> u8 { (x as f32 + (y as f32 - x as f32) * t) as u8 };
    egui::Color32::from_rgb(mix(a.r(), b.r()), mix(a.g(), b.g()), mix(a.b(), b.b()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(hz: f32, rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (std::f32::consts::TAU * hz * n as f32 / rate).sin())
            .collect()
    }

    #[test]
    fn pure_tone_peaks_in_its_own_band() {
        let rate = 16_000.0;
        let tone_hz = 440.0;
        let window = sine(tone_hz, rate, 2048);

        let energies = band_energies(&window, rate);
        let peak_band = energies
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        // Band center closest to 440Hz
        let expected = (0..BAND_COUNT)
            .min_by_key(|&i| {
                let t = i as f32 / (BAND_COUNT - 1) as f32;
                let hz = MIN_HZ * (MAX_HZ / MIN_HZ).powf(t);
                (hz - tone_hz).abs() as u32
            })
            .unwrap();

        assert!(
            (peak_band as i32 - expected as i32).abs() <= 1,
            "peak in band {peak_band}, expected near {expected}"
        );
    }

    #[test]
    fn silence_has_no_energy() {
        let window = vec![0.0; 1024];
        let energies = band_energies(&window, 16_000.0);
        assert!(energies.iter().all(|&e| e == 0.0));
    }

    #[test]
    fn empty_window_is_all_zero() {
        let energies = band_energies(&[], 16_000.0);
        assert_eq!(energies.len(), BAND_COUNT);
        assert!(energies.iter().all(|&e| e == 0.0));
    }

    #[test]
    fn bands_above_nyquist_are_suppressed() {
        // At 8kHz sampling the top analysis bands pass Nyquist and must not blow up
        let window = sine(440.0, 8_000.0, 1024);
        let energies = band_energies(&window, 8_000.0);
        assert!(energies.iter().all(|e| e.is_finite()));
    }
}
