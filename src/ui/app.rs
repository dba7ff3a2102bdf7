//! Main FretCoach window and eframe integration
//!
//! The window owns the platform capture objects (cpal streams are not Send,
//! so they stay on the UI thread) and talks to the orchestrator through its
//! handle: commands out, events and shared-state snapshots in.

use crate::audio::{BlobPlayer, MicCapture, VisualizerTap};
use crate::lessons::LESSON_TOPICS;
use crate::processor::OrchestratorHandle;
use crate::state::{
    AppEvent, AppStateSnapshot, SessionState, MAX_FREE_LESSONS, MAX_FREE_RECORDINGS,
};
use crate::ui::components::{
    LessonAction, LessonCard, LessonDetail, RecordButton, ScoreCard, Spectrum,
};
use crate::ui::state::{AppView, UiState};
use crate::ui::theme::Theme;
use egui::{CentralPanel, ProgressBar, RichText, TopBottomPanel};
use tracing::{info, warn};

/// Samples kept for the spectrum window
const SPECTRUM_WINDOW: usize = 2048;

/// Main application window
pub struct CoachApp {
    handle: OrchestratorHandle,
    theme: Theme,
    ui: UiState,
    /// Capture device; present only between device-open and stop
    capture: Option<MicCapture>,
    tap: VisualizerTap,
    player: BlobPlayer,
    /// Sample rate of the last opened device, for the spectrum
    sample_rate: u32,
}

impl CoachApp {
    pub fn new(cc: &eframe::CreationContext<'_>, handle: OrchestratorHandle) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        Self {
            handle,
            theme,
            ui: UiState::new(),
            capture: None,
            tap: VisualizerTap::new(SPECTRUM_WINDOW * 2),
            player: BlobPlayer::new(),
            sample_rate: 48_000,
        }
    }

    /// Drain orchestrator events for this frame
    fn process_events(&mut self, ctx: &egui::Context) {
        while let Some(event) = self.handle.try_recv_event() {
            match event {
                AppEvent::StateChanged => {
                    ctx.request_repaint();
                }
                AppEvent::DeviceRequested => {
                    self.open_device();
                }
                AppEvent::QuotaExceeded(op) => {
                    self.ui.navigate(AppView::Premium);
                    self.ui
                        .show_banner(format!("Free limit for {op} reached. Upgrade to continue"));
                }
                AppEvent::AnalysisComplete => {
                    self.ui.navigate(AppView::Studio);
                }
                AppEvent::LessonReady => {
                    self.ui.show_banner("New lesson added to your catalog");
                }
                AppEvent::VideoReady(_) => {
                    self.ui.show_banner("Demonstration video is ready");
                }
                AppEvent::CredentialRequired => {
                    self.ui.credential_prompt = true;
                }
                AppEvent::Error(message) => {
                    self.ui.show_banner(message);
                }
                AppEvent::Shutdown => {
                    info!("Orchestrator reported shutdown, closing window");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }

    /// Open the microphone in response to `DeviceRequested`
    ///
    /// The quota gate already passed on the orchestrator side; this is the
    /// first moment the hardware is touched.
    fn open_device(&mut self) {
        match MicCapture::open() {
            Ok(mut capture) => {
                self.ui.spectrum_window.clear();
                self.tap.attach();
                match capture.start(self.handle.chunk_sender(), self.tap.clone()) {
                    Ok(()) => {
                        self.sample_rate = capture.sample_rate();
                        let _ = self.handle.device_opened(capture.sample_rate());
                        self.capture = Some(capture);
                    }
                    Err(e) => {
                        self.tap.detach();
                        warn!("Capture start failed: {}", e);
                        let _ = self.handle.device_failed(e.to_string());
                    }
                }
            }
            Err(e) => {
                warn!("Device open failed: {}", e);
                let _ = self.handle.device_failed(e.to_string());
            }
        }
    }

    /// Stop capture, release the device, detach the visualizer, and let the
    /// orchestrator finalize the blob.
    fn stop_take(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
        self.tap.detach();
        let _ = self.handle.stop_recording();
    }

    fn toggle_recording(&mut self, state: SessionState) {
        match state {
            SessionState::Idle => {
                let _ = self.handle.start_recording();
            }
            SessionState::Recording => self.stop_take(),
            _ => {}
        }
    }

    // === Views ===

    fn render_nav(&mut self, ctx: &egui::Context, snapshot: &AppStateSnapshot) {
        TopBottomPanel::top("nav").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("FretCoach")
                        .size(18.0)
                        .strong()
                        .color(self.theme.primary),
                );
                ui.separator();

                for view in [
                    AppView::Dashboard,
                    AppView::Studio,
                    AppView::Exercises,
                    AppView::Premium,
                ] {
                    let selected = self.ui.view == view;
                    if ui.selectable_label(selected, view.title()).clicked() {
                        self.ui.navigate(view);
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let tier = if snapshot.account.is_premium {
                        "★ Premium"
                    } else {
                        "Free"
                    };
                    ui.label(
                        RichText::new(tier)
                            .size(12.0)
                            .color(self.theme.tier_color(snapshot.account.is_premium)),
                    );
                });
            });
        });
    }

    fn render_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.ui.banner.clone() {
            egui::Frame::none()
                .fill(self.theme.bg_tertiary)
                .rounding(self.theme.button_rounding)
                .inner_margin(self.theme.spacing_sm)
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&banner).color(self.theme.text_primary));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("✕").clicked() {
                                self.ui.banner = None;
                            }
                        });
                    });
                });
            ui.add_space(self.theme.spacing_sm);
        }
    }

    fn render_dashboard(&mut self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.label(
                RichText::new("FretCoach")
                    .size(40.0)
                    .strong()
                    .color(self.theme.primary),
            );
            ui.label(
                RichText::new("Your AI-powered guitar practice coach")
                    .color(self.theme.text_muted),
            );
            ui.add_space(24.0);
        });

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.label(
                    RichText::new("Your progress")
                        .size(15.0)
                        .strong()
                        .color(self.theme.text_primary),
                );
                ui.add_space(self.theme.spacing_sm);

                if snapshot.account.is_premium {
                    ui.label(
                        RichText::new("Premium: unlimited recordings and lessons")
                            .color(self.theme.premium),
                    );
                } else {
                    let account = snapshot.account;
                    ui.label(
                        RichText::new(format!(
                            "Recordings  {} / {}",
                            account.recordings_used, MAX_FREE_RECORDINGS
                        ))
                        .color(self.theme.text_secondary),
                    );
                    ui.add(
                        ProgressBar::new(
                            account.recordings_used as f32 / MAX_FREE_RECORDINGS as f32,
                        )
                        .desired_height(6.0),
                    );
                    ui.add_space(self.theme.spacing_sm);
                    ui.label(
                        RichText::new(format!(
                            "Generated lessons  {} / {}",
                            account.lessons_used, MAX_FREE_LESSONS
                        ))
                        .color(self.theme.text_secondary),
                    );
                    ui.add(
                        ProgressBar::new(account.lessons_used as f32 / MAX_FREE_LESSONS as f32)
                            .desired_height(6.0),
                    );
                }
            });

        ui.add_space(self.theme.spacing);
        ui.horizontal(|ui| {
            if ui.button("Record a take").clicked() {
                self.ui.navigate(AppView::Studio);
            }
            if ui.button("Browse exercises").clicked() {
                self.ui.navigate(AppView::Exercises);
            }
        });
    }

    fn render_studio(&mut self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        self.render_banner(ui);

        let state = snapshot.session_state;

        // Pull fresh samples for the spectrum; outside Recording the tap is
        // detached and this is a no-op that leaves the last frame in place.
        self.tap
            .drain_into(&mut self.ui.spectrum_window, SPECTRUM_WINDOW);

        ui.vertical_centered(|ui| {
            ui.add_space(12.0);

            let button = RecordButton::new(state, &self.theme);
            let actionable = button.is_actionable();
            let response = button.show(ui);
            if actionable && response.clicked() {
                self.toggle_recording(state);
            }

            // Space toggles recording, as long as nothing has focus
            let space = ui.input(|i| i.key_pressed(egui::Key::Space));
            let focused = ui.memory(|m| m.focused().is_some());
            if space && !focused {
                self.toggle_recording(state);
            }

            ui.add_space(6.0);
            let status = match state {
                SessionState::Idle => "Ready to record",
                SessionState::Requesting => "Opening microphone…",
                SessionState::Recording => "Recording, play your take",
                SessionState::Stopped => "Take ready for review",
                SessionState::Submitting => "Analyzing your take…",
                SessionState::Scored => "Analysis complete",
                SessionState::Failed => "Analysis failed",
            };
            ui.label(RichText::new(status).size(13.0).color(self.theme.text_muted));
        });

        ui.add_space(self.theme.spacing_sm);
        Spectrum::new(
            &self.ui.spectrum_window,
            self.sample_rate as f32,
            &self.theme,
        )
        .live(state.is_recording())
        .show(ui);
        ui.add_space(self.theme.spacing_sm);

        match state {
            SessionState::Stopped => self.render_review(ui, snapshot),
            SessionState::Submitting => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(
                        RichText::new("Your coach is listening…").color(self.theme.text_muted),
                    );
                });
            }
            SessionState::Scored => {
                if let Some(result) = &snapshot.analysis {
                    ScoreCard::new(result, &self.theme).show(ui);
                }
                ui.add_space(self.theme.spacing_sm);
                if ui.button("New recording").clicked() {
                    self.player.stop();
                    let _ = self.handle.discard_recording();
                }
            }
            SessionState::Failed => {
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .rounding(self.theme.card_rounding)
                    .inner_margin(self.theme.spacing)
                    .show(ui, |ui| {
                        ui.label(
                            RichText::new("Analysis failed").strong().color(self.theme.error),
                        );
                        if let Some(failure) = &snapshot.session_failure {
                            ui.label(
                                RichText::new(failure).size(12.0).color(self.theme.text_muted),
                            );
                        }
                    });
                ui.add_space(self.theme.spacing_sm);
                if ui.button("Discard and try again").clicked() {
                    self.player.stop();
                    let _ = self.handle.discard_recording();
                }
            }
            _ => {}
        }
    }

    /// Review controls for a stopped take
    fn render_review(&mut self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        let duration = snapshot.blob_duration_secs.unwrap_or(0.0);
        let size_kb = snapshot.blob_size.unwrap_or(0) / 1024;

        ui.label(
            RichText::new(format!(
                "Take: {duration:.1}s · {size_kb} KiB · {} fragment(s)",
                snapshot.chunk_count
            ))
            .size(12.0)
            .color(self.theme.text_muted),
        );
        ui.add_space(self.theme.spacing_sm);

        ui.horizontal(|ui| {
            if self.player.is_playing() {
                if ui.button("⏹ Stop playback").clicked() {
                    self.player.stop();
                }
            } else if ui.button("▶ Listen back").clicked() {
                let blob = self.handle.state().read().session.final_blob().cloned();
                if let Some(blob) = blob {
                    if let Err(e) = self.player.play(&blob) {
                        warn!("Playback failed: {}", e);
                        self.ui.show_banner(e.user_message());
                    }
                }
            }

            if ui.button("Submit for feedback").clicked() {
                self.player.stop();
                let _ = self.handle.submit_for_analysis();
            }

            if ui.button("Discard").clicked() {
                self.player.stop();
                let _ = self.handle.discard_recording();
            }
        });
    }

    fn render_exercises(&mut self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        self.render_banner(ui);

        // Detail panel takes over when an exercise is open
        if let Some(active_id) = self.ui.active_exercise.clone() {
            if let Some(exercise) = snapshot.exercises.iter().find(|e| e.id == active_id) {
                let in_flight = snapshot.generating_video_for.as_deref() == Some(&active_id);
                let action = LessonDetail::new(exercise, &self.theme)
                    .video_in_flight(in_flight)
                    .show(ui);
                match action {
                    LessonAction::Close => self.ui.active_exercise = None,
                    LessonAction::GenerateVideo => {
                        let _ = self.handle.generate_video(active_id);
                    }
                    LessonAction::None => {}
                }
            } else {
                self.ui.active_exercise = None;
            }
            return;
        }

        ui.horizontal(|ui| {
            ui.label(
                RichText::new("Exercises")
                    .size(20.0)
                    .strong()
                    .color(self.theme.text_primary),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if snapshot.generating_lesson {
                    ui.spinner();
                    ui.label(RichText::new("Generating…").color(self.theme.text_muted));
                } else if ui.button("✨ Generate a lesson").clicked() {
                    let topic =
                        LESSON_TOPICS[snapshot.exercises.len() % LESSON_TOPICS.len()].to_string();
                    let _ = self
                        .handle
                        .generate_lesson("Intermediate".to_string(), topic);
                }
            });
        });
        ui.add_space(self.theme.spacing_sm);

        egui::ScrollArea::vertical().show(ui, |ui| {
            for exercise in &snapshot.exercises {
                let locked = exercise.is_locked && !snapshot.account.is_premium;
                let response = LessonCard::new(exercise, &self.theme).show(ui);
                if response.clicked() {
                    if locked {
                        self.ui.navigate(AppView::Premium);
                        self.ui.show_banner("This lesson is part of Premium");
                    } else {
                        self.ui.active_exercise = Some(exercise.id.clone());
                    }
                }
                ui.add_space(self.theme.spacing_sm);
            }
        });
    }

    fn render_premium(&mut self, ui: &mut egui::Ui, snapshot: &AppStateSnapshot) {
        self.render_banner(ui);

        ui.vertical_centered(|ui| {
            ui.add_space(16.0);
            ui.label(
                RichText::new("★ FretCoach Premium")
                    .size(28.0)
                    .strong()
                    .color(self.theme.premium),
            );
            ui.add_space(self.theme.spacing_sm);

            egui::Frame::none()
                .fill(self.theme.bg_secondary)
                .rounding(self.theme.card_rounding)
                .inner_margin(self.theme.spacing_lg)
                .show(ui, |ui| {
                    for benefit in [
                        "Unlimited recorded takes with AI feedback",
                        "Unlimited generated lessons",
                        "Every locked exercise, unlocked",
                    ] {
                        ui.label(
                            RichText::new(format!("✔ {benefit}"))
                                .color(self.theme.text_secondary),
                        );
                    }
                    ui.add_space(self.theme.spacing);

                    if snapshot.account.is_premium {
                        ui.label(
                            RichText::new("You are Premium. Enjoy!").color(self.theme.success),
                        );
                    } else if ui
                        .button(RichText::new("Upgrade for $7.99/month").strong())
                        .clicked()
                    {
                        // Simulated payment; the command unlocks everything
                        let _ = self.handle.upgrade_to_premium();
                        self.ui.show_banner("Welcome to Premium!");
                    }
                });
        });
    }

    fn render_credential_prompt(&mut self, ctx: &egui::Context) {
        if !self.ui.credential_prompt {
            return;
        }
        egui::Window::new("API key required")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(
                    "Video generation needs a paid API key. The current key is invalid or \
                     lacks permissions.",
                );
                ui.label(
                    RichText::new(format!(
                        "Set {} to a key with video access and restart.",
                        crate::config::API_KEY_VAR
                    ))
                    .color(self.theme.text_muted),
                );
                ui.add_space(self.theme.spacing_sm);
                if ui.button("Dismiss").clicked() {
                    self.ui.credential_prompt = false;
                }
            });
    }
}

impl eframe::App for CoachApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events(ctx);

        let snapshot = self.handle.state().snapshot();

        self.render_nav(ctx, &snapshot);
        self.render_credential_prompt(ctx);

        CentralPanel::default().show(ctx, |ui| match self.ui.view {
            AppView::Dashboard => self.render_dashboard(ui, &snapshot),
            AppView::Studio => self.render_studio(ui, &snapshot),
            AppView::Exercises => self.render_exercises(ui, &snapshot),
            AppView::Premium => self.render_premium(ui, &snapshot),
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Window teardown: release the device, pair the tap detach, and let
        // the orchestrator wind the workers down.
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
        self.tap.detach();
        self.player.stop();
        let _ = self.handle.shutdown();
        info!("Window closed, shutdown requested");
    }
}
