//! UI components and application module
//!
//! egui/eframe-based window for FretCoach.

mod app;
pub mod components;
mod state;
mod theme;

pub use app::CoachApp;
pub use components::{LessonAction, LessonCard, LessonDetail, RecordButton, ScoreCard, Spectrum};
pub use state::{AppView, UiState};
pub use theme::Theme;
