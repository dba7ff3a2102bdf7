//! Reusable UI components for the FretCoach window

pub mod lesson_card;
pub mod record_button;
pub mod score_card;
pub mod spectrum;

pub use lesson_card::{LessonAction, LessonCard, LessonDetail};
pub use record_button::RecordButton;
pub use score_card::ScoreCard;
pub use spectrum::Spectrum;
