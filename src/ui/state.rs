//! UI-local state
//!
//! View routing and per-frame scratch data that belongs to the window, not
//! to the shared application state: the spectrum window, the active exercise
//! selection, and transient banners.

/// Top-level views of the application
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppView {
    /// Usage overview and navigation
    #[default]
    Dashboard,
    /// Record, review, submit
    Studio,
    /// Exercise catalog and lesson details
    Exercises,
    /// Upgrade surface
    Premium,
}

impl AppView {
    pub fn title(&self) -> &'static str {
        match self {
            AppView::Dashboard => "Dashboard",
            AppView::Studio => "Studio",
            AppView::Exercises => "Exercises",
            AppView::Premium => "Premium",
        }
    }
}

/// State owned by the window
pub struct UiState {
    /// Current view
    pub view: AppView,
    /// Rolling sample window feeding the spectrum component
    pub spectrum_window: Vec<f32>,
    /// Exercise opened in the detail panel
    pub active_exercise: Option<String>,
    /// One-shot banner shown at the top of the current view
    pub banner: Option<String>,
    /// Show the re-authenticate prompt for video generation
    pub credential_prompt: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            view: AppView::Dashboard,
            spectrum_window: Vec::with_capacity(2048),
            active_exercise: None,
            banner: None,
            credential_prompt: false,
        }
    }

    /// Switch views, dropping any banner from the previous view
    pub fn navigate(&mut self, view: AppView) {
        if self.view != view {
            self.view = view;
            self.banner = None;
        }
    }

    pub fn show_banner(&mut self, text: impl Into<String>) {
        self.banner = Some(text.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_clears_the_banner() {
        let mut ui = UiState::new();
        ui.show_banner("saved");
        ui.navigate(AppView::Studio);
        assert_eq!(ui.view, AppView::Studio);
        assert!(ui.banner.is_none());
    }

    #[test]
    fn renavigating_to_the_same_view_keeps_the_banner() {
        let mut ui = UiState::new();
        ui.navigate(AppView::Premium);
        ui.show_banner("limit reached");
        ui.navigate(AppView::Premium);
        assert_eq!(ui.banner.as_deref(), Some("limit reached"));
    }
}
