//! Per-controller display configuration.

use serde::{Deserialize, Serialize};

/// Shortest allowed presentation duration in seconds.
pub const MIN_PRESENTATION_DURATION: f32 = 0.1;

/// Longest allowed presentation duration in seconds.
pub const MAX_PRESENTATION_DURATION: f32 = 1.0;

/// Presentation duration used when a template does not set one.
pub const DEFAULT_PRESENTATION_DURATION: f32 = 0.2;

/// Clamp a presentation duration into
/// [`MIN_PRESENTATION_DURATION`]..=[`MAX_PRESENTATION_DURATION`].
///
/// Non-finite input falls back to [`DEFAULT_PRESENTATION_DURATION`].
pub fn clamp_presentation_duration(seconds: f32) -> f32 {
    if !seconds.is_finite() {
        return DEFAULT_PRESENTATION_DURATION;
    }
    seconds.clamp(MIN_PRESENTATION_DURATION, MAX_PRESENTATION_DURATION)
}

/// How a controller is shown and hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    /// Linear opacity interpolation over the presentation duration.
    #[default]
    Fade,
    /// Instant show/hide.
    None,
}

/// Display configuration owned by a controller.
///
/// Frozen once the controller is shown; the window only hands out shared
/// references to it after that point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewControllerConfiguration {
    /// Unique identifier. May be empty.
    pub identifier: String,
    /// Title shown by navigation chrome.
    pub title: String,
    /// Transition used for show/hide.
    pub transition_type: TransitionType,
    /// Hide the navigation bar overlays while this controller is on top.
    pub hide_navigation_overlays: bool,
    /// Hide the navigation close button while this controller is on top.
    pub hide_navigation_close_button: bool,
    /// Hide the navigation title while this controller is on top.
    pub hide_navigation_title: bool,
}

impl ViewControllerConfiguration {
    /// Configuration with the given title and defaults elsewhere.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for the transition type.
    pub fn with_transition(mut self, transition_type: TransitionType) -> Self {
        self.transition_type = transition_type;
        self
    }

    /// Builder-style setter for the identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_clamped() {
        assert_eq!(clamp_presentation_duration(0.0), MIN_PRESENTATION_DURATION);
        assert_eq!(clamp_presentation_duration(5.0), MAX_PRESENTATION_DURATION);
        assert_eq!(clamp_presentation_duration(0.5), 0.5);
        assert_eq!(
            clamp_presentation_duration(f32::NAN),
            DEFAULT_PRESENTATION_DURATION
        );
    }

    #[test]
    fn defaults_fade_with_nothing_hidden() {
        let config = ViewControllerConfiguration::default();
        assert_eq!(config.transition_type, TransitionType::Fade);
        assert!(config.identifier.is_empty());
        assert!(!config.hide_navigation_overlays);
        assert!(!config.hide_navigation_close_button);
        assert!(!config.hide_navigation_title);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ViewControllerConfiguration =
            serde_json::from_str(r#"{"title":"Settings","transition_type":"none"}"#).unwrap();
        assert_eq!(config.title, "Settings");
        assert_eq!(config.transition_type, TransitionType::None);
        assert!(!config.hide_navigation_title);
    }
}
