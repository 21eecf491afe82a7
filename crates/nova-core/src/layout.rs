//! Anchored rectangle layout for controllers.

use serde::{Deserialize, Serialize};

/// A controller's rectangle relative to its parent, in normalized anchors
/// plus pixel offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectLayout {
    pub anchor_min: [f32; 2],
    pub anchor_max: [f32; 2],
    pub offset_min: [f32; 2],
    pub offset_max: [f32; 2],
    pub scale: [f32; 3],
    /// Rotation quaternion `[x, y, z, w]`.
    pub rotation: [f32; 4],
}

impl RectLayout {
    /// A layout pinned to every edge of the parent.
    pub const FILL: RectLayout = RectLayout {
        anchor_min: [0.0, 0.0],
        anchor_max: [1.0, 1.0],
        offset_min: [0.0, 0.0],
        offset_max: [0.0, 0.0],
        scale: [1.0, 1.0, 1.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
    };

    /// Reset to [`RectLayout::FILL`].
    pub fn reset_to_fill(&mut self) {
        *self = Self::FILL;
    }

    pub fn fills_parent(&self) -> bool {
        *self == Self::FILL
    }
}

impl Default for RectLayout {
    fn default() -> Self {
        Self::FILL
    }
}
