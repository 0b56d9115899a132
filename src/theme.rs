//! Theme - the style values handed to draw callbacks.
//!
//! A deliberately small semantic palette: draw callbacks receive the active
//! [`Style`] each frame and pick from it instead of hardcoding colors.

use crate::types::Rgba;

/// Semantic style values for the active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub background: Rgba,
    pub surface: Rgba,
    pub text: Rgba,
    pub text_dim: Rgba,
    /// Accent for the focused view.
    pub highlight: Rgba,
    pub border: Rgba,
}

impl Style {
    pub const fn dark() -> Self {
        Self {
            background: Rgba::rgb(16, 16, 24),
            surface: Rgba::rgb(30, 30, 42),
            text: Rgba::rgb(220, 220, 228),
            text_dim: Rgba::rgb(130, 130, 142),
            highlight: Rgba::rgb(122, 162, 247),
            border: Rgba::rgb(70, 70, 86),
        }
    }

    pub const fn light() -> Self {
        Self {
            background: Rgba::rgb(245, 245, 240),
            surface: Rgba::rgb(228, 228, 222),
            text: Rgba::rgb(40, 40, 46),
            text_dim: Rgba::rgb(120, 120, 126),
            highlight: Rgba::rgb(46, 89, 168),
            border: Rgba::rgb(170, 170, 164),
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::dark()
    }
}
