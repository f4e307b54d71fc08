//! Theme color definitions for the UI
//!
//! Dark and light palettes, picked from the configured [`Theme`].

use crate::config::Theme;
use ratatui::style::Color;

/// Color palette for the control panel
#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    /// Main background
    pub bg: Color,
    /// Primary foreground text
    pub fg: Color,
    /// Dimmed/secondary text and borders
    pub dim: Color,
    /// Accent color (headings, info rows)
    pub cyan: Color,
    /// Active / OK status
    pub green: Color,
    /// Attention status
    pub yellow: Color,
    /// Failed status
    pub red: Color,
    /// Filled part of the threshold gauge
    pub gauge: Color,
}

impl ThemeColors {
    /// Create a color palette for the given theme variant
    pub fn from_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(22, 22, 30),
            fg: Color::Rgb(200, 200, 210),
            dim: Color::Rgb(90, 90, 110),
            cyan: Color::Rgb(80, 200, 220),
            green: Color::Rgb(80, 200, 120),
            yellow: Color::Rgb(240, 180, 80),
            red: Color::Rgb(240, 90, 100),
            gauge: Color::Rgb(80, 160, 220),
        }
    }

    /// High contrast for bright terminals
    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(245, 245, 248),
            fg: Color::Rgb(30, 30, 40),
            dim: Color::Rgb(130, 130, 150),
            cyan: Color::Rgb(0, 130, 160),
            green: Color::Rgb(30, 150, 70),
            yellow: Color::Rgb(180, 120, 0),
            red: Color::Rgb(200, 50, 60),
            gauge: Color::Rgb(30, 100, 180),
        }
    }
}
