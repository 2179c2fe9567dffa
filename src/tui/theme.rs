//! TUI theming support.
//!
//! [`Theme`] holds the color palette for every view. Light and dark
//! palettes are provided, plus detection from the terminal environment.

use ratatui::style::Color;

use crate::cli::ThemeArg;

/// A collection of colors used for TUI components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub danger: Color,
    pub success: Color,
    /// Ringing screen background while the flicker is "on".
    pub alert: Color,
    pub dim: Color,
    pub normal: Color,
    pub inverted_fg: Color,
}

impl Theme {
    /// Create a high-contrast dark theme (default).
    ///
    /// Palette:
    /// - Primary: Cyan (headers, borders, the clock)
    /// - Secondary: Yellow (selection, solved counter)
    /// - Danger: Red (errors, rejection overlay)
    /// - Success: Green (active alarms, success overlay)
    /// - Alert: LightRed (ringing flicker)
    /// - Dim: DarkGray (secondary text, inactive alarms)
    /// - Normal: White (main text)
    /// - Inverted FG: Black (text on colored background)
    #[must_use]
    pub fn dark() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Yellow,
            danger: Color::Red,
            success: Color::Green,
            alert: Color::LightRed,
            dim: Color::DarkGray,
            normal: Color::White,
            inverted_fg: Color::Black,
        }
    }

    /// Create a high-contrast light theme.
    #[must_use]
    pub fn light() -> Self {
        Self {
            primary: Color::Blue,
            secondary: Color::Magenta,
            danger: Color::Red,
            success: Color::Green,
            alert: Color::Red,
            dim: Color::Gray,
            normal: Color::Black,
            inverted_fg: Color::White,
        }
    }

    /// Detect terminal theme or return dark theme as default.
    #[must_use]
    pub fn auto() -> Self {
        if is_light_terminal() {
            Self::light()
        } else {
            Self::dark()
        }
    }

    #[must_use]
    pub fn from_arg(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Auto => Self::auto(),
            ThemeArg::Dark => Self::dark(),
            ThemeArg::Light => Self::light(),
        }
    }

    /// Check if this is a light theme.
    #[must_use]
    pub fn is_light(&self) -> bool {
        self.normal == Color::Black
    }
}

/// Guess whether the terminal background is light.
///
/// Only `COLORFGBG` is consulted (set by rxvt, xterm, konsole).
fn is_light_terminal() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| value.rsplit(';').next().and_then(|bg| bg.parse::<u32>().ok()))
        // 0=black, 7=gray, 8=dark gray, 15=white
        .is_some_and(|bg| bg >= 7 && bg != 8)
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
