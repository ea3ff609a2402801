//! Theme definitions for mindfulme
//!
//! Provides three built-in themes: Gruvbox, Nord, and Transparent.
//! Each theme defines colors for all UI elements.

use crate::config::ThemeName;
use ratatui::style::{Color, Modifier, Style};

/// Complete theme with all required colors
#[derive(Debug, Clone)]
pub struct Theme {
    // Base colors
    pub bg: Color,
    pub fg: Color,
    pub fg_dim: Color,

    pub accent: Color,

    // Status colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,

    // UI element colors
    pub border: Color,
    pub border_focused: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,

    // Transcript colors
    pub user_message: Color,
    pub bot_message: Color,
}

impl Theme {
    /// Create a theme from a theme name
    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Gruvbox => Self::gruvbox(),
            ThemeName::Nord => Self::nord(),
            ThemeName::Transparent => Self::transparent(),
        }
    }

    /// Gruvbox dark theme (default)
    pub fn gruvbox() -> Self {
        Self {
            bg: Color::Rgb(40, 40, 40),           // #282828
            fg: Color::Rgb(235, 219, 178),        // #ebdbb2
            fg_dim: Color::Rgb(146, 131, 116),    // #928374

            accent: Color::Rgb(254, 128, 25),     // #fe8019

            success: Color::Rgb(184, 187, 38),    // #b8bb26
            warning: Color::Rgb(250, 189, 47),    // #fabd2f
            error: Color::Rgb(251, 73, 52),       // #fb4934

            border: Color::Rgb(80, 73, 69),       // #504945
            border_focused: Color::Rgb(168, 153, 132), // #a89984
            selection_bg: Color::Rgb(80, 73, 69), // #504945
            selection_fg: Color::Rgb(235, 219, 178), // #ebdbb2

            user_message: Color::Rgb(131, 165, 152), // #83a598 (blue)
            bot_message: Color::Rgb(142, 192, 124),  // #8ec07c (aqua)
        }
    }

    /// Nord theme
    pub fn nord() -> Self {
        Self {
            // Polar Night
            bg: Color::Rgb(46, 52, 64),           // #2e3440
            fg: Color::Rgb(236, 239, 244),        // #eceff4
            fg_dim: Color::Rgb(76, 86, 106),      // #4c566a

            // Frost
            accent: Color::Rgb(136, 192, 208),    // #88c0d0

            // Aurora
            success: Color::Rgb(163, 190, 140),   // #a3be8c
            warning: Color::Rgb(235, 203, 139),   // #ebcb8b
            error: Color::Rgb(191, 97, 106),      // #bf616a

            border: Color::Rgb(59, 66, 82),       // #3b4252
            border_focused: Color::Rgb(136, 192, 208), // #88c0d0
            selection_bg: Color::Rgb(76, 86, 106),    // #4c566a
            selection_fg: Color::Rgb(236, 239, 244),  // #eceff4

            user_message: Color::Rgb(129, 161, 193), // #81a1c1
            bot_message: Color::Rgb(163, 190, 140),  // #a3be8c
        }
    }

    /// Transparent theme (uses terminal colors)
    pub fn transparent() -> Self {
        Self {
            bg: Color::Reset,
            fg: Color::Reset,
            fg_dim: Color::DarkGray,

            accent: Color::Cyan,

            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,

            border: Color::DarkGray,
            border_focused: Color::Cyan,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,

            user_message: Color::Blue,
            bot_message: Color::Green,
        }
    }

    // Style helpers for common UI patterns

    /// Block background
    pub fn block_style(&self) -> Style {
        Style::default().bg(self.bg)
    }

    /// Default text style
    pub fn text(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Dimmed text style
    pub fn text_dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    /// Title/header style
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected item style
    pub fn selected(&self) -> Style {
        Style::default()
            .fg(self.selection_fg)
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Border style (unfocused)
    pub fn border(&self) -> Style {
        Style::default().fg(self.border).bg(self.bg)
    }

    /// Border style (focused)
    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.border_focused).bg(self.bg)
    }

    /// Tab style (inactive)
    pub fn tab_inactive(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    /// Tab style (active)
    pub fn tab_active(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Success message style
    pub fn success(&self) -> Style {
        Style::default().fg(self.success).bg(self.bg)
    }

    /// Warning message style
    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning).bg(self.bg)
    }

    /// Error message style
    pub fn error(&self) -> Style {
        Style::default().fg(self.error).bg(self.bg)
    }

    /// Entry date in the journal list
    pub fn entry_date(&self) -> Style {
        Style::default()
            .fg(self.fg)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Sender label of a user message
    pub fn user_message(&self) -> Style {
        Style::default()
            .fg(self.user_message)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Sender label of a bot message
    pub fn bot_message(&self) -> Style {
        Style::default()
            .fg(self.bot_message)
            .bg(self.bg)
            .add_modifier(Modifier::BOLD)
    }
}
