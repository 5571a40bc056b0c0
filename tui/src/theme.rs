//! Color theme for the PSCode editor.
//!
//! Uses the Kanagawa Wave palette, with token styles chosen to read like a
//! conventional PowerShell editor: cyan cmdlets, gray parameters, orange
//! variables.

use ratatui::style::{Color, Modifier, Style};

use pscode_types::PsTokenKind;

/// Kanagawa Wave color palette constants.
mod colors {
    use super::Color;

    // === Backgrounds (Sumi Ink) ===
    pub const BG_DARK: Color = Color::Rgb(22, 22, 29); // sumiInk0
    pub const BG_PANEL: Color = Color::Rgb(31, 31, 40); // sumiInk3
    pub const BG_HIGHLIGHT: Color = Color::Rgb(42, 42, 55); // sumiInk4
    pub const BG_POPUP: Color = Color::Rgb(54, 54, 70); // sumiInk5
    pub const BG_BORDER: Color = Color::Rgb(84, 84, 109); // sumiInk6

    // === Foregrounds (Fuji) ===
    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 215, 186); // fujiWhite
    pub const TEXT_MUTED: Color = Color::Rgb(114, 113, 105); // fujiGray

    // === Accents ===
    pub const BLUE: Color = Color::Rgb(126, 156, 216); // crystalBlue
    pub const CYAN: Color = Color::Rgb(127, 180, 202); // springBlue
    pub const GREEN: Color = Color::Rgb(152, 187, 108); // springGreen
    pub const YELLOW: Color = Color::Rgb(230, 195, 132); // carpYellow
    pub const ORANGE: Color = Color::Rgb(255, 160, 102); // surimiOrange
    pub const RED: Color = Color::Rgb(255, 93, 98); // peachRed
    pub const VIOLET: Color = Color::Rgb(149, 127, 184); // oniViolet
}

/// Resolved theme palette used by the UI.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color,
    pub bg_panel: Color,
    pub bg_highlight: Color,
    pub bg_popup: Color,
    pub bg_border: Color,
    pub text_primary: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub error: Color,
}

impl Palette {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            bg_dark: colors::BG_DARK,
            bg_panel: colors::BG_PANEL,
            bg_highlight: colors::BG_HIGHLIGHT,
            bg_popup: colors::BG_POPUP,
            bg_border: colors::BG_BORDER,
            text_primary: colors::TEXT_PRIMARY,
            text_muted: colors::TEXT_MUTED,
            accent: colors::CYAN,
            error: colors::RED,
        }
    }

    /// Style for a syntax token.
    #[must_use]
    pub fn token_style(&self, kind: PsTokenKind) -> Style {
        let style = Style::default();
        match kind {
            PsTokenKind::Command => style.fg(colors::CYAN),
            PsTokenKind::Parameter => style.fg(colors::TEXT_MUTED),
            PsTokenKind::Variable => style.fg(colors::ORANGE),
            PsTokenKind::StringLiteral => style.fg(colors::GREEN),
            PsTokenKind::Number => style.fg(colors::YELLOW),
            PsTokenKind::Comment => style
                .fg(colors::TEXT_MUTED)
                .add_modifier(Modifier::ITALIC),
            PsTokenKind::Keyword => style.fg(colors::VIOLET),
            PsTokenKind::Operator => style.fg(colors::BLUE),
            PsTokenKind::Member => style.fg(colors::BLUE),
            PsTokenKind::Plain => style.fg(colors::TEXT_PRIMARY),
        }
    }

    /// Overlay applied on top of token styles where a parse-error marker
    /// covers the text.
    #[must_use]
    pub fn marker_style(&self) -> Style {
        Style::default()
            .fg(self.error)
            .add_modifier(Modifier::UNDERLINED)
    }

    #[must_use]
    pub fn gutter_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    #[must_use]
    pub fn popup_style(&self) -> Style {
        Style::default().fg(self.text_primary).bg(self.bg_popup)
    }

    #[must_use]
    pub fn popup_selected_style(&self) -> Style {
        Style::default()
            .fg(self.bg_dark)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn dialog_style(&self) -> Style {
        Style::default().fg(self.text_primary).bg(self.bg_panel)
    }

    #[must_use]
    pub fn dialog_title_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn status_style(&self) -> Style {
        Style::default().fg(self.text_muted).bg(self.bg_panel)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_style_underlines() {
        let palette = Palette::standard();
        assert!(
            palette
                .marker_style()
                .add_modifier
                .contains(Modifier::UNDERLINED)
        );
    }

    #[test]
    fn test_every_token_kind_has_a_style() {
        let palette = Palette::standard();
        for kind in [
            PsTokenKind::Command,
            PsTokenKind::Parameter,
            PsTokenKind::Variable,
            PsTokenKind::StringLiteral,
            PsTokenKind::Number,
            PsTokenKind::Comment,
            PsTokenKind::Keyword,
            PsTokenKind::Operator,
            PsTokenKind::Member,
            PsTokenKind::Plain,
        ] {
            assert!(palette.token_style(kind).fg.is_some());
        }
    }
}
