//! Terminal colour themes.
//!
//! A neutral dark palette with blue accents, plus a light counterpart.

use crate::domain::ScoreBand;
use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone)]
pub struct ColorPalette {
    pub background: Color,
    pub surface: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub highlight: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Text,
    Title,
    Border,
    Highlight,
    Accent,
    Background,
    Inactive,
    Warning,
    Error,
    Success,
    /// Messages typed by the user
    UserMessage,
    /// Messages produced by the agent
    AgentMessage,
    /// Activity timeline entries
    Timeline,
}

#[derive(Debug, Clone)]
pub struct Theme {
    variant: ThemeVariant,
    colors: ColorPalette,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeVariant::default())
    }
}

impl Theme {
    pub fn new(variant: ThemeVariant) -> Self {
        let colors = match variant {
            ThemeVariant::Dark => ColorPalette {
                background: Color::Rgb(38, 38, 38),    // #262626
                surface: Color::Rgb(64, 64, 64),       // #404040
                foreground: Color::Rgb(245, 245, 245), // #f5f5f5
                muted: Color::Rgb(163, 163, 163),      // #a3a3a3
                accent: Color::Rgb(96, 165, 250),      // #60a5fa
                success: Color::Rgb(74, 222, 128),     // #4ade80
                warning: Color::Rgb(250, 204, 21),     // #facc15
                danger: Color::Rgb(248, 113, 113),     // #f87171
                highlight: Color::Rgb(82, 82, 82),     // #525252
            },
            ThemeVariant::Light => ColorPalette {
                background: Color::Rgb(250, 250, 250), // #fafafa
                surface: Color::Rgb(229, 229, 229),    // #e5e5e5
                foreground: Color::Rgb(38, 38, 38),    // #262626
                muted: Color::Rgb(115, 115, 115),      // #737373
                accent: Color::Rgb(37, 99, 235),       // #2563eb
                success: Color::Rgb(22, 163, 74),      // #16a34a
                warning: Color::Rgb(202, 138, 4),      // #ca8a04
                danger: Color::Rgb(220, 38, 38),       // #dc2626
                highlight: Color::Rgb(212, 212, 212),  // #d4d4d4
            },
        };

        Self { variant, colors }
    }

    pub fn variant(&self) -> ThemeVariant {
        self.variant
    }

    pub fn colors(&self) -> &ColorPalette {
        &self.colors
    }

    pub fn toggle(&mut self) {
        let next = match self.variant {
            ThemeVariant::Dark => ThemeVariant::Light,
            ThemeVariant::Light => ThemeVariant::Dark,
        };
        *self = Self::new(next);
    }

    pub fn ratatui_style(&self, element: Element) -> Style {
        let base = Style::default().bg(self.colors.background);
        match element {
            Element::Text | Element::Background => base.fg(self.colors.foreground),
            Element::Title => base.fg(self.colors.accent).add_modifier(Modifier::BOLD),
            Element::Border | Element::Inactive => base.fg(self.colors.muted),
            Element::Highlight => Style::default()
                .fg(self.colors.foreground)
                .bg(self.colors.highlight)
                .add_modifier(Modifier::BOLD),
            Element::Accent => base.fg(self.colors.accent).add_modifier(Modifier::BOLD),
            Element::Warning => base.fg(self.colors.warning),
            Element::Error => base.fg(self.colors.danger),
            Element::Success => base.fg(self.colors.success),
            Element::UserMessage => Style::default()
                .fg(self.colors.foreground)
                .bg(self.colors.surface),
            Element::AgentMessage => base.fg(self.colors.foreground),
            Element::Timeline => base.fg(self.colors.muted).add_modifier(Modifier::ITALIC),
        }
    }

    /// Colour for a 0-100 score, matching the card's bands.
    pub fn score_style(&self, score: Option<u8>) -> Style {
        let base = Style::default().bg(self.colors.background);
        match score.map(ScoreBand::from_score) {
            None => base.fg(self.colors.muted),
            Some(ScoreBand::Excellent) => base.fg(self.colors.success),
            Some(ScoreBand::Good) => base.fg(self.colors.accent),
            Some(ScoreBand::Fair) => base.fg(self.colors.warning),
            Some(ScoreBand::Poor) => base.fg(self.colors.danger),
        }
        .add_modifier(Modifier::BOLD)
    }

    pub fn text_style(&self) -> Style {
        self.ratatui_style(Element::Text)
    }

    pub fn highlight_style(&self) -> Style {
        self.ratatui_style(Element::Highlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_switches_palette() {
        let mut theme = Theme::default();
        assert_eq!(theme.variant(), ThemeVariant::Dark);
        theme.toggle();
        assert_eq!(theme.variant(), ThemeVariant::Light);
        assert_eq!(theme.colors().background, Color::Rgb(250, 250, 250));
        theme.toggle();
        assert_eq!(theme.variant(), ThemeVariant::Dark);
    }

    #[test]
    fn test_score_style_bands() {
        let theme = Theme::default();
        let colors = theme.colors().clone();
        assert_eq!(theme.score_style(Some(90)).fg, Some(colors.success));
        assert_eq!(theme.score_style(Some(65)).fg, Some(colors.accent));
        assert_eq!(theme.score_style(Some(45)).fg, Some(colors.warning));
        assert_eq!(theme.score_style(Some(10)).fg, Some(colors.danger));
        assert_eq!(theme.score_style(None).fg, Some(colors.muted));
    }
}
