use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

use crate::api::Priority;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the theme described by the config. Only the first call has effect.
pub fn init(config: &ThemeConfig) {
    let _ = THEME.set(config.clone().into_theme());
}

/// Get the active theme, falling back to the default preset.
pub fn current() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub today: Style,
    pub selected: Style,
    pub header: Style,
    pub dim: Style,
    pub border: Style,
    pub status: Style,
    pub error: Style,
    pub accent: Color,
    pub high: Color,
    pub medium: Color,
    pub low: Color,
}

/// The handful of colors a preset is derived from.
struct Palette {
    fg: Color,
    accent: Color,
    today: Color,
    dim: Color,
    border: Color,
    bar: Color,
    high: Color,
    medium: Color,
    low: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_palette(
            "default",
            Palette {
                fg: Color::White,
                accent: Color::Cyan,
                today: Color::Yellow,
                dim: Color::DarkGray,
                border: Color::Gray,
                bar: Color::DarkGray,
                high: Color::Red,
                medium: Color::Yellow,
                low: Color::Green,
            },
        )
    }
}

impl Theme {
    fn from_palette(name: &str, p: Palette) -> Self {
        Self {
            name: name.to_string(),
            today: Style::default().fg(Color::Black).bg(p.today),
            selected: Style::default().fg(Color::Black).bg(p.accent),
            header: Style::default().fg(p.fg).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(p.dim),
            border: Style::default().fg(p.border),
            status: Style::default().fg(p.fg).bg(p.bar),
            error: Style::default().fg(p.high).add_modifier(Modifier::BOLD),
            accent: p.accent,
            high: p.high,
            medium: p.medium,
            low: p.low,
        }
    }

    /// Built-in presets by name; unknown names give the default.
    pub fn preset(name: &str) -> Self {
        match name {
            "dracula" => Self::from_palette(
                "dracula",
                Palette {
                    fg: Color::Rgb(248, 248, 242),
                    accent: Color::Rgb(139, 233, 253),
                    today: Color::Rgb(189, 147, 249),
                    dim: Color::Rgb(98, 114, 164),
                    border: Color::Rgb(68, 71, 90),
                    bar: Color::Rgb(68, 71, 90),
                    high: Color::Rgb(255, 85, 85),
                    medium: Color::Rgb(241, 250, 140),
                    low: Color::Rgb(80, 250, 123),
                },
            ),
            "gruvbox" => Self::from_palette(
                "gruvbox",
                Palette {
                    fg: Color::Rgb(235, 219, 178),
                    accent: Color::Rgb(131, 165, 152),
                    today: Color::Rgb(250, 189, 47),
                    dim: Color::Rgb(146, 131, 116),
                    border: Color::Rgb(102, 92, 84),
                    bar: Color::Rgb(80, 73, 69),
                    high: Color::Rgb(251, 73, 52),
                    medium: Color::Rgb(254, 128, 25),
                    low: Color::Rgb(184, 187, 38),
                },
            ),
            "nord" => Self::from_palette(
                "nord",
                Palette {
                    fg: Color::Rgb(229, 233, 240),
                    accent: Color::Rgb(136, 192, 208),
                    today: Color::Rgb(235, 203, 139),
                    dim: Color::Rgb(76, 86, 106),
                    border: Color::Rgb(67, 76, 94),
                    bar: Color::Rgb(67, 76, 94),
                    high: Color::Rgb(191, 97, 106),
                    medium: Color::Rgb(208, 135, 112),
                    low: Color::Rgb(163, 190, 140),
                },
            ),
            _ => Self::default(),
        }
    }

    pub fn priority(&self, priority: Priority) -> Color {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

/// `[theme]` table of config.toml.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub preset: Option<String>,
    pub today_bg: Option<String>,
    pub selected_bg: Option<String>,
    pub header_fg: Option<String>,
    pub dim_fg: Option<String>,
    pub border_fg: Option<String>,
    pub status_fg: Option<String>,
    pub status_bg: Option<String>,
    pub high: Option<String>,
    pub medium: Option<String>,
    pub low: Option<String>,
}

impl ThemeConfig {
    pub fn into_theme(self) -> Theme {
        let mut theme = self
            .preset
            .as_deref()
            .map(Theme::preset)
            .unwrap_or_default();

        let color = |v: &Option<String>| v.as_deref().and_then(parse_color);
        if let Some(c) = color(&self.today_bg) {
            theme.today = theme.today.bg(c);
        }
        if let Some(c) = color(&self.selected_bg) {
            theme.selected = theme.selected.bg(c);
            theme.accent = c;
        }
        if let Some(c) = color(&self.header_fg) {
            theme.header = theme.header.fg(c);
        }
        if let Some(c) = color(&self.dim_fg) {
            theme.dim = theme.dim.fg(c);
        }
        if let Some(c) = color(&self.border_fg) {
            theme.border = theme.border.fg(c);
        }
        if let Some(c) = color(&self.status_fg) {
            theme.status = theme.status.fg(c);
        }
        if let Some(c) = color(&self.status_bg) {
            theme.status = theme.status.bg(c);
        }
        if let Some(c) = color(&self.high) {
            theme.high = c;
            theme.error = theme.error.fg(c);
        }
        if let Some(c) = color(&self.medium) {
            theme.medium = c;
        }
        if let Some(c) = color(&self.low) {
            theme.low = c;
        }
        theme
    }
}

/// Parse "#rrggbb" or a basic color name.
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#').filter(|h| h.len() == 6) {
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }
    let named = match s.to_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        _ => return None,
    };
    Some(named)
}
