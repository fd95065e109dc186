use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("h/l \u{2190}/\u{2192}", "Previous/next day"),
            ("j/k \u{2191}/\u{2193}", "Select reminder"),
            ("[/]", "Previous/next month"),
            ("t", "Jump to today"),
            ("1/2", "Month / Day view"),
        ],
    ),
    (
        "Reminders",
        &[
            ("Space", "Toggle completion"),
            ("Enter", "Show details"),
            ("n", "New reminder"),
            ("p", "Cycle pet"),
            ("r", "Reload"),
        ],
    ),
    ("", &[("q", "Quit"), ("Esc", "Close popup")]),
];

pub fn render_help(frame: &mut Frame, area: Rect) {
    let t = theme::current();
    let popup_w = area.width.clamp(30, 48);
    let popup_h = area.height.clamp(12, 20);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h).intersection(area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(Style::default().fg(t.accent).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(t.accent));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::default().fg(t.accent).add_modifier(Modifier::BOLD);
    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let mut lines = Vec::new();
    for (i, (title, keys)) in SECTIONS.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        if !title.is_empty() {
            lines.push(Line::from(Span::styled(*title, section_style)));
        }
        for (key, desc) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<10}", key), key_style),
                Span::raw(*desc),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
