use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, InputMode, ViewMode};
use crate::theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let style = theme::current().status;
        let w = area.width as usize;

        let mode_str = match app.view_mode {
            ViewMode::Month => "[1]Month",
            ViewMode::Day => "[2]Day",
        };
        let form = if app.input_mode == InputMode::Form { " [New Reminder]" } else { "" };
        let loading = if app.is_loading() { " ..." } else { "" };
        let left = format!(" {} | {}{}{} ", app.scope_label(), mode_str, form, loading);

        let right = match &app.status_message {
            Some(msg) => format!(" {} ", msg),
            None => hints(w).to_string(),
        };

        let padding = " ".repeat(w.saturating_sub(left.chars().count() + right.chars().count()));
        let line = Line::from(vec![
            Span::styled(left, style),
            Span::styled(padding, style),
            Span::styled(right, style),
        ]);
        frame.render_widget(Paragraph::new(line).style(style), area);
    }
}

fn hints(width: usize) -> &'static str {
    if width >= 90 {
        " hjkl:Nav [/]:Mon t:Today Sp:Toggle n:New p:Pet r:Reload ?:Help q:Quit"
    } else if width >= 60 {
        " jk:Select Sp:Toggle n:New p:Pet ?:Help q:Quit"
    } else {
        " ?:Help q:Quit"
    }
}
